//! 流水线配置. 以 TOML 格式保存.
//!
//! ```toml
//! src_image_path = "/data/lidc/image"
//! src_mask_path = "/data/lidc/mask"
//! dst_image_path = "/data/roi/image"
//! dst_mask_path = "/data/roi/mask"
//! labeling_se_dim = [3, 3, 3]
//! seed = 2023
//!
//! [[expansion]]
//! strategy = "uniform"
//! step = 1
//! limit = [25, 35]
//!
//! [[expansion]]
//! strategy = "physician-delta"
//! expand_x = [2, 2]
//! expand_y = [2, 2]
//! expand_z = [1, 1]
//! delta_x = [5, 5]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use roi_berry::consts::{DEFAULT_SE_DIM, MASK_SUFFIX};
use roi_berry::expand::{
    Amount, AnyDirection, BackgroundPercentage, ExpansionPolicy, PhysicianDelta, Uniform,
};
use roi_berry::{RoiError, RoiResult, StructuringElement};
use serde::Deserialize;
use thiserror::Error;

/// 加载配置时可能出现的错误.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件无法读取.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// 配置文件路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// TOML 语法或字段错误.
    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),

    /// 参数不合法, 例如非法随机区间.
    #[error("invalid parameter: {0}")]
    Invalid(#[from] RoiError),

    /// 未指定配置文件, 且无法定位家目录.
    #[error("no config file given and home directory is unknown")]
    NotFound,
}

#[inline]
fn default_mask_suffix() -> String {
    MASK_SUFFIX.to_owned()
}

#[inline]
fn default_se_dim() -> [usize; 3] {
    DEFAULT_SE_DIM
}

#[inline]
fn yes() -> bool {
    true
}

#[inline]
fn one() -> usize {
    1
}

/// 流水线配置.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// CT 扫描所在目录.
    pub src_image_path: PathBuf,

    /// 掩码所在目录.
    pub src_mask_path: PathBuf,

    /// ROI 扫描输出目录.
    pub dst_image_path: PathBuf,

    /// ROI 掩码输出目录.
    pub dst_mask_path: PathBuf,

    /// 掩码文件名后缀.
    #[serde(default = "default_mask_suffix")]
    pub mask_suffix: String,

    /// 连通区域标记使用的结构元尺寸.
    #[serde(default = "default_se_dim")]
    pub labeling_se_dim: [usize; 3],

    /// 随机种子. 不给出时每次运行结果不同.
    #[serde(default)]
    pub seed: Option<u64>,

    /// 是否记录每个阶段的耗时.
    #[serde(default = "yes")]
    pub show_stage_time: bool,

    /// 依次串联的扩展阶段. 每个阶段以上一个阶段的输出为输入.
    #[serde(default)]
    pub expansion: Vec<ExpansionConfig>,
}

/// 单个扩展阶段的参数, 由 `strategy` 字段区分.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum ExpansionConfig {
    /// 同步扩展.
    Uniform {
        /// 每轮步长.
        step: Amount,
        /// 累计增长上限.
        limit: Amount,
    },

    /// 独立扩展.
    AnyDirection {
        /// 每轮步长.
        step: Amount,
        /// 累计增长上限.
        limit: Amount,
    },

    /// 背景百分比扩展.
    BackgroundPercentage {
        /// 目标背景百分比.
        target: f64,
        /// 步长, 必须为固定值.
        step: Amount,
        /// 是否在每个方向之后检查目标.
        #[serde(default = "yes")]
        enforce: bool,
    },

    /// 医生指定增量扩展. 各数组为 `[负方向, 正方向]`.
    PhysicianDelta {
        /// x 轴目标体素数.
        expand_x: [usize; 2],
        /// y 轴目标体素数.
        expand_y: [usize; 2],
        /// z 轴目标体素数.
        expand_z: [usize; 2],
        /// x 轴步长.
        #[serde(default = "one")]
        growth_x: usize,
        /// y 轴步长.
        #[serde(default = "one")]
        growth_y: usize,
        /// z 轴步长.
        #[serde(default = "one")]
        growth_z: usize,
        /// x 轴扰动幅度.
        #[serde(default)]
        delta_x: Option<[usize; 2]>,
        /// y 轴扰动幅度.
        #[serde(default)]
        delta_y: Option<[usize; 2]>,
        /// z 轴扰动幅度.
        #[serde(default)]
        delta_z: Option<[usize; 2]>,
    },
}

impl ExpansionConfig {
    /// 策略名称, 同时用作该阶段输出的键.
    pub fn strategy(&self) -> &'static str {
        match self {
            ExpansionConfig::Uniform { .. } => "uniform",
            ExpansionConfig::AnyDirection { .. } => "any-direction",
            ExpansionConfig::BackgroundPercentage { .. } => "background-percentage",
            ExpansionConfig::PhysicianDelta { .. } => "physician-delta",
        }
    }

    /// 构建扩展策略. 参数不合法时返回 `Err`.
    pub fn build(&self) -> RoiResult<ExpansionPolicy> {
        let policy: ExpansionPolicy = match *self {
            ExpansionConfig::Uniform { step, limit } => Uniform::new(step, limit)?.into(),
            ExpansionConfig::AnyDirection { step, limit } => AnyDirection::new(step, limit)?.into(),
            ExpansionConfig::BackgroundPercentage {
                target,
                step,
                enforce,
            } => BackgroundPercentage::new(target, step, enforce)?.into(),
            ExpansionConfig::PhysicianDelta {
                expand_x,
                expand_y,
                expand_z,
                growth_x,
                growth_y,
                growth_z,
                delta_x,
                delta_y,
                delta_z,
            } => PhysicianDelta::new(
                [expand_x, expand_y, expand_z],
                [growth_x, growth_y, growth_z],
                [delta_x, delta_y, delta_z],
            )?
            .into(),
        };
        Ok(policy)
    }
}

impl PipelineConfig {
    /// 解析 TOML 文本, 并检查所有参数.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.structuring_element()?;
        config.policies()?;
        Ok(config)
    }

    /// 读取并解析配置文件.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 连通区域标记使用的结构元.
    #[inline]
    pub fn structuring_element(&self) -> RoiResult<StructuringElement> {
        StructuringElement::new(self.labeling_se_dim)
    }

    /// 按顺序构建所有扩展策略.
    pub fn policies(&self) -> RoiResult<Vec<ExpansionPolicy>> {
        self.expansion.iter().map(ExpansionConfig::build).collect()
    }

    /// 第 `i` 个扩展阶段的输出键, 形如 `2-uniform`.
    pub fn expansion_key(&self, i: usize) -> String {
        format!("{}-{}", i + 1, self.expansion[i].strategy())
    }
}
