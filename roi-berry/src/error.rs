//! 错误类型.

use thiserror::Error;

/// 配置错误和 I/O 错误.
///
/// 编程错误 (例如以背景标签探测纯度) 不在此列, 它们会直接 panic.
#[derive(Debug, Error)]
pub enum RoiError {
    /// 随机区间非法: 要求 `0 < low < high`.
    #[error("invalid range [{low}, {high}]: expected 0 < low < high")]
    InvalidRange {
        /// 区间下界.
        low: usize,
        /// 区间上界.
        high: usize,
    },

    /// 参数必须为正数. 参数为参数名.
    #[error("`{0}` must be positive")]
    NonPositive(&'static str),

    /// 该策略要求固定步长, 但给出了随机区间.
    #[error("a fixed integer step is required, got a range")]
    FixedStepRequired,

    /// 百分比不在 `[0, 100]` 内.
    #[error("percentage {0} is out of [0, 100]")]
    InvalidPercentage(f64),

    /// 结构元尺寸必须为正奇数.
    #[error("invalid structuring element {0:?}: every dimension must be positive and odd")]
    InvalidStructuringElement([usize; 3]),

    /// 扫描与掩码形状不一致.
    #[error("shape mismatch: image {image:?} vs mask {mask:?}")]
    ShapeMismatch {
        /// 扫描形状.
        image: [usize; 3],
        /// 掩码形状.
        mask: [usize; 3],
    },

    /// nifti 读写错误.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 数组维度错误, 例如读到的不是 3D 数据.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// 其他底层 I/O 错误.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 本 crate 的 `Result`.
pub type RoiResult<T> = Result<T, RoiError>;
