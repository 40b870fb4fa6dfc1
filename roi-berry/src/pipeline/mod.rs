//! 按病例循环的阶段流水线.
//!
//! 每一轮 (pass) 处理一个病例: [`StageRunner`] 依次调用各阶段的
//! [`Stage::process`], 各阶段通过 [`ArtifactStore`] 交换产物.
//! 第一个阶段 (通常为数据源) 返回 `false` 表示病例已全部处理完毕;
//! 其余阶段返回 `false` 只会中止当前这一轮.
//!
//! 每个阶段在 `process` 开始时都必须清除自己的输出, 以免读到上一个病例的残留.

use std::collections::BTreeMap;

use crate::data::CaseRecord;
use crate::grid::{BoxList, LabelGrid};

mod runner;
mod source;
mod stages;
mod timer;

pub use runner::{PassOutcome, RunSummary, StageRunner};
pub use source::{MemorySource, NiftiSource};
pub use stages::{BoundingBoxStage, ExpandStage, LabelStage, SaveRoiStage};

/// 最小包围盒在 [`ArtifactStore::boxes`] 中的默认键.
pub const MINIMAL_BOXES: &str = "minimal";

/// 流水线中的一个处理阶段.
pub trait Stage {
    /// 阶段名称, 用于日志.
    fn name(&self) -> &str;

    /// 处理当前病例. 返回 `false` 表示中止本轮.
    fn process(&mut self, store: &mut ArtifactStore) -> bool;
}

/// 各阶段共享的产物仓库.
///
/// 键与值类型是封闭的: 病例, 标记网格, 以及若干具名的包围盒列表.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    /// 当前病例. 由数据源阶段写入.
    pub case: Option<CaseRecord>,

    /// 当前病例的连通区域标记结果.
    pub labeled: Option<LabelGrid>,

    /// 具名包围盒列表, 下标即标签, `0` 号为占位.
    pub boxes: BTreeMap<String, BoxList>,
}

impl ArtifactStore {
    /// 空仓库.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 清空所有产物.
    pub fn clear(&mut self) {
        self.case = None;
        self.labeled = None;
        self.boxes.clear();
    }

    /// 名为 `key` 的包围盒列表.
    #[inline]
    pub fn boxes_of(&self, key: &str) -> Option<&BoxList> {
        self.boxes.get(key)
    }
}
