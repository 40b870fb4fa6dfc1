#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 从 3D CT 结节分割标注中, 为每个连通区域提取最小包围盒,
//! 并按可配置的策略扩展包围盒, 以便后续裁剪 ROI 并计算影像组学特征.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有 3D 数据均按照 nifti 体素顺序 `(i, j, k)` 保存, 不做轴置换.
//!   包围盒的 `x`, `y`, `z` 分别对应数组的第 0, 1, 2 维.
//! 2. 在非期望情况下 (编程错误, 例如探测空区域或以背景作为目标标签),
//!   程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//! 3. 配置错误 (例如非法随机区间) 在构造策略时即返回 `Err`, 不会拖延到运行时.
//!
//! # 模块概览
//!
//! ### 标签网格与包围盒 ✅
//!
//! [`LabelGrid`] 保存连通区域标记结果, [`BoundingBox`] 是闭区间包围盒.
//! 最小包围盒通过逐轴投影求得.
//!
//! 实现位于 `roi-berry/src/grid`.
//!
//! ### 连通区域标记 ✅
//!
//! 以给定结构元 (`dx * dy * dz` 全 1 邻域) 对掩码做 BFS 标记.
//!
//! 实现位于 `roi-berry/src/grid/label.rs`.
//!
//! ### 包围盒扩展引擎 ✅
//!
//! 六方向增长原语 + 四种扩展策略: 均匀扩展, 任意方向扩展,
//! 背景百分比扩展, 医生指定增量扩展.
//!
//! 实现位于 `roi-berry/src/expand`.
//!
//! ### 流水线 ✅
//!
//! 按病例循环执行的阶段序列, 各阶段共享一个类型化的产物仓库.
//!
//! 实现位于 `roi-berry/src/pipeline`.
//!
//! ### nifti 读写与裁剪 ✅
//!
//! 实现位于 `roi-berry/src/data`.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 连通区域标签. `0` 为背景, `1..=N` 为各连通区域.
pub type Label = u32;

pub mod consts;

mod data;
mod error;

pub use data::{paired_image_name, CaseRecord, CtMask, CtVolume, NiftiHeaderAttr};
pub use error::{RoiError, RoiResult};

pub mod expand;
pub mod grid;
pub mod pipeline;
pub mod prelude;

pub use grid::{label_components, Axis, BoundingBox, Direction, LabelGrid, StructuringElement};
