use rand::Rng;

use super::ExpansionPolicy;
use crate::grid::{BoundingBox, BoxList, LabelGrid};
use crate::Label;

/// 扩展驱动器: 把单个区域交给当前策略扩展, 自身不保存任何扩展状态.
#[derive(Clone, Debug)]
pub struct ExpansionEngine {
    policy: ExpansionPolicy,
}

impl From<ExpansionPolicy> for ExpansionEngine {
    #[inline]
    fn from(policy: ExpansionPolicy) -> Self {
        Self::new(policy)
    }
}

impl ExpansionEngine {
    /// 以 `policy` 构建驱动器.
    #[inline]
    pub fn new(policy: ExpansionPolicy) -> Self {
        Self { policy }
    }

    /// 当前策略.
    #[inline]
    pub fn policy(&self) -> &ExpansionPolicy {
        &self.policy
    }

    /// 扩展标签 `label` 的最小包围盒 `minimal`.
    ///
    /// `label` 为背景或超出 `grid` 的区域个数时 panic.
    pub fn expand_region<R: Rng + ?Sized>(
        &self,
        grid: &LabelGrid,
        minimal: BoundingBox,
        label: Label,
        rng: &mut R,
    ) -> BoundingBox {
        assert!(
            label <= grid.components(),
            "标签 {label} 超出区域个数 {}",
            grid.components()
        );
        self.policy.expand(grid, minimal, label, rng)
    }

    /// 依次扩展 `boxes` 中的每个区域. `boxes` 下标即标签, `0` 号为占位.
    ///
    /// 结果与输入下标对齐; 输入为 `None` 的位置保持 `None`.
    /// `boxes` 的长度必须为区域个数加一, 否则 panic.
    pub fn expand_all<R: Rng + ?Sized>(
        &self,
        grid: &LabelGrid,
        boxes: &[Option<BoundingBox>],
        rng: &mut R,
    ) -> BoxList {
        check_len(grid, boxes);
        boxes
            .iter()
            .enumerate()
            .map(|(label, b)| b.map(|b| self.expand_region(grid, b, label as Label, rng)))
            .collect()
    }
}

fn check_len(grid: &LabelGrid, boxes: &[Option<BoundingBox>]) {
    assert_eq!(
        boxes.len(),
        grid.components() as usize + 1,
        "包围盒个数与区域个数不一致"
    );
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
    }
}

/// 每个区域独立的随机种子.
#[cfg(feature = "rayon")]
#[inline]
fn region_seed(seed: u64, label: Label) -> u64 {
    seed ^ u64::from(label).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// 借助 `rayon`, 并行地扩展 `boxes` 中的所有区域.
///
/// 每个区域使用由 `seed` 与标签共同决定的独立随机数发生器,
/// 因此结果与线程调度无关. 其余约定同 [`ExpansionEngine::expand_all`].
#[cfg(feature = "rayon")]
pub fn par_expand_all(
    engine: &ExpansionEngine,
    grid: &LabelGrid,
    boxes: &[Option<BoundingBox>],
    seed: u64,
) -> BoxList {
    check_len(grid, boxes);
    boxes
        .par_iter()
        .enumerate()
        .map(|(label, b)| {
            b.map(|b| {
                let label = label as Label;
                let mut rng = StdRng::seed_from_u64(region_seed(seed, label));
                engine.expand_region(grid, b, label, &mut rng)
            })
        })
        .collect()
}
