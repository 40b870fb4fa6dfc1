use ndarray::ArrayView3;

use crate::consts::BACKGROUND;
use crate::Label;

/// 探测区域内各标签的体素计数, 下标为标签值 (含背景 `0`).
///
/// 每次探测都重新计算, 用完即弃.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegionCounts {
    counts: Vec<usize>,
}

impl RegionCounts {
    /// 统计 `sub` 中值为 `0..=num_labels` 的体素个数.
    ///
    /// 若 `sub` 中存在大于 `num_labels` 的值, 说明 `num_labels`
    /// 与网格不一致, 程序 panic.
    pub fn count(sub: ArrayView3<'_, Label>, num_labels: Label) -> Self {
        let mut counts = vec![0usize; num_labels as usize + 1];
        for &v in sub.iter() {
            assert!(v <= num_labels, "体素标签 {v} 超出区域个数 {num_labels}");
            counts[v as usize] += 1;
        }
        Self { counts }
    }

    /// 标签 `label` 的体素个数.
    #[inline]
    pub fn get(&self, label: Label) -> usize {
        self.counts[label as usize]
    }

    /// 探测区域体素总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// 底层计数数组.
    #[inline]
    pub fn as_slice(&self) -> &[usize] {
        &self.counts
    }

    /// 探测区域内所有前景体素是否都属于 `target`, 即没有碰到其他区域.
    ///
    /// `target` 为背景时 panic.
    pub fn is_pure(&self, target: Label) -> bool {
        assert_ne!(target, BACKGROUND, "不能以背景作为纯度检查的目标标签");
        let foreground: usize = self.counts[1..].iter().sum();
        self.get(target) == foreground
    }

    /// `(背景百分比, 目标百分比)`, 取值范围 `[0, 100]`.
    ///
    /// 探测区域为空时 panic.
    pub fn percentages(&self, target: Label) -> (f64, f64) {
        let total = self.total();
        assert_ne!(total, 0, "探测区域为空, 无法计算百分比");
        let total = total as f64;
        (
            self.get(BACKGROUND) as f64 * 100.0 / total,
            self.get(target) as f64 * 100.0 / total,
        )
    }
}
