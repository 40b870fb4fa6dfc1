//! 扩展策略.
//!
//! 所有策略都以最小包围盒为起点, 只会扩大包围盒, 且不会越出网格.
//! 参数合法性在构造时检查, `expand` 本身不会返回错误.

use rand::Rng;

use crate::grid::{BoundingBox, LabelGrid};
use crate::Label;

mod background;
mod physician;
mod rounds;

pub use background::BackgroundPercentage;
pub use physician::PhysicianDelta;
pub use rounds::{AnyDirection, Uniform};

/// 封闭的扩展策略集合.
#[derive(Clone, Debug)]
pub enum ExpansionPolicy {
    /// 六个方向同步扩展, 任一方向受阻即回退到上一次全部成功的状态.
    Uniform(Uniform),

    /// 各方向独立扩展, 已提交的增长不回退.
    AnyDirection(AnyDirection),

    /// 逐方向扩展, 直到背景百分比达到目标.
    BackgroundPercentage(BackgroundPercentage),

    /// 按医生给定的每方向体素数 (可带随机扰动) 扩展.
    PhysicianDelta(PhysicianDelta),
}

impl ExpansionPolicy {
    /// 策略名称, 用于日志.
    pub fn name(&self) -> &'static str {
        match self {
            ExpansionPolicy::Uniform(_) => "uniform",
            ExpansionPolicy::AnyDirection(_) => "any-direction",
            ExpansionPolicy::BackgroundPercentage(_) => "background-percentage",
            ExpansionPolicy::PhysicianDelta(_) => "physician-delta",
        }
    }

    /// 以 `minimal` 为起点扩展标签 `label` 的包围盒.
    ///
    /// 随机参数在每次调用时从 `rng` 中重新抽取.
    /// `label` 为背景或 `minimal` 越界时 panic.
    pub fn expand<R: Rng + ?Sized>(
        &self,
        grid: &LabelGrid,
        minimal: BoundingBox,
        label: Label,
        rng: &mut R,
    ) -> BoundingBox {
        match self {
            ExpansionPolicy::Uniform(p) => p.expand(grid, minimal, label, rng),
            ExpansionPolicy::AnyDirection(p) => p.expand(grid, minimal, label, rng),
            ExpansionPolicy::BackgroundPercentage(p) => p.expand(grid, minimal, label),
            ExpansionPolicy::PhysicianDelta(p) => p.expand(grid, minimal, label, rng),
        }
    }
}

impl From<Uniform> for ExpansionPolicy {
    #[inline]
    fn from(value: Uniform) -> Self {
        ExpansionPolicy::Uniform(value)
    }
}

impl From<AnyDirection> for ExpansionPolicy {
    #[inline]
    fn from(value: AnyDirection) -> Self {
        ExpansionPolicy::AnyDirection(value)
    }
}

impl From<BackgroundPercentage> for ExpansionPolicy {
    #[inline]
    fn from(value: BackgroundPercentage) -> Self {
        ExpansionPolicy::BackgroundPercentage(value)
    }
}

impl From<PhysicianDelta> for ExpansionPolicy {
    #[inline]
    fn from(value: PhysicianDelta) -> Self {
        ExpansionPolicy::PhysicianDelta(value)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{cube_box, cube_grid};
    use super::{AnyDirection, BackgroundPercentage, ExpansionPolicy, PhysicianDelta, Uniform};
    use crate::expand::Amount;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn all_policies() -> Vec<ExpansionPolicy> {
        vec![
            Uniform::new(1, 3).unwrap().into(),
            Uniform::new(Amount::Range(1, 3), Amount::Range(2, 9)).unwrap().into(),
            AnyDirection::new(2, 20).unwrap().into(),
            BackgroundPercentage::new(95.0, 1, true).unwrap().into(),
            PhysicianDelta::new([[3, 1], [0, 9], [2, 2]], [1, 2, 1], [Some([2, 2]), None, None])
                .unwrap()
                .into(),
        ]
    }

    /// 所有策略: 结果包含最小包围盒, 且不越界.
    #[test]
    fn test_policies_contain_minimal_and_fit() {
        let grids = [
            cube_grid(&[], 1),
            cube_grid(&[((7, 4, 4), 2), ((4, 1, 5), 2)], 2),
            cube_grid(&[((6, 6, 6), 2)], 2),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        for grid in grids.iter() {
            for policy in all_policies() {
                for _ in 0..10 {
                    let b = policy.expand(grid, cube_box(), 1, &mut rng);
                    assert!(b.contains(&cube_box()), "{} shrank: {b}", policy.name());
                    assert!(b.fits(grid.shape()), "{} overflowed: {b}", policy.name());
                }
            }
        }
    }

    #[test]
    fn test_policy_names() {
        let names: Vec<_> = all_policies().iter().map(ExpansionPolicy::name).collect();
        assert_eq!(
            names,
            [
                "uniform",
                "uniform",
                "any-direction",
                "background-percentage",
                "physician-delta"
            ]
        );
    }
}
