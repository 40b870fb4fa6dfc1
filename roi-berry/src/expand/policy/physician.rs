use rand::Rng;

use crate::consts::DIRECTIONS;
use crate::expand::{GrowthCursor, GrowthState};
use crate::grid::{BoundingBox, Direction, LabelGrid};
use crate::{Label, RoiError, RoiResult};

/// 按医生给定的每方向扩展量扩展.
///
/// 每个轴给出 `[负方向, 正方向]` 两个目标体素数, 以及该轴的步长.
/// 若设置了扰动幅度 `delta`, 每次扩展时目标会加上 `[-delta, delta]`
/// 上均匀分布的整数偏移, 结果不小于 0. 目标小于该轴步长 (包括 0) 的方向不扩展.
///
/// 某方向再走一步就会超过目标时, 该方向停止. 因此步长不能整除目标时,
/// 实际增长会比目标少不到一步, 但绝不会超过目标.
#[derive(Copy, Clone, Debug)]
pub struct PhysicianDelta {
    expand: [[usize; 2]; 3],
    growth: [usize; 3],
    delta: [Option<[usize; 2]>; 3],
}

impl PhysicianDelta {
    /// 构建策略. 三个数组均按 x, y, z 轴排列, 内层为 `[负方向, 正方向]`.
    ///
    /// 任一轴的步长为 0 时返回 `Err`.
    pub fn new(
        expand: [[usize; 2]; 3],
        growth: [usize; 3],
        delta: [Option<[usize; 2]>; 3],
    ) -> RoiResult<Self> {
        if growth.contains(&0) {
            return Err(RoiError::NonPositive("growth"));
        }
        Ok(Self {
            expand,
            growth,
            delta,
        })
    }

    /// 抽取本次扩展的每方向目标体素数.
    pub fn resolve_targets<R: Rng + ?Sized>(&self, rng: &mut R) -> [usize; DIRECTIONS] {
        Direction::ALL.map(|dir| {
            let axis = dir.axis().index();
            let side = usize::from(dir.is_positive());
            let base = self.expand[axis][side];
            match self.delta[axis] {
                None => base,
                Some(mag) => {
                    let mag = mag[side] as isize;
                    let jitter = rng.gen_range(-mag..=mag);
                    (base as isize + jitter).max(0) as usize
                }
            }
        })
    }

    pub(crate) fn expand<R: Rng + ?Sized>(
        &self,
        grid: &LabelGrid,
        minimal: BoundingBox,
        label: Label,
        rng: &mut R,
    ) -> BoundingBox {
        let targets = self.resolve_targets(rng);
        self.expand_towards(grid, minimal, label, targets)
    }

    fn expand_towards(
        &self,
        grid: &LabelGrid,
        minimal: BoundingBox,
        label: Label,
        targets: [usize; DIRECTIONS],
    ) -> BoundingBox {
        let mut cursor = GrowthCursor::new(grid, minimal, label).with_state(GrowthState::from_fn(
            |dir| targets[dir.index()] >= self.growth[dir.axis().index()],
        ));
        let mut totals = [0usize; DIRECTIONS];

        while cursor.state().any_enabled() {
            for dir in Direction::ALL {
                if !cursor.state().is_enabled(dir) {
                    continue;
                }
                let step = self.growth[dir.axis().index()];
                if cursor.try_grow(dir, step) {
                    totals[dir.index()] += step;
                }
                if totals[dir.index()] + step > targets[dir.index()] {
                    cursor.state_mut().disable(dir);
                }
            }
        }
        let bbox = cursor.into_bbox();
        log::debug!("Label {label}: physician-delta targets {targets:?} -> {bbox}");
        bbox
    }
}
