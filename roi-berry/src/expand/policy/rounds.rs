//! 按轮扩展的两种策略: 每轮依次尝试六个方向.

use rand::Rng;

use crate::expand::{Amount, GrowthCursor};
use crate::grid::{BoundingBox, LabelGrid};
use crate::{Label, RoiResult};

fn checked(step: Amount, limit: Amount) -> RoiResult<(Amount, Amount)> {
    step.validate("step")?;
    limit.validate("limit")?;
    Ok((step, limit))
}

/// 同步扩展.
///
/// 每轮结束后, 若六个方向全部仍可增长, 则累计 `step` 并记下当前包围盒;
/// 否则停止, 返回最后一次六个方向全部成功时的包围盒.
/// 累计达到 `limit` 时同样停止.
#[derive(Copy, Clone, Debug)]
pub struct Uniform {
    step: Amount,
    limit: Amount,
}

impl Uniform {
    /// 构建策略. `step` 与 `limit` 不合法时返回 `Err`.
    pub fn new(step: impl Into<Amount>, limit: impl Into<Amount>) -> RoiResult<Self> {
        let (step, limit) = checked(step.into(), limit.into())?;
        Ok(Self { step, limit })
    }

    /// 每轮步长.
    #[inline]
    pub fn step(&self) -> Amount {
        self.step
    }

    /// 累计增长上限.
    #[inline]
    pub fn limit(&self) -> Amount {
        self.limit
    }

    pub(crate) fn expand<R: Rng + ?Sized>(
        &self,
        grid: &LabelGrid,
        minimal: BoundingBox,
        label: Label,
        rng: &mut R,
    ) -> BoundingBox {
        let step = self.step.sample(rng);
        let limit = self.limit.sample(rng);
        let mut cursor = GrowthCursor::new(grid, minimal, label);
        let mut last_good = minimal;
        let mut total = 0;

        loop {
            cursor.grow_round(step);
            if !cursor.state().all_enabled() {
                break;
            }
            total += step;
            last_good = cursor.bbox();
            if total >= limit {
                break;
            }
        }
        log::debug!("Label {label}: uniform(step={step}, limit={limit}) -> {last_good}");
        last_good
    }
}

/// 独立扩展.
///
/// 每轮结束后, 只要还有方向可增长就累计 `step`; 受阻的方向单独停止,
/// 已提交的增长保留. 没有可增长方向, 或累计达到 `limit` 时停止.
#[derive(Copy, Clone, Debug)]
pub struct AnyDirection {
    step: Amount,
    limit: Amount,
}

impl AnyDirection {
    /// 构建策略. `step` 与 `limit` 不合法时返回 `Err`.
    pub fn new(step: impl Into<Amount>, limit: impl Into<Amount>) -> RoiResult<Self> {
        let (step, limit) = checked(step.into(), limit.into())?;
        Ok(Self { step, limit })
    }

    /// 每轮步长.
    #[inline]
    pub fn step(&self) -> Amount {
        self.step
    }

    /// 累计增长上限.
    #[inline]
    pub fn limit(&self) -> Amount {
        self.limit
    }

    pub(crate) fn expand<R: Rng + ?Sized>(
        &self,
        grid: &LabelGrid,
        minimal: BoundingBox,
        label: Label,
        rng: &mut R,
    ) -> BoundingBox {
        let step = self.step.sample(rng);
        let limit = self.limit.sample(rng);
        let mut cursor = GrowthCursor::new(grid, minimal, label);
        let mut total = 0;

        loop {
            cursor.grow_round(step);
            let alive = cursor.state().any_enabled();
            if alive {
                total += step;
            }
            if !alive || total >= limit {
                break;
            }
        }
        let bbox = cursor.into_bbox();
        log::debug!("Label {label}: any-direction(step={step}, limit={limit}) -> {bbox}");
        bbox
    }
}
