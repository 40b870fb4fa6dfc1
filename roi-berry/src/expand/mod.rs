//! 包围盒扩展引擎.
//!
//! 由三层组成:
//!
//! 1. [`RegionCounts`]: 统计探测区域内各标签的体素数, 判断纯度, 计算百分比;
//! 2. [`GrowthCursor`]: 单个区域扩展时的可变状态 (包围盒 + [`GrowthState`]),
//!   提供六个方向共用的增长原语;
//! 3. [`ExpansionPolicy`]: 四种扩展策略, 由 [`ExpansionEngine`] 驱动.

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{RoiError, RoiResult};

mod counter;
mod engine;
mod growth;
mod policy;

pub use counter::RegionCounts;
pub use engine::ExpansionEngine;
pub use growth::{GrowthCursor, GrowthState};
pub use policy::{
    AnyDirection, BackgroundPercentage, ExpansionPolicy, PhysicianDelta, Uniform,
};

#[cfg(feature = "rayon")]
pub use engine::par_expand_all;

/// 体素数参数: 固定值, 或每次扩展时从闭区间 `[low, high]` 中均匀抽取的随机值.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Amount {
    /// 固定值.
    Fixed(usize),

    /// 随机区间 `[low, high]`, 两端均可取到.
    Range(usize, usize),
}

impl From<usize> for Amount {
    #[inline]
    fn from(value: usize) -> Self {
        Amount::Fixed(value)
    }
}

impl Amount {
    /// 检查参数合法性: 固定值必须为正; 区间必须满足 `0 < low < high`.
    /// `name` 仅用于错误信息.
    pub fn validate(&self, name: &'static str) -> RoiResult<()> {
        match *self {
            Amount::Fixed(0) => Err(RoiError::NonPositive(name)),
            Amount::Fixed(_) => Ok(()),
            Amount::Range(low, high) if low == 0 || low >= high => {
                Err(RoiError::InvalidRange { low, high })
            }
            Amount::Range(..) => Ok(()),
        }
    }

    /// 取值. 区间参数每次调用都会重新抽取.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match *self {
            Amount::Fixed(v) => v,
            Amount::Range(low, high) => rng.gen_range(low..=high),
        }
    }
}
