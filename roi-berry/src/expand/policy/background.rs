use crate::expand::{Amount, GrowthCursor};
use crate::grid::{BoundingBox, Direction, LabelGrid};
use crate::{Label, RoiError, RoiResult};

/// 背景百分比扩展.
///
/// 先检查最小包围盒, 背景百分比已达到 `target` 时原样返回.
/// 否则按 x-, x+, y-, y+, z-, z+ 顺序各尝试增长一次 (只走一轮).
/// `enforce` 为真时, 每个方向之后都重新检查, 达到目标或已无可增长方向即停;
/// 为假时总是走完整轮.
#[derive(Copy, Clone, Debug)]
pub struct BackgroundPercentage {
    target: f64,
    step: usize,
    enforce: bool,
}

impl BackgroundPercentage {
    /// 构建策略.
    ///
    /// `target` 必须位于 `[0, 100]`; `step` 必须为正的固定值.
    pub fn new(target: f64, step: impl Into<Amount>, enforce: bool) -> RoiResult<Self> {
        if !(0.0..=100.0).contains(&target) {
            return Err(RoiError::InvalidPercentage(target));
        }
        let step = match step.into() {
            Amount::Fixed(0) => return Err(RoiError::NonPositive("step")),
            Amount::Fixed(s) => s,
            Amount::Range(..) => return Err(RoiError::FixedStepRequired),
        };
        Ok(Self {
            target,
            step,
            enforce,
        })
    }

    /// 目标背景百分比.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// 步长.
    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    pub(crate) fn expand(&self, grid: &LabelGrid, minimal: BoundingBox, label: Label) -> BoundingBox {
        let mut cursor = GrowthCursor::new(grid, minimal, label);
        let (bg, _) = cursor.percentages();
        if bg >= self.target {
            log::debug!("Label {label}: background {bg:.1}% already reaches {}%", self.target);
            return minimal;
        }
        self.single_pass(&mut cursor, |dir, bg| {
            log::debug!("Label {label}: after {dir} background is {bg:.1}%");
        });
        cursor.into_bbox()
    }

    /// 走一轮. 每个方向尝试之后, 把方向与新的背景百分比交给 `observe`.
    fn single_pass<F>(&self, cursor: &mut GrowthCursor<'_>, mut observe: F)
    where
        F: FnMut(Direction, f64),
    {
        for dir in Direction::ALL {
            cursor.try_grow(dir, self.step);
            let (bg, _) = cursor.percentages();
            observe(dir, bg);
            if self.enforce && (bg >= self.target || !cursor.state().any_enabled()) {
                cursor.state_mut().disable_all();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BackgroundPercentage;
    use crate::expand::policy::fixtures::{cube_box, cube_grid};
    use crate::expand::{Amount, GrowthCursor};
    use crate::grid::{BoundingBox, Direction, LabelGrid};
    use crate::RoiError;
    use ndarray::Array3;

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            BackgroundPercentage::new(50.0, Amount::Range(1, 3), true),
            Err(RoiError::FixedStepRequired)
        ));
        assert!(matches!(
            BackgroundPercentage::new(120.0, 1, true),
            Err(RoiError::InvalidPercentage(_))
        ));
        assert!(BackgroundPercentage::new(f64::NAN, 1, true).is_err());
        assert!(BackgroundPercentage::new(-1.0, 1, true).is_err());
        assert!(BackgroundPercentage::new(50.0, 0, true).is_err());
        assert!(BackgroundPercentage::new(0.0, 1, false).is_ok());
    }

    #[test]
    fn test_stops_when_target_reached() {
        let g = cube_grid(&[], 1);
        let p = BackgroundPercentage::new(80.0, 1, true).unwrap();
        let mut trace = vec![];
        let mut cursor = GrowthCursor::new(&g, cube_box(), 1);
        p.single_pass(&mut cursor, |dir, bg| trace.push((dir, bg)));

        let dirs: Vec<_> = trace.iter().map(|&(d, _)| d).collect();
        assert_eq!(dirs, Direction::ALL[..5]);
        let expected = [100.0 / 3.0, 50.0, 200.0 / 3.0, 75.0, 250.0 / 3.0];
        for (&(_, bg), e) in trace.iter().zip(expected) {
            assert!((bg - e).abs() < 1e-9, "{bg} != {e}");
        }
        assert!(!cursor.state().any_enabled());
        assert_eq!(cursor.bbox(), BoundingBox::new(3, 6, 3, 6, 3, 5));

        assert_eq!(
            p.expand(&g, cube_box(), 1),
            BoundingBox::new(3, 6, 3, 6, 3, 5)
        );
    }

    #[test]
    fn test_background_non_decreasing() {
        let g = cube_grid(&[((4, 8, 4), 2)], 2);
        let p = BackgroundPercentage::new(99.0, 1, true).unwrap();
        let mut trace = vec![];
        let mut cursor = GrowthCursor::new(&g, cube_box(), 1);
        p.single_pass(&mut cursor, |_, bg| trace.push(bg));
        assert_eq!(trace.len(), 6);
        assert!(trace.windows(2).all(|w| w[0] <= w[1]), "{trace:?}");
    }

    #[test]
    fn test_unenforced_runs_full_pass() {
        let g = cube_grid(&[], 1);
        let p = BackgroundPercentage::new(80.0, 1, false).unwrap();
        assert_eq!(
            p.expand(&g, cube_box(), 1),
            BoundingBox::new(3, 6, 3, 6, 3, 6)
        );
    }

    #[test]
    fn test_already_sparse_is_unchanged() {
        // 两个体素在对角, 最小包围盒 27 个体素中只有 2 个前景.
        let mut data = Array3::zeros((6, 6, 6));
        data[(1, 1, 1)] = 1;
        data[(3, 3, 3)] = 1;
        let g = LabelGrid::new(data, 1);
        let minimal = g.minimal_box(1).unwrap();
        assert_eq!(minimal, BoundingBox::new(1, 3, 1, 3, 1, 3));

        let p = BackgroundPercentage::new(80.0, 1, true).unwrap();
        assert_eq!(p.expand(&g, minimal, 1), minimal);
    }
}
