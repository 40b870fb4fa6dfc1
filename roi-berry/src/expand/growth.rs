use super::RegionCounts;
use crate::consts::{BACKGROUND, DIRECTIONS};
use crate::grid::{BoundingBox, Direction, LabelGrid};
use crate::Label;

/// 六个方向 `[x-, x+, y-, y+, z-, z+]` 是否仍可增长.
///
/// 每个方向只会从 `true` 变为 `false`, 不会恢复.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GrowthState([bool; DIRECTIONS]);

impl Default for GrowthState {
    #[inline]
    fn default() -> Self {
        Self::all()
    }
}

impl GrowthState {
    /// 所有方向均可增长.
    #[inline]
    pub const fn all() -> Self {
        Self([true; DIRECTIONS])
    }

    /// 所有方向均不可增长.
    #[inline]
    pub const fn none() -> Self {
        Self([false; DIRECTIONS])
    }

    /// 由谓词决定每个方向的初始状态.
    pub fn from_fn<F: FnMut(Direction) -> bool>(mut f: F) -> Self {
        Self(Direction::ALL.map(&mut f))
    }

    /// `dir` 方向是否仍可增长.
    #[inline]
    pub fn is_enabled(&self, dir: Direction) -> bool {
        self.0[dir.index()]
    }

    /// 永久禁用 `dir` 方向.
    #[inline]
    pub fn disable(&mut self, dir: Direction) {
        self.0[dir.index()] = false;
    }

    /// 永久禁用所有方向.
    #[inline]
    pub fn disable_all(&mut self) {
        self.0 = [false; DIRECTIONS];
    }

    /// 是否所有方向都仍可增长.
    #[inline]
    pub fn all_enabled(&self) -> bool {
        self.0.iter().all(|&b| b)
    }

    /// 是否至少有一个方向仍可增长.
    #[inline]
    pub fn any_enabled(&self) -> bool {
        self.0.iter().any(|&b| b)
    }

    /// 底层状态数组.
    #[inline]
    pub fn as_array(&self) -> [bool; DIRECTIONS] {
        self.0
    }
}

/// 单个区域扩展过程中的全部可变状态: 当前包围盒与 [`GrowthState`].
///
/// 六个方向共用同一个增长原语 [`Self::try_grow`], 仅以 [`Direction`] 区分.
#[derive(Clone, Debug)]
pub struct GrowthCursor<'a> {
    grid: &'a LabelGrid,
    target: Label,
    bbox: BoundingBox,
    state: GrowthState,
}

impl<'a> GrowthCursor<'a> {
    /// 从最小包围盒 `minimal` 出发, 所有方向均可增长.
    ///
    /// `target` 为背景, 或 `minimal` 越界时 panic.
    pub fn new(grid: &'a LabelGrid, minimal: BoundingBox, target: Label) -> Self {
        assert_ne!(target, BACKGROUND, "不能扩展背景区域");
        assert!(minimal.fits(grid.shape()), "包围盒 {minimal} 越界");
        Self {
            grid,
            target,
            bbox: minimal,
            state: GrowthState::all(),
        }
    }

    /// 替换初始方向状态.
    #[inline]
    pub fn with_state(mut self, state: GrowthState) -> Self {
        self.state = state;
        self
    }

    /// 当前包围盒.
    #[inline]
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// 当前方向状态.
    #[inline]
    pub fn state(&self) -> &GrowthState {
        &self.state
    }

    /// 当前方向状态, 可变.
    #[inline]
    pub fn state_mut(&mut self) -> &mut GrowthState {
        &mut self.state
    }

    /// 当前包围盒内的标签计数.
    #[inline]
    pub fn counts(&self) -> RegionCounts {
        RegionCounts::count(self.grid.probe(&self.bbox), self.grid.components())
    }

    /// 当前包围盒的 `(背景百分比, 目标百分比)`.
    #[inline]
    pub fn percentages(&self) -> (f64, f64) {
        self.counts().percentages(self.target)
    }

    /// 增长原语: 尝试沿 `dir` 方向外扩 `step` 个体素. 返回是否增长成功.
    ///
    /// 1. 方向已禁用: 什么也不做;
    /// 2. 候选包围盒越界: 永久禁用该方向;
    /// 3. 候选包围盒 (整体, 包括已接受的内部) 不纯: 永久禁用该方向;
    /// 4. 否则提交增长.
    pub fn try_grow(&mut self, dir: Direction, step: usize) -> bool {
        if !self.state.is_enabled(dir) {
            return false;
        }
        let Some(candidate) = self.bbox.grown(dir, step, self.grid.shape()) else {
            log::debug!("Label {}: {dir} hits the grid boundary", self.target);
            self.state.disable(dir);
            return false;
        };
        let counts = RegionCounts::count(self.grid.probe(&candidate), self.grid.components());
        if counts.is_pure(self.target) {
            self.bbox = candidate;
            true
        } else {
            log::debug!("Label {}: {dir} touches another region", self.target);
            self.state.disable(dir);
            false
        }
    }

    /// 按固定顺序 x-, x+, y-, y+, z-, z+ 各尝试一次增长.
    pub fn grow_round(&mut self, step: usize) {
        for dir in Direction::ALL {
            self.try_grow(dir, step);
        }
    }

    /// 结束扩展, 取出包围盒.
    #[inline]
    pub fn into_bbox(self) -> BoundingBox {
        self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::{GrowthCursor, GrowthState};
    use crate::expand::policy::fixtures::{cube_box as minimal, cube_grid};
    use crate::grid::{BoundingBox, Direction};

    #[test]
    fn test_state_transitions() {
        let mut s = GrowthState::all();
        assert!(s.all_enabled());
        s.disable(Direction::YPos);
        assert!(!s.all_enabled());
        assert!(s.any_enabled());
        assert!(!s.is_enabled(Direction::YPos));
        s.disable_all();
        assert_eq!(s, GrowthState::none());
        let s = GrowthState::from_fn(Direction::is_positive);
        assert_eq!(s.as_array(), [false, true, false, true, false, true]);
    }

    #[test]
    fn test_grow_commits_when_pure() {
        let g = cube_grid(&[], 1);
        let mut c = GrowthCursor::new(&g, minimal(), 1);
        assert!(c.try_grow(Direction::XNeg, 2));
        assert!(c.try_grow(Direction::ZPos, 1));
        assert_eq!(c.bbox(), BoundingBox::new(2, 5, 4, 5, 4, 6));
        assert!(c.state().all_enabled());
    }

    #[test]
    fn test_grow_disabled_at_boundary() {
        let g = cube_grid(&[], 1);
        let mut c = GrowthCursor::new(&g, minimal(), 1);
        // 5 + 5 = 10, 越界.
        assert!(!c.try_grow(Direction::XPos, 5));
        assert!(!c.state().is_enabled(Direction::XPos));
        assert_eq!(c.bbox(), minimal());
        // 方向已禁用, 即使步长合法也不会增长.
        assert!(!c.try_grow(Direction::XPos, 1));
        // 4 - 4 = 0, 恰好不越界.
        assert!(c.try_grow(Direction::XNeg, 4));
        assert_eq!(c.bbox().as_tuple(), (0, 5, 4, 5, 4, 5));
    }

    #[test]
    fn test_grow_disabled_by_foreign_region() {
        let g = cube_grid(&[((7, 5, 5), 2)], 2);
        let mut c = GrowthCursor::new(&g, minimal(), 1);
        assert!(c.try_grow(Direction::XPos, 1));
        assert!(!c.try_grow(Direction::XPos, 1));
        assert!(!c.state().is_enabled(Direction::XPos));
        assert_eq!(c.bbox().upper(crate::Axis::X), 6);
        // 其他方向不受影响.
        assert!(c.try_grow(Direction::YPos, 1));
    }

    #[test]
    fn test_grow_round_order() {
        let g = cube_grid(&[], 1);
        let mut c = GrowthCursor::new(&g, minimal(), 1);
        c.grow_round(1);
        assert_eq!(c.bbox(), BoundingBox::new(3, 6, 3, 6, 3, 6));
        let (bg, gt) = c.percentages();
        assert!((bg - 87.5).abs() < 1e-9);
        assert!((gt - 12.5).abs() < 1e-9);
    }

    #[test]
    #[should_panic]
    fn test_cursor_background_target() {
        let g = cube_grid(&[], 1);
        let _ = GrowthCursor::new(&g, minimal(), 0);
    }
}
