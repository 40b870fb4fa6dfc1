//! 标签网格与 3D 包围盒.

use std::fmt;
use std::iter;
use std::ops::Index;

use ndarray::{s, Array3, ArrayView3, Axis as NdAxis, Ix3, SliceInfo, SliceInfoElem};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::DIRECTIONS;
use crate::{Idx3d, Label};

mod label;

pub use label::{label_components, StructuringElement};

/// 按标签索引的包围盒列表. 第 `0` 项恒为 `None` (背景哨兵),
/// 第 `i` 项为标签 `i` 的包围盒.
pub type BoxList = Vec<Option<BoundingBox>>;

/// 包围盒坐标轴. `X`, `Y`, `Z` 依次对应数组第 0, 1, 2 维.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    /// 数组第 0 维.
    X,

    /// 数组第 1 维.
    Y,

    /// 数组第 2 维.
    Z,
}

impl Axis {
    /// 按维度顺序排列的所有轴.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// 该轴对应的数组维度.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// 包围盒的六个增长方向. 判别值即方向索引 `0..6`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// x 负方向.
    XNeg,

    /// x 正方向.
    XPos,

    /// y 负方向.
    YNeg,

    /// y 正方向.
    YPos,

    /// z 负方向.
    ZNeg,

    /// z 正方向.
    ZPos,
}

impl Direction {
    /// 固定的尝试顺序: x-, x+, y-, y+, z-, z+.
    pub const ALL: [Direction; DIRECTIONS] = [
        Direction::XNeg,
        Direction::XPos,
        Direction::YNeg,
        Direction::YPos,
        Direction::ZNeg,
        Direction::ZPos,
    ];

    /// 方向索引.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 方向所在的轴.
    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            Direction::XNeg | Direction::XPos => Axis::X,
            Direction::YNeg | Direction::YPos => Axis::Y,
            Direction::ZNeg | Direction::ZPos => Axis::Z,
        }
    }

    /// 是否沿坐标增大的方向增长.
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(self, Direction::XPos | Direction::YPos | Direction::ZPos)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::XNeg => "x-",
            Direction::XPos => "x+",
            Direction::YNeg => "y-",
            Direction::YPos => "y+",
            Direction::ZNeg => "z-",
            Direction::ZPos => "z+",
        };
        f.write_str(s)
    }
}

/// 轴对齐的 3D 闭区间包围盒 `(xmin, xmax, ymin, ymax, zmin, zmax)`.
///
/// 构造时保证每个轴上 `min <= max`. 是否越界由使用者结合网格形状检查,
/// 见 [`Self::fits`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    lo: [usize; 3],
    hi: [usize; 3],
}

impl BoundingBox {
    /// 按 `(xmin, xmax, ymin, ymax, zmin, zmax)` 顺序构造.
    ///
    /// 任一轴上 `min > max` 时 panic.
    pub fn new(xmin: usize, xmax: usize, ymin: usize, ymax: usize, zmin: usize, zmax: usize) -> Self {
        Self::from_bounds([xmin, ymin, zmin], [xmax, ymax, zmax])
    }

    /// 由各轴下界和上界构造. 任一轴上 `lo > hi` 时 panic.
    pub fn from_bounds(lo: [usize; 3], hi: [usize; 3]) -> Self {
        assert!(
            lo.iter().zip(hi.iter()).all(|(l, h)| l <= h),
            "包围盒下界大于上界: {lo:?} > {hi:?}"
        );
        Self { lo, hi }
    }

    /// `(xmin, xmax, ymin, ymax, zmin, zmax)`.
    #[inline]
    pub fn as_tuple(&self) -> (usize, usize, usize, usize, usize, usize) {
        let ([x0, y0, z0], [x1, y1, z1]) = (self.lo, self.hi);
        (x0, x1, y0, y1, z0, z1)
    }

    /// `axis` 轴上的下界 (含).
    #[inline]
    pub fn lower(&self, axis: Axis) -> usize {
        self.lo[axis.index()]
    }

    /// `axis` 轴上的上界 (含).
    #[inline]
    pub fn upper(&self, axis: Axis) -> usize {
        self.hi[axis.index()]
    }

    /// 包围盒左下角 (各轴下界) 的索引.
    #[inline]
    pub fn origin(&self) -> Idx3d {
        (self.lo[0], self.lo[1], self.lo[2])
    }

    /// 各轴上的体素个数.
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        [0, 1, 2].map(|i| self.hi[i] - self.lo[i] + 1)
    }

    /// 包围盒内的体素总数. 恒大于 0.
    #[inline]
    pub fn voxels(&self) -> usize {
        self.shape().iter().product()
    }

    /// `other` 是否完全位于 `self` 之内.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        (0..3).all(|i| self.lo[i] <= other.lo[i] && other.hi[i] <= self.hi[i])
    }

    /// 是否完全位于形状为 `shape` 的网格之内.
    #[inline]
    pub fn fits(&self, shape: [usize; 3]) -> bool {
        (0..3).all(|i| self.hi[i] < shape[i])
    }

    /// 沿 `dir` 方向外扩 `step` 个体素后的候选包围盒.
    ///
    /// 若候选包围盒会超出形状为 `shape` 的网格, 则返回 `None`.
    pub fn grown(&self, dir: Direction, step: usize, shape: [usize; 3]) -> Option<BoundingBox> {
        let a = dir.axis().index();
        let mut ans = *self;
        if dir.is_positive() {
            let hi = self.hi[a].checked_add(step)?;
            if hi >= shape[a] {
                return None;
            }
            ans.hi[a] = hi;
        } else {
            ans.lo[a] = self.lo[a].checked_sub(step)?;
        }
        Some(ans)
    }

    /// 用于 `ndarray` 切片的下标描述.
    #[inline]
    pub(crate) fn slice_info(&self) -> SliceInfo<[SliceInfoElem; 3], Ix3, Ix3> {
        let ([x0, y0, z0], [x1, y1, z1]) = (self.lo, self.hi);
        s![x0..=x1, y0..=y1, z0..=z1]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x0, x1, y0, y1, z0, z1) = self.as_tuple();
        write!(f, "({x0}, {x1}, {y0}, {y1}, {z0}, {z1})")
    }
}

/// 连通区域标记结果. `0` 为背景, `1..=N` 为各个互不相交的连通区域.
///
/// 网格在整个扩展过程中只读, 病例处理完毕后随之销毁.
#[derive(Debug, Clone)]
pub struct LabelGrid {
    data: Array3<Label>,
    components: Label,
}

impl Index<Idx3d> for LabelGrid {
    type Output = Label;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LabelGrid {
    /// 由标记数据和连通区域个数直接创建.
    ///
    /// `data` 为空, 或存在大于 `components` 的体素值时 panic.
    pub fn new(data: Array3<Label>, components: Label) -> Self {
        assert!(!data.is_empty(), "标签网格不能为空");
        assert!(
            data.iter().all(|&v| v <= components),
            "标签值超出连通区域个数 {components}"
        );
        Self { data, components }
    }

    /// 网格形状.
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        let &[x, y, z] = self.data.shape() else {
            unreachable!()
        };
        [x, y, z]
    }

    /// 连通区域个数 `N`.
    #[inline]
    pub fn components(&self) -> Label {
        self.components
    }

    /// 获取 `bbox` 范围内的子网格视图. `bbox` 越界时 panic.
    #[inline]
    pub fn probe(&self, bbox: &BoundingBox) -> ArrayView3<'_, Label> {
        assert!(bbox.fits(self.shape()), "包围盒 {bbox} 越界");
        self.data.slice(bbox.slice_info())
    }

    /// 通过逐轴投影求标签 `label` 的最小包围盒.
    ///
    /// 对每个轴, 下界 (上界) 是沿该轴第一个 (最后一个)
    /// 投影到另两轴后含有 `label` 体素的索引. 标签不存在时返回 `None`.
    pub fn minimal_box(&self, label: Label) -> Option<BoundingBox> {
        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for axis in Axis::ALL {
            let a = axis.index();
            let present = |i: &usize| {
                self.data
                    .index_axis(NdAxis(a), *i)
                    .iter()
                    .any(|&v| v == label)
            };
            let len = self.data.len_of(NdAxis(a));
            lo[a] = (0..len).find(&present)?;
            hi[a] = (0..len).rev().find(&present)?;
        }
        Some(BoundingBox::from_bounds(lo, hi))
    }

    /// 求所有连通区域的最小包围盒, 结果按标签索引, 第 `0` 项为 `None`.
    ///
    /// 结果长度恒为 `N + 1`.
    pub fn minimal_boxes(&self) -> BoxList {
        let boxes: BoxList = iter::once(None)
            .chain((1..=self.components).map(|l| self.minimal_box(l)))
            .collect();
        assert_eq!(
            boxes.len(),
            self.components as usize + 1,
            "包围盒个数与连通区域个数不一致"
        );
        boxes
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, BoundingBox, Direction, LabelGrid};
    use ndarray::Array3;

    fn grid_with(components: u32, voxels: &[((usize, usize, usize), u32)]) -> LabelGrid {
        let mut data = Array3::zeros((10, 10, 10));
        for &(pos, v) in voxels {
            data[pos] = v;
        }
        LabelGrid::new(data, components)
    }

    #[test]
    fn test_direction_order() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
            assert_eq!(d.axis().index(), i / 2);
            assert_eq!(d.is_positive(), i % 2 == 1);
        }
        assert_eq!(Direction::ZPos.to_string(), "z+");
    }

    #[test]
    fn test_box_grown_bounds() {
        let shape = [10, 10, 10];
        let b = BoundingBox::new(1, 8, 4, 5, 4, 5);
        assert_eq!(
            b.grown(Direction::XNeg, 1, shape),
            Some(BoundingBox::new(0, 8, 4, 5, 4, 5))
        );
        assert_eq!(b.grown(Direction::XNeg, 2, shape), None);
        assert_eq!(
            b.grown(Direction::XPos, 1, shape),
            Some(BoundingBox::new(1, 9, 4, 5, 4, 5))
        );
        assert_eq!(b.grown(Direction::XPos, 2, shape), None);
        assert_eq!(
            b.grown(Direction::ZPos, 3, shape),
            Some(BoundingBox::new(1, 8, 4, 5, 4, 8))
        );
    }

    #[test]
    fn test_box_contains_and_shape() {
        let outer = BoundingBox::new(2, 7, 2, 7, 2, 7);
        let inner = BoundingBox::new(4, 5, 4, 5, 4, 5);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert_eq!(inner.shape(), [2, 2, 2]);
        assert_eq!(outer.voxels(), 216);
        assert_eq!(outer.lower(Axis::Y), 2);
        assert_eq!(outer.upper(Axis::Z), 7);
        assert!(outer.fits([8, 8, 8]));
        assert!(!outer.fits([8, 8, 7]));
    }

    #[test]
    #[should_panic]
    fn test_box_inverted() {
        let _ = BoundingBox::new(5, 4, 0, 0, 0, 0);
    }

    #[test]
    fn test_minimal_box_projection() {
        // L 形区域.
        let g = grid_with(
            1,
            &[((2, 3, 4), 1), ((2, 3, 5), 1), ((3, 3, 5), 1), ((3, 6, 5), 1)],
        );
        assert_eq!(g.minimal_box(1), Some(BoundingBox::new(2, 3, 3, 6, 4, 5)));
        assert_eq!(g.minimal_box(2), None);
    }

    #[test]
    fn test_minimal_boxes_sentinel() {
        let g = grid_with(2, &[((0, 0, 0), 1), ((9, 9, 9), 2), ((8, 9, 9), 2)]);
        let boxes = g.minimal_boxes();
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0], None);
        assert_eq!(boxes[1], Some(BoundingBox::new(0, 0, 0, 0, 0, 0)));
        assert_eq!(boxes[2], Some(BoundingBox::new(8, 9, 9, 9, 9, 9)));
    }

    #[test]
    fn test_probe_view() {
        let g = grid_with(1, &[((4, 4, 4), 1)]);
        let v = g.probe(&BoundingBox::new(3, 5, 4, 4, 4, 5));
        assert_eq!(v.shape(), &[3, 1, 2]);
        assert_eq!(v.iter().filter(|&&x| x == 1).count(), 1);
    }

    #[test]
    #[should_panic]
    fn test_grid_label_out_of_range() {
        let _ = grid_with(1, &[((1, 1, 1), 2)]);
    }
}
