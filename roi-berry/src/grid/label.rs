//! 连通区域标记.

use std::collections::VecDeque;

use itertools::iproduct;
use ndarray::{Array3, ArrayView3};

use super::LabelGrid;
use crate::consts::{is_foreground_mask, BACKGROUND, DEFAULT_SE_DIM};
use crate::{Idx3d, Label, RoiError, RoiResult};

/// 连通性结构元: 以体素为中心, 尺寸为 `dx * dy * dz` 的全 1 邻域.
///
/// 两个前景体素相邻, 当且仅当它们在每个轴上的坐标差不超过该轴尺寸的一半.
#[derive(Clone, Debug)]
pub struct StructuringElement {
    dim: [usize; 3],
    offsets: Vec<[isize; 3]>,
}

impl Default for StructuringElement {
    /// `3 * 3 * 3`, 即 26-邻域.
    fn default() -> Self {
        // 默认尺寸必然合法.
        Self::from_valid_dim(DEFAULT_SE_DIM)
    }
}

impl StructuringElement {
    /// 构建结构元. 每一维都必须为正奇数, 否则返回 `Err`.
    pub fn new(dim: [usize; 3]) -> RoiResult<Self> {
        if dim.iter().any(|&d| d == 0 || d % 2 == 0) {
            return Err(RoiError::InvalidStructuringElement(dim));
        }
        Ok(Self::from_valid_dim(dim))
    }

    fn from_valid_dim(dim: [usize; 3]) -> Self {
        let [rx, ry, rz] = dim.map(|d| (d / 2) as isize);
        let offsets = iproduct!(-rx..=rx, -ry..=ry, -rz..=rz)
            .filter(|&o| o != (0, 0, 0))
            .map(|(a, b, c)| [a, b, c])
            .collect();
        Self { dim, offsets }
    }

    /// 结构元尺寸.
    #[inline]
    pub fn dim(&self) -> [usize; 3] {
        self.dim
    }

    /// `pos` 在形状为 `shape` 的网格内的所有邻居. 越界者被过滤掉.
    fn neighbours(&self, (x, y, z): Idx3d, shape: [usize; 3]) -> impl Iterator<Item = Idx3d> + '_ {
        self.offsets.iter().filter_map(move |&[dx, dy, dz]| {
            let nx = x.checked_add_signed(dx)?;
            let ny = y.checked_add_signed(dy)?;
            let nz = z.checked_add_signed(dz)?;
            (nx < shape[0] && ny < shape[1] && nz < shape[2]).then_some((nx, ny, nz))
        })
    }
}

/// 对掩码做连通区域标记. 所有非零体素都视为前景.
///
/// 标签按行优先序下每个区域第一个体素出现的先后分配为 `1..=N`.
/// `mask` 为空时 panic.
pub fn label_components(mask: ArrayView3<'_, u8>, se: &StructuringElement) -> LabelGrid {
    let &[sx, sy, sz] = mask.shape() else {
        unreachable!()
    };
    let shape = [sx, sy, sz];
    let mut labels = Array3::<Label>::zeros(mask.raw_dim());
    let mut next: Label = 0;
    let mut bfs_q = VecDeque::with_capacity(64);

    for (pos, &v) in mask.indexed_iter() {
        if !is_foreground_mask(v) || labels[pos] != BACKGROUND {
            continue;
        }
        next += 1;
        labels[pos] = next;
        bfs_q.push_back(pos);

        while let Some(cur) = bfs_q.pop_front() {
            for neigh in se.neighbours(cur, shape) {
                if is_foreground_mask(mask[neigh]) && labels[neigh] == BACKGROUND {
                    labels[neigh] = next;
                    bfs_q.push_back(neigh);
                }
            }
        }
    }
    log::debug!("Labeling found {next} components");
    LabelGrid::new(labels, next)
}
