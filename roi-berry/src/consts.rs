//! 通用常量.

use crate::Label;

/// 标签网格中, 背景体素的值.
pub const BACKGROUND: Label = 0;

/// 包围盒可增长的方向个数: x-, x+, y-, y+, z-, z+.
pub const DIRECTIONS: usize = 6;

/// 默认掩码文件名后缀. 例如 `LIDC-IDRI-0001_GT1_Mask.nii.gz`.
pub const MASK_SUFFIX: &str = "_Mask.nii.gz";

/// 输出文件默认扩展名.
pub const NII_GZ: &str = ".nii.gz";

/// 连通区域标记时默认的结构元尺寸.
pub const DEFAULT_SE_DIM: [usize; 3] = [3, 3, 3];

/// 掩码体素是否是前景? 任何非零值都视为前景.
#[inline]
pub const fn is_foreground_mask(v: u8) -> bool {
    v != 0
}
