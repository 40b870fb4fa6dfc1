use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView3, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::NII_GZ;
use crate::grid::{label_components, BoundingBox, LabelGrid, StructuringElement};
use crate::{Idx3d, Label, RoiResult};

mod case;

pub use case::{paired_image_name, CaseRecord};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 从 header 读取数据形状. 保持 nifti 体素顺序 `(i, j, k)`.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> [usize; 3] {
    let [_, i, j, k, ..] = h.dim;
    [i as usize, j as usize, k as usize]
}

/// 转换为 3D 行优先数组. 数据不是 3D 时返回 `Err`.
fn into_standard_3d<T: Clone>(data: ArrayD<T>) -> RoiResult<Array3<T>> {
    let data = data.into_dimensionality::<Ix3>()?;
    let data = if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    };
    Ok(data)
}

/// 为内存中的数据构造最简 header: 仅设置形状与体素分辨率.
fn synthetic_header(shape: &[usize], pix_dim: [f32; 3]) -> BoxedHeader {
    let mut header = Box::<NiftiHeader>::default();
    header.dim = [1; 8];
    header.dim[0] = 3;
    for (d, &s) in header.dim[1..4].iter_mut().zip(shape) {
        *d = s as _;
    }
    header.pixdim[0] = 1.0;
    header.pixdim[1..4].copy_from_slice(&pix_dim);
    header.sform_code = 0;
    header.qform_code = 0;
    header
}

/// 裁剪后的 header: 更新形状, 并把空间原点平移到 `bbox` 的起点.
///
/// `sform_code > 0` 时平移 sform 仿射的偏移量, 否则平移 qform 偏移量.
/// 数据在读入时已经按 `scl_slope` 缩放, 因此这里把缩放复位.
fn cropped_header(h: &NiftiHeader, bbox: &BoundingBox) -> BoxedHeader {
    let mut header = Box::new(h.clone());
    for (d, s) in header.dim[1..4].iter_mut().zip(bbox.shape()) {
        *d = s as _;
    }
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;

    let (i, j, k) = bbox.origin();
    let ijk = [i as f32, j as f32, k as f32];
    let h = &mut *header;
    if h.sform_code > 0 {
        for row in [&mut h.srow_x, &mut h.srow_y, &mut h.srow_z] {
            row[3] += row[0] * ijk[0] + row[1] * ijk[1] + row[2] * ijk[2];
        }
    } else {
        let [dx, dy, dz] = qform_step(h, ijk);
        h.quatern_x += dx;
        h.quatern_y += dy;
        h.quatern_z += dz;
    }
    header
}

/// 体素位移 `ijk` 在 qform 下对应的物理位移 (毫米).
fn qform_step(h: &NiftiHeader, [i, j, k]: [f32; 3]) -> [f32; 3] {
    let (b, c, d) = (h.quatern_b, h.quatern_c, h.quatern_d);
    let a = (1.0 - b * b - c * c - d * d).max(0.0).sqrt();
    let qfac = if h.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
    let v = [i * h.pixdim[1], j * h.pixdim[2], k * h.pixdim[3] * qfac];
    let r = [
        [
            a * a + b * b - c * c - d * d,
            2.0 * (b * c - a * d),
            2.0 * (b * d + a * c),
        ],
        [
            2.0 * (b * c + a * d),
            a * a + c * c - b * b - d * d,
            2.0 * (c * d - a * b),
        ],
        [
            2.0 * (b * d - a * c),
            2.0 * (c * d + a * b),
            a * a + d * d - c * c - b * b,
        ],
    ];
    r.map(|row| row[0] * v[0] + row[1] * v[1] + row[2] * v[2])
}

/// 3D nii 文件 header 的共用属性和部分通用操作.
pub trait NiftiHeaderAttr {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状大小, 按 nifti 体素顺序 `(i, j, k)`.
    #[inline]
    fn shape(&self) -> [usize; 3] {
        get_shape_from_header(self.header())
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, &(i0, j0, k0): &Idx3d) -> bool {
        let [i, j, k] = self.shape();
        i0 < i && j0 < j && k0 < k
    }

    /// 获取单个体素分辨率, 以毫米为单位.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, i, j, k, ..] = self.header().pixdim;
        [i as f64, j as f64, k as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }
}

/// nii 格式 3D CT 扫描, 包括 header 和 CT 扫描 (HU). HU 值以 `f32` 保存.
#[derive(Debug, Clone)]
pub struct CtVolume {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl NiftiHeaderAttr for CtVolume {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtVolume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtVolume {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> RoiResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());
        let data = into_standard_3d(obj.into_volume().into_ndarray::<f32>()?)?;
        debug_assert_eq!(data.shape(), get_shape_from_header(&header));
        Ok(Self { header, data })
    }

    /// 根据裸数据和体素分辨率直接创建实体. `data` 按 `(i, j, k)` 组织.
    pub fn from_array(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let header = synthetic_header(data.shape(), pix_dim);
        Self { header, data }
    }

    /// 裁剪出 `bbox` 覆盖的子体积. header 的形状与空间原点随之更新.
    ///
    /// `bbox` 越界时 panic.
    pub fn crop(&self, bbox: &BoundingBox) -> Self {
        assert!(bbox.fits(self.shape()), "裁剪区域 {bbox} 越界");
        Self {
            header: cropped_header(&self.header, bbox),
            data: self.data.slice(bbox.slice_info()).to_owned(),
        }
    }

    /// 以自身 header 为参考, 写入 nii 文件. 扩展名为 `.gz` 时压缩.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RoiResult<()> {
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&self.data)?;
        Ok(())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }
}

/// nii 格式 3D 分割掩码. 任何非零体素都视为前景, 体素值以 `u8` 保存.
#[derive(Debug, Clone)]
pub struct CtMask {
    header: BoxedHeader,
    data: Array3<u8>,
}

impl NiftiHeaderAttr for CtMask {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for CtMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl CtMask {
    /// 打开 nii 文件格式的 3D 掩码. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> RoiResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());
        let data = into_standard_3d(obj.into_volume().into_ndarray::<u8>()?)?;
        debug_assert_eq!(data.shape(), get_shape_from_header(&header));
        Ok(Self { header, data })
    }

    /// 根据裸掩码数据和体素分辨率直接创建实体. `data` 按 `(i, j, k)` 组织.
    pub fn from_array(data: Array3<u8>, pix_dim: [f32; 3]) -> Self {
        let header = synthetic_header(data.shape(), pix_dim);
        Self { header, data }
    }

    /// 裁剪出 `bbox` 覆盖的子掩码. header 的形状与空间原点随之更新.
    ///
    /// `bbox` 越界时 panic.
    pub fn crop(&self, bbox: &BoundingBox) -> Self {
        assert!(bbox.fits(self.shape()), "裁剪区域 {bbox} 越界");
        Self {
            header: cropped_header(&self.header, bbox),
            data: self.data.slice(bbox.slice_info()).to_owned(),
        }
    }

    /// 以自身 header 为参考, 写入 nii 文件. 扩展名为 `.gz` 时压缩.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RoiResult<()> {
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&self.data)?;
        Ok(())
    }

    /// 以结构元 `se` 对掩码做连通区域标记.
    #[inline]
    pub fn label(&self, se: &StructuringElement) -> LabelGrid {
        label_components(self.data.view(), se)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 前景体素个数.
    #[inline]
    pub fn foreground(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

/// 输出文件名: `{case_id}_{label}.nii.gz`, 掩码为 `{case_id}_{label}{mask_suffix}`.
pub(crate) fn roi_file_names(case_id: &str, label: Label, mask_suffix: &str) -> (String, String) {
    (
        format!("{case_id}_{label}{NII_GZ}"),
        format!("{case_id}_{label}{mask_suffix}"),
    )
}
