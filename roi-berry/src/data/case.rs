use std::path::{Path, PathBuf};

use super::{CtMask, CtVolume, NiftiHeaderAttr};
use crate::consts::NII_GZ;
use crate::{RoiError, RoiResult};

/// 由掩码文件名推出病例编号与配对的扫描文件名.
///
/// 去掉 `mask_suffix` 即为病例编号, 再追加 `.nii.gz` 即为扫描文件名.
/// 文件名不以 `mask_suffix` 结尾时返回 `None`.
///
/// ```
/// use roi_berry::paired_image_name;
///
/// let (id, image) = paired_image_name("LIDC-IDRI-0001_GT1_Mask.nii.gz", "_Mask.nii.gz").unwrap();
/// assert_eq!(id, "LIDC-IDRI-0001_GT1");
/// assert_eq!(image, "LIDC-IDRI-0001_GT1.nii.gz");
/// ```
pub fn paired_image_name(mask_name: &str, mask_suffix: &str) -> Option<(String, String)> {
    let case_id = mask_name.strip_suffix(mask_suffix)?;
    if case_id.is_empty() {
        return None;
    }
    Some((case_id.to_owned(), format!("{case_id}{NII_GZ}")))
}

/// 单个病例: 编号, 掩码, 以及可选的配对扫描.
#[derive(Debug, Clone)]
pub struct CaseRecord {
    case_id: String,
    mask: CtMask,
    image: Option<CtVolume>,
    mask_file: Option<PathBuf>,
    image_file: Option<PathBuf>,
}

impl CaseRecord {
    /// 组装病例. 扫描与掩码形状不一致时返回 `Err`.
    pub fn new(case_id: impl Into<String>, mask: CtMask, image: Option<CtVolume>) -> RoiResult<Self> {
        if let Some(image) = &image {
            if image.shape() != mask.shape() {
                return Err(RoiError::ShapeMismatch {
                    image: image.shape(),
                    mask: mask.shape(),
                });
            }
        }
        Ok(Self {
            case_id: case_id.into(),
            mask,
            image,
            mask_file: None,
            image_file: None,
        })
    }

    /// 记录来源文件路径.
    pub fn with_files(mut self, mask_file: PathBuf, image_file: Option<PathBuf>) -> Self {
        self.mask_file = Some(mask_file);
        self.image_file = image_file;
        self
    }

    /// 病例编号.
    #[inline]
    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// 分割掩码.
    #[inline]
    pub fn mask(&self) -> &CtMask {
        &self.mask
    }

    /// 配对的 CT 扫描.
    #[inline]
    pub fn image(&self) -> Option<&CtVolume> {
        self.image.as_ref()
    }

    /// 掩码文件路径.
    #[inline]
    pub fn mask_file(&self) -> Option<&Path> {
        self.mask_file.as_deref()
    }

    /// 扫描文件路径.
    #[inline]
    pub fn image_file(&self) -> Option<&Path> {
        self.image_file.as_deref()
    }
}
