use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ArtifactStore, Stage};
use crate::data::{paired_image_name, CaseRecord, CtMask, CtVolume};
use crate::RoiResult;

/// 从目录中逐个读取病例的数据源.
///
/// 掩码目录下所有以 `mask_suffix` 结尾的文件按文件名排序后依次读取,
/// 配对的扫描在扫描目录中按 [`paired_image_name`] 查找.
#[derive(Debug)]
pub struct NiftiSource {
    image_dir: PathBuf,
    mask_suffix: String,
    masks: Vec<PathBuf>,
    cursor: usize,
}

impl NiftiSource {
    /// 列出 `mask_dir` 下的掩码文件. 目录无法读取时返回 `Err`.
    pub fn new(
        mask_dir: impl AsRef<Path>,
        image_dir: impl Into<PathBuf>,
        mask_suffix: impl Into<String>,
    ) -> RoiResult<Self> {
        let mask_suffix = mask_suffix.into();
        let mut masks = vec![];
        for entry in fs::read_dir(mask_dir.as_ref())? {
            let path = entry?.path();
            let matched = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| paired_image_name(n, &mask_suffix).is_some());
            if matched && path.is_file() {
                masks.push(path);
            }
        }
        masks.sort();
        log::info!(
            "Found {} masks under {}",
            masks.len(),
            mask_dir.as_ref().display()
        );
        Ok(Self {
            image_dir: image_dir.into(),
            mask_suffix,
            masks,
            cursor: 0,
        })
    }

    /// 掩码文件总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// 是否没有任何掩码文件.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// 尚未读取的掩码文件数.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.masks.len() - self.cursor
    }

    fn read_case(&self, mask_file: &Path) -> RoiResult<CaseRecord> {
        // `new` 中已经过滤, 文件名必然带有后缀.
        let name = mask_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let (case_id, image_name) =
            paired_image_name(name, &self.mask_suffix).unwrap_or_default();
        let mask = CtMask::open(mask_file)?;

        let image_file = self.image_dir.join(image_name);
        let (image, image_file) = if image_file.is_file() {
            (Some(CtVolume::open(&image_file)?), Some(image_file))
        } else {
            log::warn!("No image for case {case_id} at {}", image_file.display());
            (None, None)
        };
        Ok(CaseRecord::new(case_id, mask, image)?.with_files(mask_file.to_path_buf(), image_file))
    }
}

impl Stage for NiftiSource {
    fn name(&self) -> &str {
        "nifti-source"
    }

    fn process(&mut self, store: &mut ArtifactStore) -> bool {
        store.clear();
        while let Some(mask_file) = self.masks.get(self.cursor) {
            self.cursor += 1;
            match self.read_case(mask_file) {
                Ok(case) => {
                    log::info!(
                        "Case {} ({}/{})",
                        case.case_id(),
                        self.cursor,
                        self.masks.len()
                    );
                    store.case = Some(case);
                    return true;
                }
                Err(e) => log::error!("Skip {}: {e}", mask_file.display()),
            }
        }
        false
    }
}

/// 内存中的病例数据源, 按给定顺序逐个产出.
#[derive(Debug, Default)]
pub struct MemorySource {
    cases: VecDeque<CaseRecord>,
}

impl MemorySource {
    /// 由病例列表构建.
    pub fn new<I: IntoIterator<Item = CaseRecord>>(cases: I) -> Self {
        Self {
            cases: cases.into_iter().collect(),
        }
    }

    /// 尚未产出的病例数.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.cases.len()
    }
}

impl Stage for MemorySource {
    fn name(&self) -> &str {
        "memory-source"
    }

    fn process(&mut self, store: &mut ArtifactStore) -> bool {
        store.clear();
        match self.cases.pop_front() {
            Some(case) => {
                log::info!("Case {}", case.case_id());
                store.case = Some(case);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySource, NiftiSource};
    use crate::consts::MASK_SUFFIX;
    use crate::data::{CaseRecord, CtMask, CtVolume};
    use crate::pipeline::{ArtifactStore, Stage};
    use crate::NiftiHeaderAttr;
    use ndarray::Array3;
    use std::fs;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("roi-berry-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_source_clears_store() {
        let mask = CtMask::from_array(Array3::zeros((2, 2, 2)), [1.0; 3]);
        let mut src = MemorySource::new([
            CaseRecord::new("a", mask.clone(), None).unwrap(),
            CaseRecord::new("b", mask, None).unwrap(),
        ]);
        let mut store = ArtifactStore::new();
        store.boxes.insert("stale".to_owned(), vec![None]);

        assert!(src.process(&mut store));
        assert_eq!(store.case.as_ref().unwrap().case_id(), "a");
        assert!(store.boxes.is_empty());
        assert!(src.process(&mut store));
        assert_eq!(store.case.as_ref().unwrap().case_id(), "b");
        assert!(!src.process(&mut store));
        assert!(store.case.is_none());
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn test_nifti_source_sorted_and_skips_broken() {
        let masks = scratch("src-masks");
        let images = scratch("src-images");

        let mut data = Array3::zeros((3, 3, 3));
        data[(1, 1, 1)] = 1;
        let mask = CtMask::from_array(data, [1.0; 3]);
        mask.save(masks.join("case-b_Mask.nii.gz")).unwrap();
        mask.save(masks.join("case-a_Mask.nii.gz")).unwrap();
        CtVolume::from_array(Array3::zeros((3, 3, 3)), [1.0; 3])
            .save(images.join("case-a.nii.gz"))
            .unwrap();
        fs::write(masks.join("case-0_Mask.nii.gz"), b"not a nifti file").unwrap();
        fs::write(masks.join("notes.txt"), b"ignored").unwrap();

        let mut src = NiftiSource::new(&masks, &images, MASK_SUFFIX).unwrap();
        assert_eq!(src.len(), 3);
        let mut store = ArtifactStore::new();

        // case-0 读取失败, 被跳过.
        assert!(src.process(&mut store));
        let case = store.case.as_ref().unwrap();
        assert_eq!(case.case_id(), "case-a");
        assert_eq!(case.image().unwrap().shape(), [3, 3, 3]);
        assert_eq!(case.mask()[(1, 1, 1)], 1);

        assert!(src.process(&mut store));
        let case = store.case.as_ref().unwrap();
        assert_eq!(case.case_id(), "case-b");
        assert!(case.image().is_none());

        assert!(!src.process(&mut store));
        assert_eq!(src.remaining(), 0);

        fs::remove_dir_all(&masks).unwrap();
        fs::remove_dir_all(&images).unwrap();
    }
}
