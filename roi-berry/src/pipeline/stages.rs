use std::fs;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{ArtifactStore, Stage, MINIMAL_BOXES};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rand::Rng;
        use crate::expand::par_expand_all;
    }
}

use crate::data::roi_file_names;
use crate::expand::{ExpansionEngine, ExpansionPolicy};
use crate::grid::StructuringElement;
use crate::{Label, RoiResult};

/// 对当前病例的掩码做连通区域标记: `store.case` -> `store.labeled`.
#[derive(Debug, Default)]
pub struct LabelStage {
    se: StructuringElement,
}

impl LabelStage {
    /// 以结构元 `se` 标记.
    #[inline]
    pub fn new(se: StructuringElement) -> Self {
        Self { se }
    }
}

impl Stage for LabelStage {
    fn name(&self) -> &str {
        "label"
    }

    fn process(&mut self, store: &mut ArtifactStore) -> bool {
        store.labeled = None;
        let Some(case) = store.case.as_ref() else {
            log::warn!("Labeling skipped: no case in store");
            return false;
        };
        let grid = case.mask().label(&self.se);
        log::info!("Case {}: {} regions", case.case_id(), grid.components());
        store.labeled = Some(grid);
        true
    }
}

/// 计算每个区域的最小包围盒: `store.labeled` -> `store.boxes[key]`.
#[derive(Debug)]
pub struct BoundingBoxStage {
    key: String,
}

impl Default for BoundingBoxStage {
    fn default() -> Self {
        Self::new(MINIMAL_BOXES)
    }
}

impl BoundingBoxStage {
    /// 结果写入 `store.boxes[key]`.
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Stage for BoundingBoxStage {
    fn name(&self) -> &str {
        "bounding-box"
    }

    fn process(&mut self, store: &mut ArtifactStore) -> bool {
        store.boxes.remove(&self.key);
        let Some(grid) = store.labeled.as_ref() else {
            log::warn!("Bounding boxes skipped: no labeled grid in store");
            return false;
        };
        let boxes = grid.minimal_boxes();
        assert_eq!(
            boxes.len(),
            grid.components() as usize + 1,
            "包围盒个数与区域个数不一致"
        );
        for (label, b) in boxes.iter().enumerate().skip(1) {
            if let Some(b) = b {
                log::debug!("Region {label}: minimal box {b}");
            }
        }
        store.boxes.insert(self.key.clone(), boxes);
        true
    }
}

/// 扩展包围盒: `store.boxes[input]` -> `store.boxes[output]`.
#[derive(Debug)]
pub struct ExpandStage {
    name: String,
    input: String,
    output: String,
    engine: ExpansionEngine,
    rng: StdRng,
}

impl ExpandStage {
    /// 以 `policy` 扩展 `input` 中的包围盒, 结果写入 `output`.
    ///
    /// 给出 `seed` 时结果可复现, 否则使用系统熵源.
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        policy: ExpansionPolicy,
        seed: Option<u64>,
    ) -> Self {
        let output = output.into();
        Self {
            name: format!("expand:{output}"),
            input: input.into(),
            output,
            engine: ExpansionEngine::new(policy),
            rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
        }
    }

    /// 输出键.
    #[inline]
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl Stage for ExpandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&mut self, store: &mut ArtifactStore) -> bool {
        store.boxes.remove(&self.output);
        let (Some(grid), Some(boxes)) = (store.labeled.as_ref(), store.boxes.get(&self.input))
        else {
            log::warn!("{}: missing labeled grid or boxes `{}`", self.name, self.input);
            return false;
        };

        #[cfg(feature = "rayon")]
        let grown = par_expand_all(&self.engine, grid, boxes, self.rng.gen());
        #[cfg(not(feature = "rayon"))]
        let grown = self.engine.expand_all(grid, boxes, &mut self.rng);

        log::info!(
            "{}: {} regions expanded with {}",
            self.name,
            grown.iter().flatten().count(),
            self.engine.policy().name()
        );
        store.boxes.insert(self.output.clone(), grown);
        true
    }
}

/// 按包围盒裁剪扫描与掩码并写盘.
///
/// 扫描写入 `{dst_image}/{case_id}_{label}.nii.gz`,
/// 掩码写入 `{dst_mask}/{case_id}_{label}{mask_suffix}`.
/// 病例没有配对扫描时只写掩码.
#[derive(Debug)]
pub struct SaveRoiStage {
    input: String,
    dst_image: PathBuf,
    dst_mask: PathBuf,
    mask_suffix: String,
    written: usize,
}

impl SaveRoiStage {
    /// 保存 `store.boxes[input]` 中的每个包围盒.
    pub fn new(
        input: impl Into<String>,
        dst_image: impl Into<PathBuf>,
        dst_mask: impl Into<PathBuf>,
        mask_suffix: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            dst_image: dst_image.into(),
            dst_mask: dst_mask.into(),
            mask_suffix: mask_suffix.into(),
            written: 0,
        }
    }

    /// 已写出的 ROI 个数.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    fn save_all(&self, store: &ArtifactStore) -> RoiResult<Option<usize>> {
        let (Some(case), Some(boxes)) = (store.case.as_ref(), store.boxes.get(&self.input)) else {
            return Ok(None);
        };
        fs::create_dir_all(&self.dst_mask)?;
        if case.image().is_some() {
            fs::create_dir_all(&self.dst_image)?;
        }

        let mut count = 0;
        for (label, b) in boxes.iter().enumerate() {
            let Some(b) = b else { continue };
            let (image_name, mask_name) =
                roi_file_names(case.case_id(), label as Label, &self.mask_suffix);
            case.mask().crop(b).save(self.dst_mask.join(mask_name))?;
            if let Some(image) = case.image() {
                image.crop(b).save(self.dst_image.join(image_name))?;
            }
            count += 1;
        }
        Ok(Some(count))
    }
}

impl Stage for SaveRoiStage {
    fn name(&self) -> &str {
        "save-roi"
    }

    fn process(&mut self, store: &mut ArtifactStore) -> bool {
        match self.save_all(store) {
            Ok(Some(n)) => {
                self.written += n;
                log::info!("Saved {n} ROIs");
                true
            }
            Ok(None) => {
                log::warn!("Saving skipped: missing case or boxes `{}`", self.input);
                false
            }
            Err(e) => {
                log::error!("Saving ROIs failed: {e}");
                false
            }
        }
    }
}
