//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Label};

pub use crate::{paired_image_name, CaseRecord, CtMask, CtVolume, NiftiHeaderAttr};
pub use crate::{RoiError, RoiResult};

pub use crate::grid::{
    label_components, Axis, BoundingBox, BoxList, Direction, LabelGrid, StructuringElement,
};

pub use crate::expand::{
    Amount, AnyDirection, BackgroundPercentage, ExpansionEngine, ExpansionPolicy, PhysicianDelta,
    Uniform,
};

#[cfg(feature = "rayon")]
pub use crate::expand::par_expand_all;

pub use crate::pipeline::{
    ArtifactStore, BoundingBoxStage, ExpandStage, LabelStage, MemorySource, NiftiSource,
    PassOutcome, RunSummary, SaveRoiStage, Stage, StageRunner, MINIMAL_BOXES,
};

pub use crate::consts::{BACKGROUND, MASK_SUFFIX};
