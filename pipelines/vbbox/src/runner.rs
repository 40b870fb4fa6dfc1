//! 按配置组装并运行流水线.

use anyhow::Context;
use roi_berry::pipeline::{
    BoundingBoxStage, ExpandStage, LabelStage, NiftiSource, RunSummary, SaveRoiStage, StageRunner,
    MINIMAL_BOXES,
};
use utils::PipelineConfig;

/// 组装流水线:
/// `NiftiSource -> LabelStage -> BoundingBoxStage -> ExpandStage* -> SaveRoiStage`.
///
/// 扩展阶段依次串联; 保存阶段读取最后一个扩展阶段的输出,
/// 没有扩展阶段时直接保存最小包围盒.
pub fn build(config: &PipelineConfig) -> anyhow::Result<StageRunner> {
    let source = NiftiSource::new(
        &config.src_mask_path,
        &config.src_image_path,
        &config.mask_suffix,
    )
    .with_context(|| format!("listing masks in {}", config.src_mask_path.display()))?;

    let mut runner = StageRunner::new()
        .show_stage_time(config.show_stage_time)
        .stage(source)
        .stage(LabelStage::new(config.structuring_element()?))
        .stage(BoundingBoxStage::new(MINIMAL_BOXES));

    let mut input = MINIMAL_BOXES.to_owned();
    for (i, policy) in config.policies()?.into_iter().enumerate() {
        let output = config.expansion_key(i);
        // 各扩展阶段使用不同的随机流.
        let seed = config.seed.map(|s| s.wrapping_add(i as u64));
        log::info!("Expansion stage {output}: {input} -> {output}");
        runner.push(ExpandStage::new(input, output.clone(), policy, seed));
        input = output;
    }

    runner.push(SaveRoiStage::new(
        input,
        &config.dst_image_path,
        &config.dst_mask_path,
        &config.mask_suffix,
    ));
    Ok(runner)
}

/// 运行全部病例.
pub fn run(config: &PipelineConfig) -> anyhow::Result<RunSummary> {
    let mut runner = build(config)?;
    Ok(runner.run_to_completion())
}

#[cfg(test)]
mod tests {
    use super::{build, run};
    use ndarray::Array3;
    use roi_berry::{CtMask, NiftiHeaderAttr};
    use std::fs;
    use utils::PipelineConfig;

    fn config_for(root: &std::path::Path, expansion: &str) -> PipelineConfig {
        let text = format!(
            r#"
src_image_path = "{0}/in/image"
src_mask_path = "{0}/in/mask"
dst_image_path = "{0}/out/image"
dst_mask_path = "{0}/out/mask"
seed = 11
show_stage_time = false
{expansion}
"#,
            root.display()
        );
        PipelineConfig::from_toml_str(&text).unwrap()
    }

    #[test]
    fn test_missing_source_dir() {
        let root = std::env::temp_dir().join(format!("vbbox-missing-{}", std::process::id()));
        assert!(build(&config_for(&root, "")).is_err());
    }

    #[test]
    fn test_run_writes_rois() {
        let root = std::env::temp_dir().join(format!("vbbox-run-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("in/mask")).unwrap();
        fs::create_dir_all(root.join("in/image")).unwrap();

        let mut data = Array3::zeros((8, 8, 8));
        data[(3, 3, 3)] = 1;
        data[(3, 3, 4)] = 1;
        CtMask::from_array(data, [1.0; 3])
            .save(root.join("in/mask/p1_GT1_Mask.nii.gz"))
            .unwrap();

        let config = config_for(
            &root,
            r#"
[[expansion]]
strategy = "uniform"
step = 1
limit = 1

[[expansion]]
strategy = "physician-delta"
expand_x = [1, 0]
expand_y = [0, 0]
expand_z = [0, 0]
"#,
        );
        let runner = build(&config).unwrap();
        assert_eq!(runner.len(), 6);

        let summary = run(&config).unwrap();
        assert_eq!(summary.passes, 1);
        assert_eq!(summary.completed, 1);

        // 最小包围盒 1 x 1 x 2, 均匀扩展一步后 3 x 3 x 4, 再向 x- 扩展一步.
        let roi = CtMask::open(root.join("out/mask/p1_GT1_1_Mask.nii.gz")).unwrap();
        assert_eq!(roi.shape(), [4, 3, 4]);
        assert_eq!(roi.foreground(), 2);

        fs::remove_dir_all(&root).unwrap();
    }
}
