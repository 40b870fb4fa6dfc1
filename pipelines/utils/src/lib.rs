//! ROI 提取流水线依赖的通用组件: 配置与加载.

pub mod config;
pub mod loader;

pub use config::{ConfigError, ExpansionConfig, PipelineConfig};

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}
