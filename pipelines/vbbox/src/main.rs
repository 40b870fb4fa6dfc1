//! 从 nifti 分割掩码中为每个结节提取 (扩展后的) 包围盒, 并裁剪保存 ROI.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use log::LevelFilter;
use simple_logger::SimpleLogger;

mod runner;

/// 结节级 ROI 提取.
#[derive(Debug, Parser)]
#[command(name = "vbbox", version)]
struct Cli {
    /// 配置文件路径. 缺省时依次尝试 `$ROI_BERRY_CONFIG` 与 `$HOME/dataset/roi-berry.toml`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 输出更多日志. 可重复, 例如 `-vv`.
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// 只输出警告与错误.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new().with_level(cli.level()).init()?;

    let (path, config) = utils::loader::load_config(cli.config).context("loading config")?;
    log::info!("Using config {}", path.display());

    let summary = runner::run(&config)?;
    utils::sep();
    print!("{summary}");
    utils::sep();
    Ok(())
}
