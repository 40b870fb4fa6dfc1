//! 配置文件定位与加载.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, PipelineConfig};

/// 指定配置文件路径的环境变量.
pub const CONFIG_ENV: &str = "ROI_BERRY_CONFIG";

/// 获取 `$HOME/dataset/` 下的子路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 按优先级选择配置文件路径.
fn resolve(cli: Option<PathBuf>, from_env: Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
    cli.or_else(|| from_env.filter(|s| !s.is_empty()).map(PathBuf::from))
        .or(home)
}

/// 获取配置文件路径.
///
/// 1. 若给出了 `cli`, 则返回之;
/// 2. 若环境变量 `$ROI_BERRY_CONFIG` 非空, 则返回其值;
/// 3. 否则, 返回 `$HOME/dataset/roi-berry.toml`. 无法定位家目录时返回 `None`.
pub fn config_path(cli: Option<PathBuf>) -> Option<PathBuf> {
    resolve(
        cli,
        env::var(CONFIG_ENV).ok(),
        home_dataset_dir_with(["roi-berry.toml"]),
    )
}

/// 定位并加载配置.
pub fn load_config(cli: Option<PathBuf>) -> Result<(PathBuf, PipelineConfig), ConfigError> {
    let path = config_path(cli).ok_or(ConfigError::NotFound)?;
    let config = PipelineConfig::load(&path)?;
    Ok((path, config))
}

#[cfg(test)]
mod tests {
    use super::resolve;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_priority() {
        let home = Some(PathBuf::from("/home/u/dataset/roi-berry.toml"));
        assert_eq!(
            resolve(Some("a.toml".into()), Some("b.toml".into()), home.clone()),
            Some(PathBuf::from("a.toml"))
        );
        assert_eq!(
            resolve(None, Some("b.toml".into()), home.clone()),
            Some(PathBuf::from("b.toml"))
        );
        assert_eq!(resolve(None, Some(String::new()), home.clone()), home);
        assert_eq!(resolve(None, None, None), None);
    }

    #[test]
    fn test_home_dataset_dir() {
        if let Some(p) = super::home_dataset_dir_with(["x", "y.toml"]) {
            assert!(p.ends_with("dataset/x/y.toml"));
        }
    }
}
