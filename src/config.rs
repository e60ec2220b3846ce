//! Assets directory resolution
//!
//! Priority order: command-line argument (which also absorbs the
//! `COURSEGRAPH_ASSETS_DIR` environment variable via clap), TOML config
//! file, compiled default.

use std::path::PathBuf;

/// Default assets directory relative to the working directory
pub const DEFAULT_ASSETS_DIR: &str = "public";

/// Resolve the directory holding static assets and the snapshot.
pub fn resolve_assets_dir(cli_arg: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path;
    }
    if let Some(path) = assets_dir_from_config_file() {
        return path;
    }
    PathBuf::from(DEFAULT_ASSETS_DIR)
}

/// Probe `<config dir>/coursegraph/config.toml` for an `assets_dir` key.
fn assets_dir_from_config_file() -> Option<PathBuf> {
    let config_path = dirs::config_dir()?.join("coursegraph").join("config.toml");
    let contents = std::fs::read_to_string(config_path).ok()?;
    let config: toml::Value = toml::from_str(&contents).ok()?;
    config
        .get("assets_dir")
        .and_then(|value| value.as_str())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_argument_wins() {
        let resolved = resolve_assets_dir(Some(PathBuf::from("/srv/coursegraph")));
        assert_eq!(resolved, PathBuf::from("/srv/coursegraph"));
    }

    #[test]
    fn test_default_is_public() {
        // No CLI argument and (in CI) no config file: fall back to the
        // compiled default.
        if dirs::config_dir()
            .map(|d| d.join("coursegraph").join("config.toml").exists())
            .unwrap_or(false)
        {
            return;
        }
        assert_eq!(resolve_assets_dir(None), PathBuf::from(DEFAULT_ASSETS_DIR));
    }
}
