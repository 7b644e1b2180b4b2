pub mod error;
pub mod plan;
pub mod templates;

pub use error::*;
pub use plan::{load_plan, parse_plan};
pub use templates::FileTemplateSource;

use std::path::{Path, PathBuf};

/// Environment variable naming the config file directly
pub const CONFIG_ENV: &str = "ORGFLOW_CONFIG";

const CONFIG_FILE: &str = "accounts.yaml";

/// OrgFlow's per-user config directory (`~/.config/orgflow`)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("orgflow"))
}

/// Locate the accounts file
///
/// Search order:
/// 1. `explicit` (from `--config`); it must exist
/// 2. the `ORGFLOW_CONFIG` environment variable
/// 3. `./configs/accounts.yaml`
/// 4. `./accounts.yaml`
/// 5. `~/.config/orgflow/accounts.yaml`
pub fn find_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ConfigError::MissingFile(path.to_path_buf()))
        };
    }

    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at {}, which does not exist", CONFIG_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;
    for candidate in [
        current_dir.join("configs").join(CONFIG_FILE),
        current_dir.join(CONFIG_FILE),
    ] {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("orgflow").join(CONFIG_FILE);
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Directory that holds `configs/` and `templates/` for a config file
///
/// `project/configs/accounts.yaml` resolves to `project`; any other layout
/// resolves to the file's own directory.
pub fn project_root(config_path: &Path) -> PathBuf {
    let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    match dir.file_name() {
        Some(name) if name == "configs" => dir.parent().unwrap_or(dir).to_path_buf(),
        _ => dir.to_path_buf(),
    }
}
