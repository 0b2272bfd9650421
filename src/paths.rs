//! Path resolution for shellres
//!
//! # Environment Variables
//!
//! - `SHELLRES_CONFIG` - Path of the configuration file
//! - `SHELLRES_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_file():
//! 1. `--config` flag
//! 2. `SHELLRES_CONFIG` environment variable
//! 3. `./shellres.toml` if it exists
//! 4. `<config dir>/shellres/shellres.toml`:
//!    - `XDG_CONFIG_HOME/shellres` (if set)
//!    - Windows: `%APPDATA%\shellres`
//!    - macOS/Linux: `~/.config/shellres`
//!
//! For state_dir():
//! 1. `SHELLRES_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/shellres` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\shellres`
//!    - macOS/Linux: `~/.local/state/shellres`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the config file location
pub const ENV_CONFIG: &str = "SHELLRES_CONFIG";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "SHELLRES_STATE_DIR";

/// Default config file name
pub const CONFIG_FILE: &str = "shellres.toml";

/// State file name inside the state directory
pub const STATE_FILE: &str = "state.toml";

/// Locate the configuration file
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    resolve_config_file(explicit, std::env::var(ENV_CONFIG).ok(), &cwd)
}

fn resolve_config_file(
    explicit: Option<&Path>,
    env_value: Option<String>,
    cwd: &Path,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand(&path.to_string_lossy()));
    }

    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        let path = expand(&value);
        log::debug!("Using config file from {}: {}", ENV_CONFIG, path.display());
        return Ok(path);
    }

    let local = cwd.join(CONFIG_FILE);
    if local.exists() {
        log::debug!("Using config file in current directory: {}", local.display());
        return Ok(local);
    }

    let path = config_dir()?.join(CONFIG_FILE);
    log::debug!("Using default config file: {}", path.display());
    Ok(path)
}

/// Get the shellres config directory path
fn config_dir() -> Result<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("shellres"));
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("shellres"));
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("shellres"))
}

/// Get the shellres state directory path
///
/// Priority:
/// 1. `SHELLRES_STATE_DIR` env var
/// 2. `XDG_STATE_HOME/shellres`
/// 3. Platform default
pub fn state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_STATE_DIR) {
        let path = expand(&dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        let path = PathBuf::from(xdg_state).join("shellres");
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            let path = local_app_data.join("shellres");
            log::debug!("Using Windows state dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join("shellres");
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// Locate the state file
pub fn state_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(state_dir()?.join(STATE_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
