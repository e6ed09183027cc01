//! Centralized path resolution for catalog-sync
//!
//! # Environment Variables
//!
//! - `CATALOG_SYNC_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/catalog-sync`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CATALOG_SYNC_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/catalog-sync` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\catalog-sync`
//!    - macOS/Linux: `~/.config/catalog-sync`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CATALOG_SYNC_CONFIG_DIR";

/// Directory name under the platform config root
const APP_DIR: &str = "catalog-sync";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the catalog-sync config directory path
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(|key| std::env::var(key).ok())
}

/// Get the path of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Resolve the config directory with an injectable environment lookup
fn resolve_config_dir(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    // 1. Check environment variable override
    if let Some(dir) = env(ENV_CONFIG_DIR).filter(|d| !d.is_empty()) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    // 2. Check XDG_CONFIG_HOME
    if let Some(xdg_config) = env("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        let path = PathBuf::from(xdg_config).join(APP_DIR);
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. Platform default
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join(APP_DIR);
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
///
/// All modules should use this instead of calling shellexpand directly.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
