//! Cross-Platform Path Utilities
//!
//! Resolves the application directory (~/.clinical-intake/) and the
//! default report download location.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.clinical-intake/)
pub fn app_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".clinical-intake"))
}

/// Get the config file path (~/.clinical-intake/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("config.json"))
}

/// Default directory for delivered reports.
///
/// The platform download directory when one exists, else
/// `~/.clinical-intake/reports/`.
pub fn default_download_dir() -> AppResult<PathBuf> {
    match dirs::download_dir() {
        Some(dir) => Ok(dir),
        None => Ok(app_dir()?.join("reports")),
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the application directory, creating if it doesn't exist
pub fn ensure_app_dir() -> AppResult<PathBuf> {
    let path = app_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
