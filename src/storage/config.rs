//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file, plus
//! environment overrides applied on top of it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_app_dir, ensure_dir};

/// Overrides `api_base_url`
pub const ENV_API_URL: &str = "CLINICAL_INTAKE_API_URL";

/// Overrides `request_timeout_secs`
pub const ENV_TIMEOUT_SECS: &str = "CLINICAL_INTAKE_TIMEOUT_SECS";

/// Configuration service for app settings
///
/// `config` is the file-backed `persisted` config with the environment
/// `overrides` applied on top. Only `persisted` is ever written.
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    persisted: AppConfig,
    overrides: SettingsUpdate,
    config: AppConfig,
}

impl ConfigService {
    /// Load ~/.clinical-intake/config.json, creating it with defaults on first run
    pub fn new() -> AppResult<Self> {
        ensure_app_dir()?;
        Self::open(config_path()?)
    }

    /// Load configuration from an explicit path, creating it if missing
    pub fn open(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            if let Some(parent) = config_path.parent() {
                ensure_dir(parent)?;
            }
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            tracing::info!(
                "[ConfigService] Wrote default config to {}",
                config_path.display()
            );
            default_config
        };

        Ok(Self {
            config_path,
            persisted: config.clone(),
            overrides: SettingsUpdate::default(),
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Overrides live in memory only and are never written to disk.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut update = self.overrides.clone();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            update.api_base_url = Some(url.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                AppError::config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
            update.request_timeout_secs = Some(secs);
        }

        let candidate = Self::with_overrides(&self.persisted, &update);
        candidate.validate().map_err(AppError::config)?;

        if candidate != self.config {
            tracing::info!("[ConfigService] Applied environment overrides");
        }
        self.overrides = update;
        self.config = candidate;
        Ok(())
    }

    fn with_overrides(persisted: &AppConfig, overrides: &SettingsUpdate) -> AppConfig {
        let mut config = persisted.clone();
        config.apply_update(overrides.clone());
        config
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a clone of the current configuration
    pub fn get_config_clone(&self) -> AppConfig {
        self.config.clone()
    }

    /// Update the configuration with a partial update
    ///
    /// The update is saved on top of the file-backed config. A field set
    /// explicitly here drops its environment override.
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut overrides = self.overrides.clone();
        if update.api_base_url.is_some() {
            overrides.api_base_url = None;
        }
        if update.request_timeout_secs.is_some() {
            overrides.request_timeout_secs = None;
        }

        let mut persisted = self.persisted.clone();
        persisted.apply_update(update);
        let config = Self::with_overrides(&persisted, &overrides);
        config.validate().map_err(AppError::validation)?;
        Self::save_to_file(&self.config_path, &persisted)?;

        self.persisted = persisted;
        self.overrides = overrides;
        self.config = config;
        Ok(self.config.clone())
    }

    /// Save the file-backed configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.persisted)
    }

    /// Reload configuration from disk, keeping environment overrides
    pub fn reload(&mut self) -> AppResult<()> {
        self.persisted = Self::load_from_file(&self.config_path)?;
        self.config = Self::with_overrides(&self.persisted, &self.overrides);
        Ok(())
    }

    /// Reset the file-backed configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.persisted = AppConfig::default();
        self.save()?;
        self.config = Self::with_overrides(&self.persisted, &self.overrides);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.exists() && self.config.validate().is_ok()
    }
}
