//! Settings Models
//!
//! Application configuration and settings data structures.

use std::path::PathBuf;

use clinical_intake_core::transport::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use clinical_intake_core::{ConsultationRole, ProxyConfig, TransportSettings, DEFAULT_API_BASE_URL};
use serde::{Deserialize, Serialize};

/// Upper bound for either timeout setting.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend base URL, e.g. "http://127.0.0.1:8000"
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Whole-request timeout in seconds (0 disables)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// TCP connect timeout in seconds (0 disables)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Outbound proxy; `None` connects directly
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    /// Where delivered reports are written; platform download dir when unset
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Role attached to analysis requests
    #[serde(default)]
    pub default_role: ConsultationRole,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            proxy: None,
            download_dir: None,
            default_role: ConsultationRole::Patient,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub proxy: Option<ProxyConfig>,
    /// Remove the configured proxy
    #[serde(default)]
    pub clear_proxy: bool,
    pub download_dir: Option<PathBuf>,
    pub default_role: Option<ConsultationRole>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = url;
        }
        if let Some(secs) = update.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = update.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if update.clear_proxy {
            self.proxy = None;
        } else if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
        if let Some(dir) = update.download_dir {
            self.download_dir = Some(dir);
        }
        if let Some(role) = update.default_role {
            self.default_role = role;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = self.api_base_url.trim();
        let rest = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .ok_or_else(|| {
                format!(
                    "Invalid api_base_url: {}. Must start with http:// or https://",
                    self.api_base_url
                )
            })?;
        if rest.trim_matches('/').is_empty() {
            return Err(format!("Invalid api_base_url: {}. Missing host", self.api_base_url));
        }

        if self.request_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(format!(
                "request_timeout_secs cannot exceed {}",
                MAX_TIMEOUT_SECS
            ));
        }
        if self.connect_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(format!(
                "connect_timeout_secs cannot exceed {}",
                MAX_TIMEOUT_SECS
            ));
        }

        if let Some(proxy) = &self.proxy {
            if proxy.host.trim().is_empty() {
                return Err("Proxy host cannot be empty".to_string());
            }
            if proxy.port == 0 {
                return Err("Proxy port must be non-zero".to_string());
            }
        }

        Ok(())
    }

    /// Gateway transport settings derived from this configuration.
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings::new(self.api_base_url.trim())
            .with_request_timeout_secs(self.request_timeout_secs)
            .with_connect_timeout_secs(self.connect_timeout_secs)
            .with_proxy(self.proxy.clone())
    }
}
