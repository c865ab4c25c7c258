//! Application State
//!
//! Shared state for the presentation layer: configuration plus the gateway
//! built from it, and factories for per-session objects.

use std::sync::Arc;
use tokio::sync::RwLock;

use clinical_intake_core::{ApiGateway, HealthStatus};
use clinical_intake_gateway::RestGateway;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::{ConsultationWorkflow, ConversationSession, FileSystemSink};
use crate::storage::ConfigService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::default_download_dir;

/// Application state shared across views
pub struct AppState {
    /// Configuration service for app settings
    config: Arc<RwLock<Option<ConfigService>>>,
    /// Gateway built from the current configuration
    gateway: Arc<RwLock<Option<Arc<dyn ApiGateway>>>>,
    /// Whether the state has been initialized
    initialized: Arc<RwLock<bool>>,
}

impl AppState {
    /// Create a new uninitialized app state
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(None)),
            gateway: Arc::new(RwLock::new(None)),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Load ~/.clinical-intake/config.json, apply env overrides and build
    /// the REST gateway
    pub async fn initialize(&self) -> AppResult<()> {
        if *self.initialized.read().await {
            return Ok(());
        }
        let mut config = ConfigService::new()?;
        config.apply_env_overrides()?;
        self.initialize_with(config).await
    }

    /// Initialize from an already loaded config service
    pub async fn initialize_with(&self, config: ConfigService) -> AppResult<()> {
        let gateway: Arc<dyn ApiGateway> = Arc::new(build_gateway(config.get_config())?);
        self.install(config, gateway).await
    }

    /// Initialize with an explicit gateway instead of one built from config
    pub async fn initialize_with_gateway(
        &self,
        config: ConfigService,
        gateway: Arc<dyn ApiGateway>,
    ) -> AppResult<()> {
        self.install(config, gateway).await
    }

    async fn install(&self, config: ConfigService, gateway: Arc<dyn ApiGateway>) -> AppResult<()> {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return Ok(());
        }

        tracing::info!(
            "[AppState] Using backend at {}",
            gateway.base_url()
        );
        *self.config.write().await = Some(config);
        *self.gateway.write().await = Some(gateway);

        *initialized = true;
        Ok(())
    }

    /// Check if config is healthy
    pub fn is_config_healthy(&self) -> bool {
        if let Ok(guard) = self.config.try_read() {
            if let Some(ref config) = *guard {
                return config.is_healthy();
            }
        }
        false
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> AppResult<AppConfig> {
        let guard = self.config.read().await;
        match &*guard {
            Some(config) => Ok(config.get_config_clone()),
            None => Err(AppError::config("Config service not initialized")),
        }
    }

    /// Update the configuration and rebuild the gateway.
    ///
    /// Sessions created earlier keep the gateway they were created with.
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let mut guard = self.config.write().await;
        let service = guard
            .as_mut()
            .ok_or_else(|| AppError::config("Config service not initialized"))?;

        let mut candidate = service.get_config_clone();
        candidate.apply_update(update.clone());
        candidate.validate().map_err(AppError::validation)?;
        let gateway: Arc<dyn ApiGateway> = Arc::new(build_gateway(&candidate)?);

        let updated = service.update_config(update)?;
        *self.gateway.write().await = Some(gateway);
        tracing::info!("[AppState] Settings updated, backend at {}", updated.api_base_url);
        Ok(updated)
    }

    /// The current gateway
    pub async fn gateway(&self) -> AppResult<Arc<dyn ApiGateway>> {
        let guard = self.gateway.read().await;
        guard
            .clone()
            .ok_or_else(|| AppError::config("Gateway not initialized"))
    }

    /// Probe the backend's health endpoint
    pub async fn check_backend(&self) -> AppResult<HealthStatus> {
        let gateway = self.gateway().await?;
        Ok(gateway.health().await?)
    }

    /// A fresh intake workflow using the configured default role
    pub async fn new_workflow(&self) -> AppResult<ConsultationWorkflow> {
        let role = self.get_config().await?.default_role;
        Ok(ConsultationWorkflow::new(self.gateway().await?, role))
    }

    /// A fresh assistant conversation
    pub async fn new_conversation(&self) -> AppResult<ConversationSession> {
        Ok(ConversationSession::new(self.gateway().await?))
    }

    /// Sink writing reports to the configured download directory
    pub async fn report_sink(&self) -> AppResult<FileSystemSink> {
        let dir = match self.get_config().await?.download_dir {
            Some(dir) => dir,
            None => default_download_dir()?,
        };
        Ok(FileSystemSink::new(dir))
    }
}

fn build_gateway(config: &AppConfig) -> AppResult<RestGateway> {
    Ok(RestGateway::new(&config.transport_settings())?)
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("initialized", &self.initialized)
            .finish()
    }
}
