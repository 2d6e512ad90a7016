//! Composition root.
//!
//! Loads configuration, installs logging and wires the file repository and
//! HTTP assistant API into a restored [`AppStore`].

use crate::store::AppStore;
use anyhow::{Context, Result};
use parley_core::config::AppConfig;
use parley_infrastructure::logging::{self, WorkerGuard};
use parley_infrastructure::{ConfigService, FileStateRepository, ParleyPaths};
use parley_interaction::HttpAssistantApi;
use std::sync::Arc;

/// Everything the host keeps alive after startup.
pub struct AppBootstrap {
    pub store: AppStore,
    pub config: AppConfig,
    /// Flushes the log file on drop. `None` when file logging is off.
    pub log_guard: Option<WorkerGuard>,
}

/// Builds the store from config under `paths`.
pub async fn bootstrap(paths: ParleyPaths) -> Result<AppBootstrap> {
    let config_service = ConfigService::new(&paths).context("Failed to resolve config path")?;
    let config = config_service.get_config();

    // A subscriber may already be installed by the host.
    let log_guard = match logging::init(&config.logging, &paths) {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!("[Bootstrap] Logging not initialized: {}", e);
            None
        }
    };
    tracing::info!(
        "[Bootstrap] Using config file {}",
        config_service.path().display()
    );

    let repository = FileStateRepository::from_config(&paths, &config.storage)
        .context("Failed to resolve storage file")?;
    tracing::info!("[Bootstrap] State file: {}", repository.path().display());

    let api = HttpAssistantApi::from_config(&config.api)
        .context("Failed to create assistant API client")?;
    tracing::info!("[Bootstrap] Assistant API at {}", config.api.base_url);

    let store = AppStore::restore(Arc::new(api), Arc::new(repository)).await;

    Ok(AppBootstrap {
        store,
        config,
        log_guard,
    })
}
