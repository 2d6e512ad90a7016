//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the application
//! configuration from `config.toml` (e.g. `~/.config/parley/config.toml`).

use crate::paths::ParleyPaths;
use crate::storage::AtomicFile;
use parley_core::config::AppConfig;
use parley_core::error::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the application configuration.
///
/// The file is created with default values on first load.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service for the platform config file.
    pub fn new(paths: &ParleyPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    /// Creates a service for an explicit config file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing file is created with defaults. An unreadable file falls back
    /// to defaults without being overwritten.
    pub fn get_config(&self) -> AppConfig {
        if let Ok(read_lock) = self.config.read() {
            if let Some(cached) = read_lock.as_ref() {
                return cached.clone();
            }
        }

        let loaded = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "[ConfigService] Failed to load {}: {}. Using defaults",
                    self.path.display(),
                    e
                );
                AppConfig::default()
            }
        };

        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    fn load_config(&self) -> Result<AppConfig> {
        let file = AtomicFile::<AppConfig>::toml(self.path.clone());
        Ok(file.load_or_create(AppConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(&ParleyPaths::new(Some(temp_dir.path().into()))).unwrap();

        let config = service.get_config();

        assert_eq!(config, AppConfig::default());
        assert!(service.path().exists());
    }

    #[test]
    fn test_reads_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\nname = \"custom\"\n").unwrap();

        let config = ConfigService::with_path(path).get_config();
        assert_eq!(config.storage.name, "custom");
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults_and_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[storage\n").unwrap();

        let config = ConfigService::with_path(path.clone()).get_config();
        assert_eq!(config, AppConfig::default());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[storage\n");
    }

    #[test]
    fn test_cache_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::with_path(path.clone());
        assert_eq!(service.get_config().logging.filter, "info");

        std::fs::write(&path, "[logging]\nfilter = \"debug\"\n").unwrap();
        assert_eq!(service.get_config().logging.filter, "info");

        service.invalidate_cache();
        assert_eq!(service.get_config().logging.filter, "debug");
    }
}
