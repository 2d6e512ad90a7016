//! Unified path management for parley configuration and state files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/parley/            # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//!     └── parley.log.YYYY-MM-DD
//!
//! ~/.local/share/parley/       # Data directory
//! └── parley-storage.json      # Persisted store blob (named after the storage key)
//! ```

use std::path::PathBuf;

const APP_DIR_NAME: &str = "parley";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for parley_core::ParleyError {
    fn from(e: PathError) -> Self {
        parley_core::ParleyError::config(e.to_string())
    }
}

/// Resolves platform directories, optionally re-rooted under a base directory.
///
/// A base directory replaces both the config and data roots; tests use it to
/// stay inside a temp dir.
#[derive(Debug, Clone, Default)]
pub struct ParleyPaths {
    base_dir: Option<PathBuf>,
}

impl ParleyPaths {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    /// Returns the parley configuration directory (e.g. `~/.config/parley/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base_dir {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the parley data directory (e.g. `~/.local/share/parley/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base_dir {
            return Ok(base.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }

    /// Returns the blob file for `storage_name`, inside `directory` when given.
    pub fn storage_file(
        &self,
        storage_name: &str,
        directory: Option<&PathBuf>,
    ) -> Result<PathBuf, PathError> {
        let dir = match directory {
            Some(dir) => dir.clone(),
            None => self.data_dir()?,
        };
        Ok(dir.join(format!("{storage_name}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_config_dir() {
        let paths = ParleyPaths::new(Some(PathBuf::from("/tmp/parley-test")));
        let config_file = paths.config_file().unwrap();
        assert_eq!(config_file, PathBuf::from("/tmp/parley-test/config.toml"));
    }

    #[test]
    fn test_logs_dir() {
        let paths = ParleyPaths::new(Some(PathBuf::from("/tmp/parley-test")));
        assert!(paths.logs_dir().unwrap().ends_with("logs"));
    }

    #[test]
    fn test_storage_file_uses_storage_name() {
        let paths = ParleyPaths::new(Some(PathBuf::from("/tmp/parley-test")));
        let file = paths.storage_file("parley-storage", None).unwrap();
        assert_eq!(file, PathBuf::from("/tmp/parley-test/parley-storage.json"));
    }

    #[test]
    fn test_storage_file_directory_override() {
        let paths = ParleyPaths::new(Some(PathBuf::from("/tmp/parley-test")));
        let custom = PathBuf::from("/srv/state");
        let file = paths.storage_file("blob", Some(&custom)).unwrap();
        assert_eq!(file, PathBuf::from("/srv/state/blob.json"));
    }

    #[test]
    fn test_platform_config_dir_ends_with_app_name() {
        if let Ok(dir) = ParleyPaths::default().config_dir() {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }
}
