//! State repository implementations.
//!
//! [`FileStateRepository`] keeps the persisted store blob in a single JSON
//! document named after the storage key. [`InMemoryStateRepository`] keeps it
//! in memory for tests and throwaway runs.

use crate::paths::ParleyPaths;
use crate::storage::AtomicFile;
use async_trait::async_trait;
use parley_core::config::StorageConfig;
use parley_core::error::{ParleyError, Result};
use parley_core::state::{PersistedState, StateRepository};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Envelope version written alongside the state. Never migrated.
const STORAGE_VERSION: u32 = 0;

/// On-disk document: `{ "version": 0, "state": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredState {
    version: u32,
    state: PersistedState,
}

/// File-backed state repository.
///
/// # Example
///
/// ```ignore
/// use parley_infrastructure::FileStateRepository;
///
/// let repository = FileStateRepository::from_config(&paths, &config.storage)?;
/// let restored = repository.load().await?;
/// ```
#[derive(Clone)]
pub struct FileStateRepository {
    file: Arc<AtomicFile<StoredState>>,
}

impl FileStateRepository {
    /// Creates a repository writing to an explicit file.
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicFile::json(path)),
        }
    }

    /// Resolves the blob location from the storage section of the config.
    pub fn from_config(paths: &ParleyPaths, storage: &StorageConfig) -> Result<Self> {
        let path = paths.storage_file(&storage.name, storage.directory.as_ref())?;
        tracing::debug!("[FileStateRepository] Using {}", path.display());
        Ok(Self::new(path))
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}

#[async_trait]
impl StateRepository for FileStateRepository {
    async fn load(&self) -> Result<Option<PersistedState>> {
        let file = self.file.clone();
        let stored = tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))??;

        Ok(stored.map(|stored| {
            if stored.version != STORAGE_VERSION {
                tracing::warn!(
                    "[FileStateRepository] Stored version {} differs from {}; loading as-is",
                    stored.version,
                    STORAGE_VERSION
                );
            }
            stored.state
        }))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let file = self.file.clone();
        let stored = StoredState {
            version: STORAGE_VERSION,
            state: state.clone(),
        };
        tokio::task::spawn_blocking(move || file.save(&stored))
            .await
            .map_err(|e| ParleyError::internal(format!("Failed to join task: {}", e)))??;

        Ok(())
    }
}

/// In-memory state repository.
#[derive(Default)]
pub struct InMemoryStateRepository {
    state: Mutex<Option<PersistedState>>,
    saves: AtomicUsize,
}

impl InMemoryStateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `state` already stored, as if saved by a previous run.
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: AtomicUsize::new(0),
        }
    }

    /// The most recently saved state.
    pub async fn stored(&self) -> Option<PersistedState> {
        self.state.lock().await.clone()
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateRepository for InMemoryStateRepository {
    async fn load(&self) -> Result<Option<PersistedState>> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        *self.state.lock().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::permission::PermissionDecision;
    use parley_core::session::{Message, Session};
    use tempfile::TempDir;

    fn sample_state() -> PersistedState {
        let mut session = Session::new("s1", "test", Some("model-a".to_string()));
        session.messages.push(Message::user("m1", "hello"));
        session.record_usage(12, 0.01);

        let mut state = PersistedState::default();
        state.sessions.push(session);
        state
            .permissions
            .insert("bash".to_string(), PermissionDecision::Allow);
        state.settings.temperature = 0.2;
        state
    }

    #[tokio::test]
    async fn test_file_repository_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repository = FileStateRepository::new(temp_dir.path().join("parley-storage.json"));

        assert!(repository.load().await.unwrap().is_none());

        let state = sample_state();
        repository.save(&state).await.unwrap();

        assert_eq!(repository.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_file_repository_writes_envelope() {
        let temp_dir = TempDir::new().unwrap();
        let repository = FileStateRepository::new(temp_dir.path().join("blob.json"));
        repository.save(&PersistedState::default()).await.unwrap();

        let raw = std::fs::read_to_string(repository.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["version"], 0);
        assert!(json["state"]["sessions"].is_array());
        assert!(json["state"]["settings"]["maxTokens"].is_number());
    }

    #[tokio::test]
    async fn test_file_repository_corrupt_blob_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.json");
        std::fs::write(&path, "{\"version\": 0, \"state\": ").unwrap();

        let repository = FileStateRepository::new(path);
        assert!(repository.load().await.is_err());
    }

    #[tokio::test]
    async fn test_from_config_uses_storage_name() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ParleyPaths::new(Some(temp_dir.path().into()));
        let storage = StorageConfig {
            name: "custom-key".to_string(),
            directory: None,
        };

        let repository = FileStateRepository::from_config(&paths, &storage).unwrap();
        assert_eq!(repository.path(), temp_dir.path().join("custom-key.json"));
    }

    #[tokio::test]
    async fn test_in_memory_repository_counts_saves() {
        let repository = InMemoryStateRepository::new();
        assert!(repository.load().await.unwrap().is_none());

        repository.save(&sample_state()).await.unwrap();
        repository.save(&PersistedState::default()).await.unwrap();

        assert_eq!(repository.save_count(), 2);
        assert_eq!(repository.stored().await, Some(PersistedState::default()));
    }
}
