//! State repository trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::model::PersistedState;

/// Durable key-value blob storage for the persisted part of the store.
///
/// Implementations are keyed by a fixed storage name chosen at construction.
#[async_trait]
pub trait StateRepository: Send + Sync {
    /// Loads the last saved state.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(state))`: A blob was stored
    /// - `Ok(None)`: Nothing stored yet
    /// - `Err(_)`: The blob exists but could not be read
    async fn load(&self) -> Result<Option<PersistedState>>;

    /// Replaces the stored blob with `state`.
    async fn save(&self, state: &PersistedState) -> Result<()>;
}
