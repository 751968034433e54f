//! Save slot persistence port.

use async_trait::async_trait;
use retrodesk_domain::MysterySnapshot;

use super::error::SaveError;

/// Stores one `MysterySnapshot` per named slot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaveStorePort: Send + Sync {
    /// `Ok(None)` when the slot has never been saved.
    async fn load(&self, slot: &str) -> Result<Option<MysterySnapshot>, SaveError>;
    async fn save(&self, slot: &str, snapshot: &MysterySnapshot) -> Result<(), SaveError>;
}
