//! In-memory save slots for tests and throwaway sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use retrodesk_domain::MysterySnapshot;
use tokio::sync::RwLock;

use crate::infrastructure::ports::{SaveError, SaveStorePort};

#[derive(Default)]
pub struct InMemorySaveStore {
    slots: RwLock<HashMap<String, MysterySnapshot>>,
}

impl InMemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SaveStorePort for InMemorySaveStore {
    async fn load(&self, slot: &str) -> Result<Option<MysterySnapshot>, SaveError> {
        Ok(self.slots.read().await.get(slot).cloned())
    }

    async fn save(&self, slot: &str, snapshot: &MysterySnapshot) -> Result<(), SaveError> {
        self.slots
            .write()
            .await
            .insert(slot.to_string(), snapshot.clone());
        Ok(())
    }
}
