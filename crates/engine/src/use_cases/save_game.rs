//! Save game use case.
//!
//! Loads a slot into the mystery store and engine, and flushes dirty state
//! back to the save port. Persistence never blocks gameplay: failures are
//! logged and the state stays dirty for the next flush.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::ports::SaveStorePort;
use crate::stores::MysteryStore;
use crate::use_cases::patterns::{lock_engine, SharedEngine};

pub struct SaveGame {
    store: Arc<MysteryStore>,
    engine: SharedEngine,
    port: Arc<dyn SaveStorePort>,
    slot: String,
}

impl SaveGame {
    pub fn new(
        store: Arc<MysteryStore>,
        engine: SharedEngine,
        port: Arc<dyn SaveStorePort>,
        slot: impl Into<String>,
    ) -> Self {
        Self {
            store,
            engine,
            port,
            slot: slot.into(),
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Restore the slot. Returns `true` if a save was found.
    ///
    /// A missing or unreadable save leaves the current state untouched.
    pub async fn load(&self) -> bool {
        let snapshot = match self.port.load(&self.slot).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::info!(slot = %self.slot, "No save found, starting fresh");
                return false;
            }
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Failed to load save");
                return false;
            }
        };

        let mut engine = lock_engine(&self.engine);
        engine.restore(&snapshot);
        self.store.restore(snapshot);
        tracing::info!(
            slot = %self.slot,
            clues = self.store.discovered_clues().len(),
            "Loaded save"
        );
        true
    }

    /// Write dirty state to the port. Returns `true` if something was saved.
    pub async fn flush(&self) -> bool {
        let Some(snapshot) = self.store.take_dirty() else {
            return false;
        };

        match self.port.save(&self.slot, &snapshot).await {
            Ok(()) => {
                tracing::debug!(slot = %self.slot, "Flushed save");
                true
            }
            Err(e) => {
                tracing::warn!(slot = %self.slot, error = %e, "Failed to save, will retry");
                self.store.mark_dirty();
                false
            }
        }
    }
}

/// Periodically flush dirty state until cancelled, then flush once more.
pub async fn autosave_worker(
    save: Arc<SaveGame>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    tracing::info!(
        slot = %save.slot(),
        interval_secs = interval.as_secs_f64(),
        "Starting autosave worker"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Autosave worker shutting down");
                break;
            }
            _ = ticker.tick() => {
                save.flush().await;
            }
        }
    }

    save.flush().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use retrodesk_domain::{AccessLevel, ClueId, MysterySnapshot, PatternId};

    use crate::api::events::EventBridge;
    use crate::entities::catalogue::STARFIELD_CARTOGRAPHER;
    use crate::entities::Catalogue;
    use crate::infrastructure::memory_save::InMemorySaveStore;
    use crate::infrastructure::ports::{MockSaveStorePort, SaveError};
    use crate::use_cases::patterns::{CustomMatchers, PatternEngine};

    fn parts() -> (Arc<MysteryStore>, SharedEngine) {
        let catalogue = Catalogue::standard().unwrap();
        let bridge = EventBridge::new();
        let store = Arc::new(MysteryStore::new(Arc::new(catalogue.clues), bridge.clone()));
        let engine = Arc::new(Mutex::new(PatternEngine::new(
            Arc::new(catalogue.patterns),
            store.clone(),
            bridge,
            CustomMatchers::new(),
        )));
        (store, engine)
    }

    fn saved_snapshot() -> MysterySnapshot {
        let mut snapshot = MysterySnapshot::default();
        snapshot
            .discovered_clues
            .insert(ClueId::new("guest-login").unwrap());
        snapshot
            .pattern_progress
            .insert(PatternId::new(STARFIELD_CARTOGRAPHER).unwrap(), 0.5);
        snapshot.access_level = AccessLevel::User;
        snapshot
    }

    mod load {
        use super::*;

        #[tokio::test]
        async fn restores_store_and_engine() {
            let (store, engine) = parts();
            let mut port = MockSaveStorePort::new();
            port.expect_load()
                .withf(|slot| slot == "slot-1")
                .times(1)
                .returning(|_| Ok(Some(saved_snapshot())));

            let save = SaveGame::new(store.clone(), engine.clone(), Arc::new(port), "slot-1");

            assert!(save.load().await);
            assert!(store.has_discovered_clue("guest-login"));
            assert_eq!(store.access_level(), AccessLevel::User);
            assert!(!store.is_dirty());
            assert_eq!(
                lock_engine(&engine).pattern_progress(STARFIELD_CARTOGRAPHER),
                Some(0.5)
            );
        }

        #[tokio::test]
        async fn missing_slot_keeps_fresh_state() {
            let (store, engine) = parts();
            let mut port = MockSaveStorePort::new();
            port.expect_load().returning(|_| Ok(None));

            let save = SaveGame::new(store.clone(), engine, Arc::new(port), "slot-1");

            assert!(!save.load().await);
            assert!(store.snapshot().is_fresh());
        }

        #[tokio::test]
        async fn load_failure_is_swallowed() {
            let (store, engine) = parts();
            let mut port = MockSaveStorePort::new();
            port.expect_load()
                .returning(|_| Err(SaveError::database("load", "disk on fire")));

            let save = SaveGame::new(store.clone(), engine, Arc::new(port), "slot-1");

            assert!(!save.load().await);
            assert!(store.snapshot().is_fresh());
        }
    }

    mod flush {
        use super::*;

        #[tokio::test]
        async fn clean_store_is_not_written() {
            let (store, engine) = parts();
            let mut port = MockSaveStorePort::new();
            port.expect_save().times(0);

            let save = SaveGame::new(store, engine, Arc::new(port), "slot-1");
            assert!(!save.flush().await);
        }

        #[tokio::test]
        async fn dirty_store_is_written_once() {
            let (store, engine) = parts();
            store.raise_access_level(AccessLevel::User);

            let mut port = MockSaveStorePort::new();
            port.expect_save()
                .withf(|slot, snapshot| {
                    slot == "slot-1" && snapshot.access_level == AccessLevel::User
                })
                .times(1)
                .returning(|_, _| Ok(()));

            let save = SaveGame::new(store.clone(), engine, Arc::new(port), "slot-1");
            assert!(save.flush().await);
            assert!(!save.flush().await);
            assert!(!store.is_dirty());
        }

        #[tokio::test]
        async fn failed_save_stays_dirty_for_retry() {
            let (store, engine) = parts();
            store.raise_access_level(AccessLevel::User);

            let mut port = MockSaveStorePort::new();
            port.expect_save()
                .times(1)
                .returning(|_, _| Err(SaveError::database("save", "locked")));

            let save = SaveGame::new(store.clone(), engine, Arc::new(port), "slot-1");
            assert!(!save.flush().await);
            assert!(store.is_dirty());
        }
    }

    #[tokio::test]
    async fn autosave_flushes_on_shutdown() {
        let (store, engine) = parts();
        let port = Arc::new(InMemorySaveStore::new());
        let save = Arc::new(SaveGame::new(store.clone(), engine, port.clone(), "slot-1"));
        let cancel_token = CancellationToken::new();

        let worker = tokio::spawn(autosave_worker(
            save,
            Duration::from_secs(3600),
            cancel_token.clone(),
        ));

        store.discover_clue(&ClueId::new("star-chart").unwrap());
        cancel_token.cancel();
        worker.await.unwrap();

        let saved = port.load("slot-1").await.unwrap().unwrap();
        assert!(saved
            .discovered_clues
            .contains(&ClueId::new("star-chart").unwrap()));
        assert!(!store.is_dirty());
    }
}
