//! Application state and composition.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use retrodesk_domain::{AccessLevel, ClueId, FileOperation, PatternEvent};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{ActionRecorder, EventBridge, Subscription};
use crate::entities::{Catalogue, ClueCatalogue, PatternRegistry};
use crate::infrastructure::ports::{
    ClockPort, FileEntry, FileSystemError, FileSystemPort, SaveStorePort,
};
use crate::stores::MysteryStore;
use crate::use_cases::patterns::lock_engine;
use crate::use_cases::{autosave_worker, CustomMatchers, PatternEngine, SaveGame, SharedEngine};

/// Main application state.
///
/// Built once per session and shared with whatever front-end drives it.
/// Nothing here is global: tests build as many as they like.
pub struct App {
    pub registry: Arc<PatternRegistry>,
    pub clues: Arc<ClueCatalogue>,
    pub store: Arc<MysteryStore>,
    pub bridge: EventBridge,
    pub engine: SharedEngine,
    pub recorder: ActionRecorder,
    pub save: Arc<SaveGame>,
    pub file_system: Arc<dyn FileSystemPort>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        catalogue: Catalogue,
        save_port: Arc<dyn SaveStorePort>,
        file_system: Arc<dyn FileSystemPort>,
        clock: Arc<dyn ClockPort>,
        custom: CustomMatchers,
        slot: impl Into<String>,
    ) -> Self {
        let registry = Arc::new(catalogue.patterns);
        let clues = Arc::new(catalogue.clues);
        let bridge = EventBridge::new();

        let store = Arc::new(MysteryStore::new(clues.clone(), bridge.clone()));
        let engine: SharedEngine = Arc::new(Mutex::new(PatternEngine::new(
            registry.clone(),
            store.clone(),
            bridge.clone(),
            custom,
        )));
        let recorder = ActionRecorder::new(engine.clone(), clock);
        let save = Arc::new(SaveGame::new(
            store.clone(),
            engine.clone(),
            save_port,
            slot,
        ));

        Self {
            registry,
            clues,
            store,
            bridge,
            engine,
            recorder,
            save,
            file_system,
        }
    }

    /// Restore the configured save slot, if any.
    pub async fn load(&self) -> bool {
        self.save.load().await
    }

    /// Flush unsaved progress now.
    pub async fn save(&self) -> bool {
        self.save.flush().await
    }

    /// Forget all progress. The next flush overwrites the slot.
    pub fn new_game(&self) {
        let mut engine = lock_engine(&self.engine);
        engine.reset();
        self.store.reset();
        tracing::info!(slot = %self.save.slot(), "Started new game");
    }

    /// Activate a pattern directly, e.g. from a hidden terminal command.
    pub fn activate_pattern(&self, pattern_id: &str) -> bool {
        lock_engine(&self.engine).activate_pattern(pattern_id)
    }

    pub fn discover_clue(&self, clue_id: &ClueId) -> bool {
        self.store.discover_clue(clue_id)
    }

    pub fn authenticate(&self, code: &str) -> Option<AccessLevel> {
        self.store.authenticate(code)
    }

    /// Replay current pattern state to `callback`, then keep it subscribed.
    pub fn register_state_change_callback<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PatternEvent) + Send + Sync + 'static,
    {
        lock_engine(&self.engine).register_state_change_callback(callback)
    }

    /// Read a file through the virtual file system.
    ///
    /// The open is recorded whether or not the file exists; looking for a
    /// file that is not there is still something the player did.
    pub async fn open_file(&self, path: &str) -> Result<String, FileSystemError> {
        let content = self.file_system.read_file(path).await;
        self.recorder.record_file_access(path, FileOperation::Open);
        content
    }

    /// List a directory through the virtual file system, recording the listing.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, FileSystemError> {
        let entries = self.file_system.list_directory(path).await;
        self.recorder.record_file_access(path, FileOperation::List);
        entries
    }

    /// Spawn the autosave worker. It flushes once more when cancelled.
    pub fn spawn_autosave(
        &self,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(autosave_worker(self.save.clone(), interval, cancel_token))
    }
}
