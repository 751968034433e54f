//! Clue/mystery state store.
//!
//! Owns discovered clues, the access level and unlocked features. Pattern
//! progress and activations are owned by the engine but mirrored here so a
//! single `MysterySnapshot` captures the whole save. Every mutation marks the
//! store dirty; the save use case flushes dirty state.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use retrodesk_domain::{
    AccessLevel, ClueId, FeatureKey, MysterySnapshot, PatternEvent, PatternId,
};

use crate::api::events::EventBridge;
use crate::entities::ClueCatalogue;

#[derive(Default)]
struct MysteryState {
    snapshot: MysterySnapshot,
    dirty: bool,
}

pub struct MysteryStore {
    state: Mutex<MysteryState>,
    clues: Arc<ClueCatalogue>,
    bridge: EventBridge,
}

impl MysteryStore {
    pub fn new(clues: Arc<ClueCatalogue>, bridge: EventBridge) -> Self {
        Self {
            state: Mutex::new(MysteryState::default()),
            clues,
            bridge,
        }
    }

    fn state(&self) -> MutexGuard<'_, MysteryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Clues
    // =========================================================================

    /// Mark a clue discovered. Returns `true` only the first time.
    pub fn discover_clue(&self, clue_id: &ClueId) -> bool {
        if !self.clues.contains(clue_id.as_str()) {
            tracing::warn!(clue_id = %clue_id, "Discovering clue missing from catalogue");
        }

        let inserted = {
            let mut state = self.state();
            let inserted = state.snapshot.discovered_clues.insert(clue_id.clone());
            if inserted {
                state.dirty = true;
            }
            inserted
        };

        if inserted {
            tracing::info!(clue_id = %clue_id, "Clue discovered");
            self.bridge.publish(PatternEvent::ClueDiscovered {
                clue_id: clue_id.clone(),
            });
        }
        inserted
    }

    pub fn has_discovered_clue(&self, clue_id: &str) -> bool {
        self.state().snapshot.discovered_clues.contains(clue_id)
    }

    pub fn discovered_clues(&self) -> BTreeSet<ClueId> {
        self.state().snapshot.discovered_clues.clone()
    }

    // =========================================================================
    // Access level
    // =========================================================================

    pub fn access_level(&self) -> AccessLevel {
        self.state().snapshot.access_level
    }

    /// Raise to `level` if higher than the current level. Never lowers.
    pub fn raise_access_level(&self, level: AccessLevel) -> bool {
        let previous = {
            let mut state = self.state();
            let previous = state.snapshot.access_level;
            if level <= previous {
                return false;
            }
            state.snapshot.access_level = level;
            state.dirty = true;
            previous
        };

        tracing::info!(from = %previous, to = %level, "Access level raised");
        self.bridge.publish(PatternEvent::AccessLevelChanged {
            from: previous,
            to: level,
        });
        true
    }

    /// Check `code` against the catalogue's access codes.
    ///
    /// On success the access level is raised (if lower), the code's clue is
    /// revealed, and the level the code grants is returned.
    pub fn authenticate(&self, code: &str) -> Option<AccessLevel> {
        let Some(access) = self.clues.find_access_code(code) else {
            tracing::debug!("Authentication failed");
            return None;
        };

        self.raise_access_level(access.level);
        if let Some(clue_id) = &access.reveals {
            self.discover_clue(clue_id);
        }
        Some(access.level)
    }

    // =========================================================================
    // Features
    // =========================================================================

    pub fn unlock_feature(&self, feature: &FeatureKey) -> bool {
        let inserted = {
            let mut state = self.state();
            let inserted = state.snapshot.unlocked_features.insert(feature.clone());
            if inserted {
                state.dirty = true;
            }
            inserted
        };

        if inserted {
            tracing::info!(feature = %feature, "Feature unlocked");
            self.bridge.publish(PatternEvent::FeatureUnlocked {
                feature: feature.clone(),
            });
        }
        inserted
    }

    pub fn is_feature_unlocked(&self, feature: &str) -> bool {
        self.state().snapshot.unlocked_features.contains(feature)
    }

    // =========================================================================
    // Pattern mirror (written by the engine)
    // =========================================================================

    pub(crate) fn record_progress(&self, pattern_id: &PatternId, progress: f32) {
        let mut state = self.state();
        let entry = state
            .snapshot
            .pattern_progress
            .entry(pattern_id.clone())
            .or_insert(0.0);
        if progress > *entry {
            *entry = progress;
            state.dirty = true;
        }
    }

    /// Replace the counted keys of a distinct rule.
    pub(crate) fn record_distinct_keys(&self, pattern_id: &PatternId, keys: Vec<String>) {
        let keys: BTreeSet<String> = keys.into_iter().collect();
        let mut state = self.state();
        if state.snapshot.distinct_keys.get(pattern_id) != Some(&keys) {
            state.snapshot.distinct_keys.insert(pattern_id.clone(), keys);
            state.dirty = true;
        }
    }

    pub(crate) fn record_activation(&self, pattern_id: &PatternId) {
        let mut state = self.state();
        state.snapshot.pattern_progress.insert(pattern_id.clone(), 1.0);
        state.snapshot.active_patterns.insert(pattern_id.clone());
        // Active patterns never evaluate again.
        state.snapshot.distinct_keys.remove(pattern_id);
        state.dirty = true;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn snapshot(&self) -> MysterySnapshot {
        self.state().snapshot.clone()
    }

    /// Replace all state with a loaded save. The store is clean afterwards.
    pub fn restore(&self, snapshot: MysterySnapshot) {
        let mut state = self.state();
        state.snapshot = snapshot;
        state.dirty = false;
    }

    /// Start a new game. The empty state is dirty so it overwrites the slot.
    pub fn reset(&self) {
        let mut state = self.state();
        state.snapshot = MysterySnapshot::default();
        state.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    /// Snapshot and clear the dirty flag, or `None` when nothing changed.
    pub fn take_dirty(&self) -> Option<MysterySnapshot> {
        let mut state = self.state();
        if !state.dirty {
            return None;
        }
        state.dirty = false;
        Some(state.snapshot.clone())
    }

    /// Flag state for the next flush, e.g. after a failed save.
    pub fn mark_dirty(&self) {
        self.state().dirty = true;
    }
}
