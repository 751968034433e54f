//! Pattern matching engine.
//!
//! Feeds every recorded action to each unactivated pattern's matcher in
//! registry order, keeps progress monotonic, and activates a pattern exactly
//! once when its rule completes.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use retrodesk_domain::{MysterySnapshot, PatternAction, PatternEvent, PatternId};

use super::effects::ApplyEffects;
use super::tracker::{CustomMatchers, PatternTracker};
use crate::api::events::{EventBridge, Subscription};
use crate::entities::PatternRegistry;
use crate::stores::MysteryStore;

/// What one recorded action changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    /// Patterns whose progress increased without activating
    pub progressed: Vec<PatternId>,
    /// Patterns activated by this action, in registry order
    pub activated: Vec<PatternId>,
    /// Patterns whose matcher faulted on this action
    pub failed: Vec<PatternId>,
}

impl ActionOutcome {
    pub fn is_empty(&self) -> bool {
        self.progressed.is_empty() && self.activated.is_empty() && self.failed.is_empty()
    }
}

pub struct PatternEngine {
    registry: Arc<PatternRegistry>,
    custom: CustomMatchers,
    /// Parallel to `registry.all_patterns()`
    trackers: Vec<PatternTracker>,
    activation_order: Vec<PatternId>,
    store: Arc<MysteryStore>,
    bridge: EventBridge,
    effects: ApplyEffects,
    last_action_at: Option<DateTime<Utc>>,
    warned_custom: HashSet<String>,
}

impl PatternEngine {
    pub fn new(
        registry: Arc<PatternRegistry>,
        store: Arc<MysteryStore>,
        bridge: EventBridge,
        custom: CustomMatchers,
    ) -> Self {
        let mut warned_custom = HashSet::new();
        let trackers =
            PatternTracker::build_all(registry.all_patterns(), &custom, &mut warned_custom);
        Self {
            registry,
            custom,
            trackers,
            activation_order: Vec::new(),
            effects: ApplyEffects::new(store.clone()),
            store,
            bridge,
            last_action_at: None,
            warned_custom,
        }
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Timestamp of the latest recorded action.
    pub fn last_action_at(&self) -> Option<DateTime<Utc>> {
        self.last_action_at
    }

    /// Evaluate one action against every unactivated pattern.
    ///
    /// Never fails: matcher faults are logged and reported in
    /// `ActionOutcome::failed`, and the remaining patterns still evaluate.
    ///
    /// Timestamps earlier than the last recorded action are clamped forward
    /// so time-window rules see a non-decreasing clock.
    pub fn record_action(&mut self, action: &PatternAction) -> ActionOutcome {
        let action = match self.last_action_at {
            Some(last) if action.timestamp() < last => {
                tracing::debug!(
                    action_type = %action.kind(),
                    "Clamping out-of-order action timestamp"
                );
                Cow::Owned(action.clone().with_timestamp(last))
            }
            _ => Cow::Borrowed(action),
        };
        let action = action.as_ref();
        self.last_action_at = Some(action.timestamp());

        let mut outcome = ActionOutcome::default();

        for index in 0..self.trackers.len() {
            let tracker = &mut self.trackers[index];
            if tracker.active {
                continue;
            }

            let evaluation = match tracker.evaluate(action) {
                Ok(Some(evaluation)) => evaluation,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(
                        pattern_id = %tracker.id,
                        action_type = %action.kind(),
                        error = %e,
                        "Matcher failed, skipping pattern for this action"
                    );
                    outcome.failed.push(tracker.id.clone());
                    continue;
                }
            };

            let previous = tracker.progress;
            // f32::max ignores NaN from a misbehaving matcher
            let progress = previous.max(evaluation.progress.clamp(0.0, 1.0));

            if evaluation.matched || progress >= 1.0 {
                let id = tracker.id.clone();
                self.activate_at(index);
                outcome.activated.push(id);
            } else if progress > previous {
                tracker.progress = progress;
                let id = tracker.id.clone();
                let threshold = self.registry.all_patterns()[index]
                    .crossed_threshold(previous, progress);

                tracing::debug!(
                    pattern_id = %id,
                    progress = progress,
                    threshold = ?threshold,
                    "Pattern progressed"
                );

                let seen_keys = tracker.seen_keys();
                self.store.record_progress(&id, progress);
                if !seen_keys.is_empty() {
                    self.store.record_distinct_keys(&id, seen_keys);
                }
                self.bridge
                    .publish(PatternEvent::progress(id.clone(), progress, threshold));
                outcome.progressed.push(id);
            }
        }

        outcome
    }

    /// Activate a pattern without matching, e.g. from a hidden command.
    ///
    /// Returns `false` when the pattern is unknown or already active.
    pub fn activate_pattern(&mut self, pattern_id: &str) -> bool {
        let Some(index) = self.registry.position(pattern_id) else {
            tracing::warn!(pattern_id = %pattern_id, "Cannot activate unknown pattern");
            return false;
        };
        if self.trackers[index].active {
            return false;
        }
        self.activate_at(index);
        true
    }

    fn activate_at(&mut self, index: usize) {
        let tracker = &mut self.trackers[index];
        tracker.active = true;
        tracker.progress = 1.0;
        let id = tracker.id.clone();
        self.activation_order.push(id.clone());

        tracing::info!(pattern_id = %id, "Pattern activated");

        self.store.record_activation(&id);
        let definition = &self.registry.all_patterns()[index];
        self.effects.execute(&id, &definition.effects);
        self.bridge.publish(PatternEvent::activated(id));
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn all_pattern_progress(&self) -> BTreeMap<PatternId, f32> {
        self.trackers
            .iter()
            .map(|tracker| (tracker.id.clone(), tracker.progress))
            .collect()
    }

    pub fn pattern_progress(&self, pattern_id: &str) -> Option<f32> {
        self.tracker(pattern_id).map(|tracker| tracker.progress)
    }

    pub fn is_pattern_active(&self, pattern_id: &str) -> bool {
        self.tracker(pattern_id).is_some_and(|tracker| tracker.active)
    }

    /// Active patterns in activation order.
    pub fn active_patterns(&self) -> &[PatternId] {
        &self.activation_order
    }

    fn tracker(&self, pattern_id: &str) -> Option<&PatternTracker> {
        self.registry
            .position(pattern_id)
            .map(|index| &self.trackers[index])
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    /// Subscribe a callback, replaying the current state of every pattern
    /// first.
    ///
    /// Takes `&self`, so no action can be recorded between the replay and the
    /// subscription while the caller holds the engine.
    pub fn register_state_change_callback<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PatternEvent) + Send + Sync + 'static,
    {
        for tracker in &self.trackers {
            let event = if tracker.active {
                PatternEvent::activated(tracker.id.clone())
            } else {
                PatternEvent::progress(tracker.id.clone(), tracker.progress, None)
            };
            callback(&event);
        }
        self.bridge.subscribe_fn(callback)
    }

    // =========================================================================
    // Save / new game
    // =========================================================================

    /// Adopt progress and activations from a save. Matcher windows start
    /// empty; counting rules resume from the saved progress and distinct
    /// rules from their saved keys.
    pub fn restore(&mut self, snapshot: &MysterySnapshot) {
        self.rebuild();
        for tracker in &mut self.trackers {
            let active = snapshot.active_patterns.contains(&tracker.id);
            let seen_keys = snapshot.distinct_keys_of(tracker.id.as_str());
            tracker.resume(snapshot.progress_of(tracker.id.as_str()), active, &seen_keys);
        }
        // Saves do not record activation order; registry order stands in.
        self.activation_order = self
            .trackers
            .iter()
            .filter(|tracker| tracker.active)
            .map(|tracker| tracker.id.clone())
            .collect();

        for id in &snapshot.active_patterns {
            if !self.registry.contains(id.as_str()) {
                tracing::warn!(pattern_id = %id, "Save references unknown pattern");
            }
        }

        tracing::info!(
            active = self.activation_order.len(),
            patterns = self.trackers.len(),
            "Restored pattern state"
        );
    }

    /// Clear all progress for a new game.
    pub fn reset(&mut self) {
        self.rebuild();
        self.activation_order.clear();
        tracing::info!("Reset pattern state");
    }

    fn rebuild(&mut self) {
        self.trackers = PatternTracker::build_all(
            self.registry.all_patterns(),
            &self.custom,
            &mut self.warned_custom,
        );
        self.last_action_at = None;
    }
}
