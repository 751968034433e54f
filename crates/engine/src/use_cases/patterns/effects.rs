//! Apply pattern effects use case.
//!
//! When a pattern activates, this applies its effects through the mystery
//! store (reveal clues, raise access, unlock features).

use std::sync::Arc;

use retrodesk_domain::{PatternEffect, PatternId};

use crate::stores::MysteryStore;

/// Result of applying a single effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectResult {
    /// Description of what was done
    pub description: String,
    /// Whether state actually changed (false for already-applied effects)
    pub changed: bool,
}

/// Summary of applying all effects for an activation.
#[derive(Debug)]
pub struct EffectSummary {
    pub pattern_id: PatternId,
    pub results: Vec<EffectResult>,
    pub changed_count: usize,
}

pub struct ApplyEffects {
    store: Arc<MysteryStore>,
}

impl ApplyEffects {
    pub fn new(store: Arc<MysteryStore>) -> Self {
        Self { store }
    }

    /// Apply `effects` in order.
    pub fn execute(&self, pattern_id: &PatternId, effects: &[PatternEffect]) -> EffectSummary {
        let results: Vec<EffectResult> = effects
            .iter()
            .map(|effect| self.execute_single_effect(effect))
            .collect();
        let changed_count = results.iter().filter(|r| r.changed).count();

        tracing::info!(
            pattern_id = %pattern_id,
            total_effects = results.len(),
            changed_count = changed_count,
            "Applied pattern effects"
        );

        EffectSummary {
            pattern_id: pattern_id.clone(),
            results,
            changed_count,
        }
    }

    fn execute_single_effect(&self, effect: &PatternEffect) -> EffectResult {
        match effect {
            PatternEffect::RevealClue { clue_id } => EffectResult {
                description: format!("Revealed clue {}", clue_id),
                changed: self.store.discover_clue(clue_id),
            },
            PatternEffect::RaiseAccess { level } => EffectResult {
                description: format!("Raised access to {}", level),
                changed: self.store.raise_access_level(*level),
            },
            PatternEffect::UnlockFeature { feature } => EffectResult {
                description: format!("Unlocked feature {}", feature),
                changed: self.store.unlock_feature(feature),
            },
        }
    }
}
