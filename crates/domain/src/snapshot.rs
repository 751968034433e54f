//! Persisted mystery state
//!
//! One snapshot per save slot. Every field defaults so older saves missing
//! newer fields still load.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{ClueId, FeatureKey, PatternId};
use crate::value_objects::AccessLevel;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MysterySnapshot {
    #[serde(default)]
    pub discovered_clues: BTreeSet<ClueId>,
    #[serde(default)]
    pub pattern_progress: BTreeMap<PatternId, f32>,
    #[serde(default)]
    pub active_patterns: BTreeSet<PatternId>,
    #[serde(default)]
    pub access_level: AccessLevel,
    #[serde(default)]
    pub unlocked_features: BTreeSet<FeatureKey>,
    /// Keys already counted by distinct rules of unactivated patterns
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub distinct_keys: BTreeMap<PatternId, BTreeSet<String>>,
}

impl MysterySnapshot {
    /// True for a brand-new game.
    pub fn is_fresh(&self) -> bool {
        self.discovered_clues.is_empty()
            && self.pattern_progress.is_empty()
            && self.active_patterns.is_empty()
            && self.access_level == AccessLevel::Default
            && self.unlocked_features.is_empty()
            && self.distinct_keys.is_empty()
    }

    pub fn progress_of(&self, pattern_id: &str) -> f32 {
        self.pattern_progress
            .get(pattern_id)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn distinct_keys_of(&self, pattern_id: &str) -> Vec<String> {
        self.distinct_keys
            .get(pattern_id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_loads_as_fresh_game() {
        let snapshot: MysterySnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.is_fresh());
    }

    #[test]
    fn serializes_camel_case_keys() {
        let mut snapshot = MysterySnapshot::default();
        snapshot
            .discovered_clues
            .insert(ClueId::new("admin-access").unwrap());
        snapshot
            .pattern_progress
            .insert(PatternId::new("starfield").unwrap(), 0.5);
        snapshot.access_level = AccessLevel::Admin;

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["discoveredClues"][0], "admin-access");
        assert_eq!(json["patternProgress"]["starfield"], 0.5);
        assert_eq!(json["accessLevel"], "ADMIN");
        assert!(json["activePatterns"].as_array().unwrap().is_empty());
        assert_eq!(snapshot.progress_of("starfield"), 0.5);
        assert_eq!(snapshot.progress_of("missing"), 0.0);
    }

    #[test]
    fn distinct_keys_round_trip_and_are_omitted_when_empty() {
        let empty = serde_json::to_value(MysterySnapshot::default()).unwrap();
        assert!(empty.get("distinctKeys").is_none());

        let mut snapshot = MysterySnapshot::default();
        snapshot.distinct_keys.insert(
            PatternId::new("journal-reader").unwrap(),
            BTreeSet::from(["open:/home/user/journal/03-01.txt".to_string()]),
        );
        assert!(!snapshot.is_fresh());

        let json = serde_json::to_string(&snapshot).unwrap();
        let loaded: MysterySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(
            loaded.distinct_keys_of("journal-reader"),
            vec!["open:/home/user/journal/03-01.txt".to_string()]
        );
        assert!(loaded.distinct_keys_of("missing").is_empty());
    }
}
