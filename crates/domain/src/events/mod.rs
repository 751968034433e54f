//! Mystery events
//!
//! Emitted by the engine and the mystery store, fanned out to subscribers
//! by the event bridge. The serialized form is what the desktop UI listens
//! for: `{ "type": "pattern_activated", "patternId": "...", ... }`.

use serde::{Deserialize, Serialize};

use crate::ids::{ClueId, FeatureKey, PatternId};
use crate::value_objects::AccessLevel;

/// Observable change in mystery state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PatternEvent {
    ProgressUpdated {
        pattern_id: PatternId,
        progress: f32,
        /// Highest progress threshold crossed by this update
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
    },
    PatternActivated {
        pattern_id: PatternId,
    },
    ClueDiscovered {
        clue_id: ClueId,
    },
    AccessLevelChanged {
        from: AccessLevel,
        to: AccessLevel,
    },
    FeatureUnlocked {
        feature: FeatureKey,
    },
}

impl PatternEvent {
    pub fn progress(pattern_id: PatternId, progress: f32, threshold: Option<f32>) -> Self {
        Self::ProgressUpdated {
            pattern_id,
            progress,
            threshold,
        }
    }

    pub fn activated(pattern_id: PatternId) -> Self {
        Self::PatternActivated { pattern_id }
    }

    /// The wire `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ProgressUpdated { .. } => "progress_updated",
            Self::PatternActivated { .. } => "pattern_activated",
            Self::ClueDiscovered { .. } => "clue_discovered",
            Self::AccessLevelChanged { .. } => "access_level_changed",
            Self::FeatureUnlocked { .. } => "feature_unlocked",
        }
    }

    pub fn pattern_id(&self) -> Option<&PatternId> {
        match self {
            Self::ProgressUpdated { pattern_id, .. } | Self::PatternActivated { pattern_id } => {
                Some(pattern_id)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_event_uses_camel_case_fields() {
        let event = PatternEvent::progress(PatternId::new("starfield").unwrap(), 0.5, Some(0.5));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress_updated");
        assert_eq!(json["patternId"], "starfield");
        assert_eq!(json["progress"], 0.5);
        assert_eq!(json["threshold"], 0.5);
    }

    #[test]
    fn threshold_is_omitted_when_absent() {
        let event = PatternEvent::progress(PatternId::new("starfield").unwrap(), 0.25, None);
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("threshold").is_none());
    }

    #[test]
    fn event_type_matches_serialized_tag() {
        let events = vec![
            PatternEvent::activated(PatternId::new("a").unwrap()),
            PatternEvent::ClueDiscovered {
                clue_id: ClueId::new("c").unwrap(),
            },
            PatternEvent::AccessLevelChanged {
                from: AccessLevel::Default,
                to: AccessLevel::Admin,
            },
            PatternEvent::FeatureUnlocked {
                feature: FeatureKey::new("f").unwrap(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }

    #[test]
    fn only_pattern_events_carry_pattern_id() {
        let id = PatternId::new("a").unwrap();
        assert_eq!(PatternEvent::activated(id.clone()).pattern_id(), Some(&id));
        let clue = PatternEvent::ClueDiscovered {
            clue_id: ClueId::new("c").unwrap(),
        };
        assert!(clue.pattern_id().is_none());
    }
}
