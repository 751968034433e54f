//! Pattern definition - a named multi-step condition over user actions
//!
//! Definitions are static catalogue data: built once at startup, never
//! mutated afterwards. The runtime state (progress, activation) lives in the
//! engine, keyed by `PatternId`.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ClueId, FeatureKey, PatternId};
use crate::rules::MatchRule;
use crate::value_objects::{AccessLevel, Description, PatternName};

/// A pattern the player can discover by doing things on the desktop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternDefinition {
    pub id: PatternId,
    pub name: PatternName,
    #[serde(default)]
    pub description: Description,
    /// UI category, no behavioural effect
    #[serde(default)]
    pub pattern_type: PatternType,
    pub rule: MatchRule,
    /// Fractions in (0, 1], strictly increasing. Crossing one is reported
    /// with the progress update.
    #[serde(default)]
    pub progress_thresholds: Vec<f32>,
    #[serde(default)]
    pub visual: Option<VisualRepresentation>,
    /// Applied once, in order, when the pattern activates
    #[serde(default)]
    pub effects: Vec<PatternEffect>,
}

/// UI grouping for patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Ordered command / file sequences
    #[default]
    Sequence,
    /// Poking around apps and the desktop
    Exploration,
    /// Terminal-only puzzles
    Terminal,
    /// Time-boxed co-occurrences
    Temporal,
    /// Game and widget secrets
    EasterEgg,
    /// Unknown category (for forward compatibility)
    #[serde(other)]
    Unknown,
}

/// Presentation hints for a pattern's progress widget
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualRepresentation {
    pub icon: Option<String>,
    pub color: Option<String>,
    pub animation: Option<String>,
}

impl VisualRepresentation {
    pub fn icon(icon: impl Into<String>) -> Self {
        Self {
            icon: Some(icon.into()),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_animation(mut self, animation: impl Into<String>) -> Self {
        self.animation = Some(animation.into());
        self
    }
}

/// One-time consequence of activating a pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum PatternEffect {
    RevealClue { clue_id: ClueId },
    RaiseAccess { level: AccessLevel },
    UnlockFeature { feature: FeatureKey },
}

impl PatternDefinition {
    /// Create a definition with no thresholds, visuals or effects.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the rule is malformed.
    pub fn new(id: PatternId, name: PatternName, rule: MatchRule) -> Result<Self, DomainError> {
        rule.validate()?;
        Ok(Self {
            id,
            name,
            description: Description::empty(),
            pattern_type: PatternType::default(),
            rule,
            progress_thresholds: Vec::new(),
            visual: None,
            effects: Vec::new(),
        })
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = description;
        self
    }

    pub fn with_type(mut self, pattern_type: PatternType) -> Self {
        self.pattern_type = pattern_type;
        self
    }

    pub fn with_visual(mut self, visual: VisualRepresentation) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn with_effect(mut self, effect: PatternEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless every threshold is in (0, 1]
    /// and the list is strictly increasing.
    pub fn with_thresholds(mut self, thresholds: Vec<f32>) -> Result<Self, DomainError> {
        validate_thresholds(&thresholds)?;
        self.progress_thresholds = thresholds;
        Ok(self)
    }

    /// Re-check invariants, e.g. after deserializing catalogue data.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.rule.validate()?;
        validate_thresholds(&self.progress_thresholds)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Clues revealed on activation
    pub fn revealed_clues(&self) -> impl Iterator<Item = &ClueId> {
        self.effects.iter().filter_map(|effect| match effect {
            PatternEffect::RevealClue { clue_id } => Some(clue_id),
            _ => None,
        })
    }

    /// Highest threshold in `(previous, current]`, if any.
    pub fn crossed_threshold(&self, previous: f32, current: f32) -> Option<f32> {
        self.progress_thresholds
            .iter()
            .rev()
            .copied()
            .find(|t| *t > previous && *t <= current)
    }
}

fn validate_thresholds(thresholds: &[f32]) -> Result<(), DomainError> {
    let mut last = 0.0_f32;
    for &threshold in thresholds {
        if threshold.is_nan() || threshold <= 0.0 || threshold > 1.0 {
            return Err(DomainError::validation(format!(
                "Progress threshold {} must be in (0, 1]",
                threshold
            )));
        }
        if threshold <= last {
            return Err(DomainError::validation(
                "Progress thresholds must be strictly increasing",
            ));
        }
        last = threshold;
    }
    Ok(())
}
