//! Domain model for the RetroDesk mystery: actions, match rules, pattern
//! and clue definitions, events and persisted state.
//!
//! This crate has no I/O. Everything stateful beyond a single matcher lives
//! in `retrodesk-engine`.

pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod rules;
pub mod snapshot;
pub mod value_objects;

pub use entities::{
    Clue, ClueCategory, ClueDisplay, PatternDefinition, PatternEffect, PatternType,
    VisualRepresentation,
};
pub use error::{DomainError, MatchError};
pub use events::PatternEvent;
pub use ids::{ClueId, FeatureKey, PatternId};
pub use rules::{
    ActionFilter, AllWithinMatcher, CompiledFilter, Evaluation, MatchRule, Matcher,
    SequenceMatcher, ThresholdMatcher,
};
pub use snapshot::MysterySnapshot;
pub use value_objects::{
    AccessLevel, ActionPayload, ClueTitle, CompiledText, Description, FileOperation,
    PatternAction, PatternName, TextMatch,
};
