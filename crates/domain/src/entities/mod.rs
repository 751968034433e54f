//! Catalogue entities

mod clue;
mod pattern;

pub use clue::{Clue, ClueCategory, ClueDisplay};
pub use pattern::{PatternDefinition, PatternEffect, PatternType, VisualRepresentation};
