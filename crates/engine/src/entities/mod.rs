//! Entity modules - static catalogue data shared read-only across the engine.

pub mod catalogue;
pub mod clues;
pub mod registry;

pub use catalogue::Catalogue;
pub use clues::{AccessCode, ClueCatalogue};
pub use registry::PatternRegistry;
