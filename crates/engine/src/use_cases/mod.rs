//! Use cases - orchestration across the store, engine and ports.

pub mod patterns;
pub mod save_game;

pub use patterns::{ActionOutcome, CustomMatchers, PatternEngine, SharedEngine};
pub use save_game::{autosave_worker, SaveGame};
