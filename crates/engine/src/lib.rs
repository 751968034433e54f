//! RetroDesk engine library.
//!
//! Pattern and clue discovery for the RetroDesk desktop: user actions go in,
//! pattern progress, clue discoveries and access changes come out.
//!
//! ## Structure
//!
//! - `entities/` - Static catalogue data (pattern registry, clues, access codes)
//! - `stores/` - Mutable mystery state
//! - `use_cases/` - Pattern matching, effects and save orchestration
//! - `infrastructure/` - Ports and their adapters (SQLite, in-memory, clock)
//! - `api/` - Action recorder and event bridge
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod entities;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
