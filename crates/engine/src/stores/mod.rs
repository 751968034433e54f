//! In-memory state storage modules.
//!
//! Stores manage runtime state that outlives a single action:
//! - `MysteryStore` - discovered clues, access level, unlocked features and
//!   the persisted mirror of pattern progress

pub mod mystery;

pub use mystery::MysteryStore;
