//! Value objects - immutable, validated data

mod access_level;
mod action;
mod names;
mod text_match;

pub use access_level::AccessLevel;
pub use action::{ActionPayload, FileOperation, PatternAction, CLICK, FILE_ACCESS, TERMINAL_COMMAND};
pub use names::{ClueTitle, Description, PatternName};
pub use text_match::{CompiledText, TextMatch};
