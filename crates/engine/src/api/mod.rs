//! API layer - entry points used by the desktop front-end.
//!
//! Actions come in through the recorder; state changes go out through the
//! event bridge.

pub mod events;
pub mod recorder;

pub use events::{EventBridge, EventCallback, Subscription};
pub use recorder::ActionRecorder;
