//! Pattern use cases - matching recorded actions against the registry and
//! applying what activations unlock.

mod effects;
mod engine;
mod tracker;

use std::sync::{Arc, Mutex, MutexGuard};

pub use effects::{ApplyEffects, EffectResult, EffectSummary};
pub use engine::{ActionOutcome, PatternEngine};
pub use tracker::{CustomMatchers, MatcherFactory};

/// The engine behind the single ingestion lock.
pub type SharedEngine = Arc<Mutex<PatternEngine>>;

/// Lock the engine. A panic in a subscriber callback must not wedge the game,
/// so a poisoned lock is recovered.
pub fn lock_engine(engine: &Mutex<PatternEngine>) -> MutexGuard<'_, PatternEngine> {
    engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
