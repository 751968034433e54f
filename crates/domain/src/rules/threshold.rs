//! Counting matcher

use std::collections::HashSet;

use super::{CompiledFilter, Evaluation, Matcher};
use crate::error::MatchError;
use crate::value_objects::PatternAction;

/// Counts actions matching a filter until `target` is reached.
///
/// In distinct mode only previously unseen `distinct_key`s count. The key
/// set stops growing once the target is reached, so it never holds more
/// than `target` entries.
#[derive(Debug, Clone)]
pub struct ThresholdMatcher {
    filter: CompiledFilter,
    target: u32,
    distinct: bool,
    count: u32,
    seen: HashSet<String>,
}

impl ThresholdMatcher {
    pub fn new(filter: CompiledFilter, target: u32, distinct: bool) -> Self {
        Self {
            filter,
            target: target.max(1),
            distinct,
            count: 0,
            seen: HashSet::new(),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Matcher for ThresholdMatcher {
    fn evaluate(&mut self, action: &PatternAction) -> Result<Evaluation, MatchError> {
        if self.count < self.target && self.filter.matches(action.payload()) {
            let counts = !self.distinct || self.seen.insert(action.payload().distinct_key());
            if counts {
                self.count += 1;
            }
        }
        Ok(Evaluation::ratio(self.count as usize, self.target as usize))
    }

    /// Restores the count from `progress`, or from `seen_keys` in distinct
    /// mode when that is higher. Saves without keys still resume their count.
    fn resume(&mut self, progress: f32, seen_keys: &[String]) {
        let restored = (progress.clamp(0.0, 1.0) * self.target as f32).floor() as u32;
        if self.distinct {
            for key in seen_keys.iter().take(self.target as usize) {
                self.seen.insert(key.clone());
            }
        }
        let from_keys = if self.distinct { self.seen.len() as u32 } else { 0 };
        self.count = self.count.max(restored).max(from_keys).min(self.target);
    }

    fn seen_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.seen.iter().cloned().collect();
        keys.sort();
        keys
    }

    fn reset(&mut self) {
        self.count = 0;
        self.seen.clear();
    }
}
