//! Co-occurrence matcher over a wall-clock window

use chrono::{DateTime, Duration, Utc};

use super::{CompiledFilter, Evaluation, Matcher};
use crate::error::MatchError;
use crate::value_objects::PatternAction;

/// Satisfied when every filter has a matching action no older than
/// `within` relative to the action being evaluated. Order does not matter.
/// Occurrences stamped after the evaluated action do not count.
#[derive(Debug, Clone)]
pub struct AllWithinMatcher {
    filters: Vec<CompiledFilter>,
    within: Duration,
    last_seen: Vec<Option<DateTime<Utc>>>,
}

impl AllWithinMatcher {
    pub fn new(filters: Vec<CompiledFilter>, within_ms: i64) -> Self {
        let len = filters.len();
        Self {
            filters,
            within: Duration::milliseconds(within_ms.max(0)),
            last_seen: vec![None; len],
        }
    }
}

impl Matcher for AllWithinMatcher {
    fn evaluate(&mut self, action: &PatternAction) -> Result<Evaluation, MatchError> {
        let now = action.timestamp();
        for (filter, seen) in self.filters.iter().zip(self.last_seen.iter_mut()) {
            if filter.matches(action.payload()) {
                *seen = Some(now);
            }
        }

        let fresh = self
            .last_seen
            .iter()
            .filter(|seen| seen.is_some_and(|t| t <= now && now - t <= self.within))
            .count();

        let evaluation = Evaluation::ratio(fresh, self.filters.len());
        if evaluation.matched {
            self.reset();
        }
        Ok(evaluation)
    }

    fn reset(&mut self) {
        self.last_seen.iter_mut().for_each(|seen| *seen = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ActionFilter;
    use crate::value_objects::TextMatch;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    fn matcher() -> AllWithinMatcher {
        AllWithinMatcher::new(
            vec![
                ActionFilter::command(TextMatch::exact("decode")).compile().unwrap(),
                ActionFilter::app("radio", Some("tuned")).compile().unwrap(),
            ],
            10_000,
        )
    }

    #[test]
    fn both_inside_window_in_any_order() {
        let mut m = matcher();
        let tuned = PatternAction::app_action("radio", "tuned", serde_json::Value::Null, at(1_000));
        assert_eq!(m.evaluate(&tuned).unwrap().progress, 0.5);
        let decode = PatternAction::terminal_command("decode", at(5_000));
        assert!(m.evaluate(&decode).unwrap().matched);
    }

    #[test]
    fn stale_occurrence_does_not_count() {
        let mut m = matcher();
        m.evaluate(&PatternAction::terminal_command("decode", at(0)))
            .unwrap();
        let late = PatternAction::app_action("radio", "tuned", serde_json::Value::Null, at(20_000));
        let evaluation = m.evaluate(&late).unwrap();
        assert!(!evaluation.matched);
        assert_eq!(evaluation.progress, 0.5);
    }

    #[test]
    fn occurrence_after_the_evaluated_action_does_not_count() {
        let mut m = matcher();
        m.evaluate(&PatternAction::terminal_command("decode", at(100_000)))
            .unwrap();
        let earlier = PatternAction::app_action("radio", "tuned", serde_json::Value::Null, at(0));
        let evaluation = m.evaluate(&earlier).unwrap();
        assert!(!evaluation.matched);
        assert_eq!(evaluation.progress, 0.5);
    }
}
