//! Ordered-steps matcher with a sliding action-count window

use super::{CompiledFilter, Evaluation, Matcher};
use crate::error::MatchError;
use crate::value_objects::PatternAction;

/// Matches an ordered subsequence of steps spanning at most `window`
/// recorded actions (first and last step inclusive).
///
/// For each prefix length the matcher remembers only the freshest start
/// position, so state is bounded by the number of steps. Partial progress
/// whose start falls outside the window ages out; a newer attempt started
/// inside the window is never blocked by an older stale one.
#[derive(Debug, Clone)]
pub struct SequenceMatcher {
    steps: Vec<CompiledFilter>,
    window: u64,
    /// `partial[k]` = start index of the freshest partial match covering steps `0..=k`
    partial: Vec<Option<u64>>,
    /// Index of the next action to be evaluated
    position: u64,
}

impl SequenceMatcher {
    pub fn new(steps: Vec<CompiledFilter>, window: u32) -> Self {
        let len = steps.len();
        Self {
            steps,
            window: u64::from(window.max(1)),
            partial: vec![None; len],
            position: 0,
        }
    }

    fn expire(&mut self, index: u64) {
        let window = self.window;
        for slot in self.partial.iter_mut() {
            if let Some(start) = *slot {
                if index - start + 1 > window {
                    *slot = None;
                }
            }
        }
    }

    fn completed_steps(&self) -> usize {
        self.partial
            .iter()
            .rposition(Option::is_some)
            .map(|k| k + 1)
            .unwrap_or(0)
    }
}

impl Matcher for SequenceMatcher {
    fn evaluate(&mut self, action: &PatternAction) -> Result<Evaluation, MatchError> {
        let index = self.position;
        self.position += 1;

        if self.steps.is_empty() {
            return Ok(Evaluation::none());
        }

        self.expire(index);

        // Walk backwards so a single action advances each attempt by one step only.
        for k in (0..self.steps.len()).rev() {
            if !self.steps[k].matches(action.payload()) {
                continue;
            }
            let start = if k == 0 { Some(index) } else { self.partial[k - 1] };
            if let Some(start) = start {
                self.partial[k] = Some(self.partial[k].map_or(start, |old| old.max(start)));
            }
        }

        let last = self.steps.len() - 1;
        if self.partial[last].is_some() {
            self.partial.iter_mut().for_each(|slot| *slot = None);
            return Ok(Evaluation::complete());
        }

        Ok(Evaluation::ratio(self.completed_steps(), self.steps.len()))
    }

    fn reset(&mut self) {
        self.partial.iter_mut().for_each(|slot| *slot = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ActionFilter;
    use crate::value_objects::{FileOperation, TextMatch};
    use chrono::{TimeZone, Utc};

    fn at(ms: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().unwrap()
    }

    fn cmd(text: &str) -> PatternAction {
        PatternAction::terminal_command(text, at(0))
    }

    fn admin_matcher(window: u32) -> SequenceMatcher {
        SequenceMatcher::new(
            vec![
                ActionFilter::file_access(
                    TextMatch::exact("/system/backup/admin.bak"),
                    Some(FileOperation::Open),
                )
                .compile()
                .unwrap(),
                ActionFilter::command(TextMatch::exact("admin THX1138"))
                    .compile()
                    .unwrap(),
            ],
            window,
        )
    }

    fn open_backup() -> PatternAction {
        PatternAction::file_access("/system/backup/admin.bak", FileOperation::Open, at(0))
    }

    #[test]
    fn ordered_steps_complete() {
        let mut m = admin_matcher(5);
        let first = m.evaluate(&open_backup()).unwrap();
        assert_eq!(first.progress, 0.5);
        assert!(!first.matched);

        let second = m.evaluate(&cmd("admin THX1138")).unwrap();
        assert!(second.matched);
        assert_eq!(second.progress, 1.0);
    }

    #[test]
    fn out_of_order_does_not_match() {
        let mut m = admin_matcher(5);
        assert_eq!(m.evaluate(&cmd("admin THX1138")).unwrap(), Evaluation::none());
        let after = m.evaluate(&open_backup()).unwrap();
        assert!(!after.matched);
        assert_eq!(after.progress, 0.5);
    }

    #[test]
    fn unrelated_actions_in_between_are_tolerated() {
        let mut m = admin_matcher(5);
        m.evaluate(&open_backup()).unwrap();
        m.evaluate(&cmd("ls")).unwrap();
        m.evaluate(&cmd("help")).unwrap();
        assert!(m.evaluate(&cmd("admin THX1138")).unwrap().matched);
    }

    #[test]
    fn partial_progress_ages_out_of_window() {
        let mut m = admin_matcher(3);
        m.evaluate(&open_backup()).unwrap();
        m.evaluate(&cmd("ls")).unwrap();
        let third = m.evaluate(&cmd("pwd")).unwrap();
        assert_eq!(third.progress, 0.5);

        // Fourth action is outside the 3-action window that started at the open.
        let late = m.evaluate(&cmd("admin THX1138")).unwrap();
        assert!(!late.matched);
        assert_eq!(late.progress, 0.0);
    }

    #[test]
    fn fresher_start_inside_window_still_matches() {
        let mut m = admin_matcher(3);
        m.evaluate(&open_backup()).unwrap(); // 0
        m.evaluate(&cmd("ls")).unwrap(); // 1
        m.evaluate(&open_backup()).unwrap(); // 2
        m.evaluate(&cmd("pwd")).unwrap(); // 3, first attempt expired
        assert!(m.evaluate(&cmd("admin THX1138")).unwrap().matched); // 4
    }

    #[test]
    fn one_action_cannot_satisfy_two_steps() {
        let step = ActionFilter::command(TextMatch::exact("knock")).compile().unwrap();
        let mut m = SequenceMatcher::new(vec![step.clone(), step.clone(), step], 10);
        assert_eq!(m.evaluate(&cmd("knock")).unwrap().progress, 1.0 / 3.0);
        assert_eq!(m.evaluate(&cmd("knock")).unwrap().progress, 2.0 / 3.0);
        assert!(m.evaluate(&cmd("knock")).unwrap().matched);
    }

    #[test]
    fn reset_clears_partial_state() {
        let mut m = admin_matcher(5);
        m.evaluate(&open_backup()).unwrap();
        m.reset();
        assert!(!m.evaluate(&cmd("admin THX1138")).unwrap().matched);
    }
}
