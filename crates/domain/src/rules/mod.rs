//! Match rules - declarative pattern conditions and their stateful matchers
//!
//! A `MatchRule` is plain data stored on a pattern definition. Building it
//! yields a `Matcher` that owns the bounded state needed to evaluate one
//! action at a time (a step cursor, a counter, last-seen timestamps). No
//! matcher keeps unbounded action history.

mod all_within;
mod filter;
mod sequence;
mod threshold;

pub use all_within::AllWithinMatcher;
pub use filter::{ActionFilter, CompiledFilter};
pub use sequence::SequenceMatcher;
pub use threshold::ThresholdMatcher;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, MatchError};
use crate::value_objects::PatternAction;

/// Result of feeding one action to a matcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// Current completion fraction in `[0, 1]`
    pub progress: f32,
    /// The full condition was satisfied by this action
    pub matched: bool,
}

impl Evaluation {
    pub fn partial(progress: f32) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            matched: false,
        }
    }

    pub fn complete() -> Self {
        Self {
            progress: 1.0,
            matched: true,
        }
    }

    pub fn none() -> Self {
        Self::partial(0.0)
    }

    /// Ratio helper used by counting matchers. `total == 0` yields 0.
    pub fn ratio(done: usize, total: usize) -> Self {
        if total == 0 {
            return Self::none();
        }
        if done >= total {
            return Self::complete();
        }
        Self::partial(done as f32 / total as f32)
    }
}

/// Stateful evaluator for a single pattern.
///
/// Implementations must be total over every `ActionPayload` variant and
/// must only keep state bounded by their rule definition.
pub trait Matcher: Send {
    fn evaluate(&mut self, action: &PatternAction) -> Result<Evaluation, MatchError>;

    /// Seed internal state from previously persisted progress and the keys
    /// returned by `seen_keys` at save time.
    ///
    /// Only counting rules can meaningfully resume; the default ignores it.
    fn resume(&mut self, _progress: f32, _seen_keys: &[String]) {}

    /// Keys a distinct rule has already counted, persisted with the save.
    fn seen_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Forget all partial state.
    fn reset(&mut self);
}

/// Declarative condition attached to a pattern definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum MatchRule {
    /// Steps must occur in order; the whole sequence must fit within
    /// `window` consecutive recorded actions.
    Sequence {
        steps: Vec<ActionFilter>,
        window: u32,
    },
    /// `count` occurrences of actions matching `filter`. With `distinct`,
    /// repeats of the same action count once.
    Threshold {
        filter: ActionFilter,
        count: u32,
        #[serde(default)]
        distinct: bool,
    },
    /// Every filter must have been seen within `within_ms` of the newest action.
    AllWithin {
        filters: Vec<ActionFilter>,
        within_ms: i64,
    },
    /// Matcher supplied at runtime and looked up by `key`
    Custom { key: String },
}

impl MatchRule {
    pub fn sequence(steps: Vec<ActionFilter>, window: u32) -> Self {
        Self::Sequence { steps, window }
    }

    pub fn threshold(filter: ActionFilter, count: u32) -> Self {
        Self::Threshold {
            filter,
            count,
            distinct: false,
        }
    }

    pub fn distinct_threshold(filter: ActionFilter, count: u32) -> Self {
        Self::Threshold {
            filter,
            count,
            distinct: true,
        }
    }

    pub fn all_within(filters: Vec<ActionFilter>, within_ms: i64) -> Self {
        Self::AllWithin { filters, within_ms }
    }

    pub fn custom(key: impl Into<String>) -> Self {
        Self::Custom { key: key.into() }
    }

    /// Key of a runtime-supplied matcher, if this rule needs one.
    pub fn custom_key(&self) -> Option<&str> {
        match self {
            Self::Custom { key } => Some(key.as_str()),
            _ => None,
        }
    }

    /// Check the rule shape without building state.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Sequence { steps, window } => {
                if steps.is_empty() {
                    return Err(DomainError::validation(
                        "Sequence rule needs at least one step",
                    ));
                }
                if (*window as usize) < steps.len() {
                    return Err(DomainError::validation(format!(
                        "Sequence window ({}) is shorter than its {} steps",
                        window,
                        steps.len()
                    )));
                }
                for step in steps {
                    step.compile()?;
                }
            }
            Self::Threshold { filter, count, .. } => {
                if *count == 0 {
                    return Err(DomainError::validation(
                        "Threshold rule count must be at least 1",
                    ));
                }
                filter.compile()?;
            }
            Self::AllWithin { filters, within_ms } => {
                if filters.is_empty() {
                    return Err(DomainError::validation(
                        "AllWithin rule needs at least one filter",
                    ));
                }
                if *within_ms <= 0 {
                    return Err(DomainError::validation(
                        "AllWithin window must be positive",
                    ));
                }
                for filter in filters {
                    filter.compile()?;
                }
            }
            Self::Custom { key } => {
                if key.trim().is_empty() {
                    return Err(DomainError::validation("Custom rule key cannot be empty"));
                }
            }
        }
        Ok(())
    }

    /// Build a fresh matcher for a built-in rule.
    ///
    /// Custom rules cannot be built here; the caller resolves them from its
    /// own registry using `custom_key`.
    pub fn build(&self) -> Result<Box<dyn Matcher>, DomainError> {
        self.validate()?;
        Ok(match self {
            Self::Sequence { steps, window } => Box::new(SequenceMatcher::new(
                compile_all(steps)?,
                *window,
            )),
            Self::Threshold {
                filter,
                count,
                distinct,
            } => Box::new(ThresholdMatcher::new(filter.compile()?, *count, *distinct)),
            Self::AllWithin { filters, within_ms } => Box::new(AllWithinMatcher::new(
                compile_all(filters)?,
                *within_ms,
            )),
            Self::Custom { key } => {
                return Err(DomainError::constraint(format!(
                    "Custom rule '{}' must be resolved by the caller",
                    key
                )))
            }
        })
    }
}

fn compile_all(filters: &[ActionFilter]) -> Result<Vec<CompiledFilter>, DomainError> {
    filters.iter().map(ActionFilter::compile).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::TextMatch;

    mod validation {
        use super::*;

        #[test]
        fn empty_sequence_is_rejected() {
            assert!(MatchRule::sequence(vec![], 3).validate().is_err());
        }

        #[test]
        fn window_shorter_than_steps_is_rejected() {
            let rule = MatchRule::sequence(
                vec![
                    ActionFilter::command(TextMatch::exact("a")),
                    ActionFilter::command(TextMatch::exact("b")),
                ],
                1,
            );
            assert!(matches!(rule.validate(), Err(DomainError::Validation(_))));
        }

        #[test]
        fn zero_threshold_is_rejected() {
            let rule = MatchRule::threshold(ActionFilter::click_in("starfield"), 0);
            assert!(rule.validate().is_err());
        }

        #[test]
        fn invalid_regex_in_filter_is_rejected() {
            let rule = MatchRule::threshold(ActionFilter::command(TextMatch::regex("(")), 2);
            assert!(rule.validate().is_err());
        }

        #[test]
        fn custom_rule_cannot_be_built_directly() {
            let rule = MatchRule::custom("konami");
            assert!(rule.validate().is_ok());
            assert_eq!(rule.custom_key(), Some("konami"));
            assert!(matches!(rule.build(), Err(DomainError::Constraint(_))));
        }
    }

    mod evaluation {
        use super::*;

        #[test]
        fn ratio_saturates_and_handles_zero() {
            assert_eq!(Evaluation::ratio(0, 0), Evaluation::none());
            assert_eq!(Evaluation::ratio(5, 4), Evaluation::complete());
            assert_eq!(Evaluation::ratio(1, 4).progress, 0.25);
            assert!(!Evaluation::ratio(3, 4).matched);
        }
    }

    mod serde_shape {
        use super::*;

        #[test]
        fn rule_round_trips_through_json() {
            let rule = MatchRule::distinct_threshold(ActionFilter::click_in("starfield"), 4);
            let json = serde_json::to_value(&rule).unwrap();
            assert_eq!(json["rule"], "threshold");
            assert_eq!(json["filter"]["on"], "click");
            let back: MatchRule = serde_json::from_value(json).unwrap();
            assert_eq!(back, rule);
        }
    }
}
