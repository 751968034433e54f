//! Per-pattern runtime state and custom matcher lookup.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use retrodesk_domain::{
    Evaluation, MatchError, Matcher, PatternAction, PatternDefinition, PatternId,
};

/// Builds a fresh matcher for a `MatchRule::Custom` key.
pub type MatcherFactory = Arc<dyn Fn() -> Box<dyn Matcher> + Send + Sync>;

/// Caller-supplied matchers for custom rules, keyed by rule key.
#[derive(Clone, Default)]
pub struct CustomMatchers {
    factories: HashMap<String, MatcherFactory>,
}

impl CustomMatchers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Matcher> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(factory));
        self
    }

    pub fn build(&self, key: &str) -> Option<Box<dyn Matcher>> {
        self.factories.get(key).map(|factory| factory())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Progress and matcher state for one pattern.
pub(crate) struct PatternTracker {
    pub id: PatternId,
    /// `None` when the rule could not be built; the pattern never progresses.
    matcher: Option<Box<dyn Matcher>>,
    pub progress: f32,
    pub active: bool,
}

impl PatternTracker {
    /// Build trackers for every definition, in order.
    ///
    /// Unresolvable custom keys are warned about once per key for the
    /// lifetime of `warned`.
    pub fn build_all(
        definitions: &[PatternDefinition],
        custom: &CustomMatchers,
        warned: &mut HashSet<String>,
    ) -> Vec<Self> {
        definitions
            .iter()
            .map(|definition| Self {
                id: definition.id.clone(),
                matcher: build_matcher(definition, custom, warned),
                progress: 0.0,
                active: false,
            })
            .collect()
    }

    /// `Ok(None)` when there is no matcher to consult.
    ///
    /// A panicking matcher is reported as `MatchError::Evaluation` and its
    /// partial state is reset. If the reset panics too the matcher is
    /// dropped and the pattern stops progressing.
    pub fn evaluate(&mut self, action: &PatternAction) -> Result<Option<Evaluation>, MatchError> {
        let Some(matcher) = self.matcher.as_mut() else {
            return Ok(None);
        };

        match panic::catch_unwind(AssertUnwindSafe(|| matcher.evaluate(action))) {
            Ok(result) => result.map(Some),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if panic::catch_unwind(AssertUnwindSafe(|| matcher.reset())).is_err() {
                    tracing::warn!(
                        pattern_id = %self.id,
                        "Matcher panicked on reset, disabling pattern"
                    );
                    self.matcher = None;
                }
                Err(MatchError::evaluation(
                    self.id.as_str(),
                    format!("matcher panicked: {message}"),
                ))
            }
        }
    }

    /// Keys already counted by a distinct rule.
    pub fn seen_keys(&self) -> Vec<String> {
        self.matcher
            .as_ref()
            .map(|matcher| matcher.seen_keys())
            .unwrap_or_default()
    }

    /// Adopt persisted state after a load.
    pub fn resume(&mut self, progress: f32, active: bool, seen_keys: &[String]) {
        self.active = active;
        self.progress = if active { 1.0 } else { progress.clamp(0.0, 1.0) };
        if let Some(matcher) = self.matcher.as_mut() {
            matcher.reset();
            if !active && (self.progress > 0.0 || !seen_keys.is_empty()) {
                matcher.resume(self.progress, seen_keys);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn build_matcher(
    definition: &PatternDefinition,
    custom: &CustomMatchers,
    warned: &mut HashSet<String>,
) -> Option<Box<dyn Matcher>> {
    if let Some(key) = definition.rule.custom_key() {
        let matcher = custom.build(key);
        if matcher.is_none() && warned.insert(key.to_string()) {
            tracing::warn!(
                pattern_id = %definition.id,
                key = %key,
                "No custom matcher registered, pattern will not progress"
            );
        }
        return matcher;
    }

    match definition.rule.build() {
        Ok(matcher) => Some(matcher),
        Err(e) => {
            tracing::warn!(
                pattern_id = %definition.id,
                error = %e,
                "Failed to build matcher, pattern will not progress"
            );
            None
        }
    }
}
