//! Action recorder - the single entry point for user actions.
//!
//! Front-end apps report what the user did here. Every call shapes a
//! `PatternAction`, stamps it, and feeds it to the engine under the
//! ingestion lock, so the order of lock acquisition is the order actions
//! are seen in.

use std::sync::Arc;

use retrodesk_domain::{FileOperation, PatternAction};
use serde_json::Value;

use crate::infrastructure::ports::ClockPort;
use crate::use_cases::patterns::{lock_engine, ActionOutcome, SharedEngine};

#[derive(Clone)]
pub struct ActionRecorder {
    engine: SharedEngine,
    clock: Arc<dyn ClockPort>,
}

impl ActionRecorder {
    pub fn new(engine: SharedEngine, clock: Arc<dyn ClockPort>) -> Self {
        Self { engine, clock }
    }

    /// Record one action. Never fails.
    ///
    /// Out-of-order timestamps are clamped forward by the engine.
    pub fn record_action(&self, action: PatternAction) -> ActionOutcome {
        lock_engine(&self.engine).record_action(&action)
    }

    pub fn record_terminal_command(&self, command: impl Into<String>) -> ActionOutcome {
        self.record_action(PatternAction::terminal_command(command, self.clock.now()))
    }

    pub fn record_file_access(
        &self,
        path: impl Into<String>,
        operation: FileOperation,
    ) -> ActionOutcome {
        self.record_action(PatternAction::file_access(path, operation, self.clock.now()))
    }

    pub fn record_click(
        &self,
        x: f64,
        y: f64,
        app_id: Option<String>,
        context: Option<String>,
    ) -> ActionOutcome {
        self.record_action(PatternAction::click(x, y, app_id, context, self.clock.now()))
    }

    pub fn record_app_action(
        &self,
        app_id: impl Into<String>,
        action: impl Into<String>,
        value: Value,
    ) -> ActionOutcome {
        self.record_action(PatternAction::app_action(
            app_id,
            action,
            value,
            self.clock.now(),
        ))
    }

    /// Record an action in wire form: `{"type", "value", "timestamp"}`.
    ///
    /// Input that is not a JSON object with a string `type` is dropped.
    /// A missing timestamp is filled in from the clock.
    pub fn record_raw(&self, raw: &str) -> Option<ActionOutcome> {
        let mut object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                tracing::debug!(value = %other, "Dropping non-object action");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Dropping unparseable action");
                return None;
            }
        };

        let Some(kind) = object.get("type").and_then(Value::as_str).map(str::to_string) else {
            tracing::debug!("Dropping action without a type");
            return None;
        };
        let value = object.remove("value").unwrap_or(Value::Null);
        let action = match object.get("timestamp").and_then(Value::as_i64) {
            Some(ms) => PatternAction::from_wire(&kind, value, ms),
            None => PatternAction::from_wire(&kind, value, 0).with_timestamp(self.clock.now()),
        };

        Some(self.record_action(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{DateTime, TimeZone, Utc};

    use crate::api::events::EventBridge;
    use crate::entities::catalogue::{ADMIN_SEQUENCE, DOS_SECRET, STARFIELD_CARTOGRAPHER};
    use crate::entities::Catalogue;
    use crate::infrastructure::ports::MockClockPort;
    use crate::stores::MysteryStore;
    use crate::use_cases::patterns::{CustomMatchers, PatternEngine};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1997, 3, 14, 12, 0, 0).unwrap()
    }

    fn recorder() -> (ActionRecorder, SharedEngine, Arc<MysteryStore>) {
        let catalogue = Catalogue::standard().unwrap();
        let bridge = EventBridge::new();
        let store = Arc::new(MysteryStore::new(Arc::new(catalogue.clues), bridge.clone()));
        let engine = Arc::new(Mutex::new(PatternEngine::new(
            Arc::new(catalogue.patterns),
            store.clone(),
            bridge,
            CustomMatchers::new(),
        )));

        let mut clock = MockClockPort::new();
        clock.expect_now().returning(now);

        (
            ActionRecorder::new(engine.clone(), Arc::new(clock)),
            engine,
            store,
        )
    }

    mod wrappers {
        use super::*;

        #[test]
        fn file_access_then_command_activates_admin_sequence() {
            let (recorder, engine, store) = recorder();

            recorder.record_file_access("/system/backup/admin.bak", FileOperation::Open);
            let outcome = recorder.record_terminal_command("admin THX1138");

            assert_eq!(outcome.activated.len(), 1);
            assert_eq!(outcome.activated[0].as_str(), ADMIN_SEQUENCE);
            assert!(lock_engine(&engine).is_pattern_active(ADMIN_SEQUENCE));
            assert!(store.has_discovered_clue("admin-access"));
        }

        #[test]
        fn clicks_are_stamped_by_the_clock() {
            let (recorder, engine, _) = recorder();
            recorder.record_click(4.0, 2.0, Some("starfield".into()), None);
            let engine = lock_engine(&engine);
            assert_eq!(engine.last_action_at(), Some(now()));
            assert_eq!(engine.pattern_progress(STARFIELD_CARTOGRAPHER), Some(0.25));
        }

        #[test]
        fn app_action_reaches_app_rules() {
            let (recorder, _, store) = recorder();
            let outcome = recorder.record_app_action("doom", "secret_found", Value::Null);
            assert_eq!(outcome.activated[0].as_str(), DOS_SECRET);
            assert!(store.has_discovered_clue("iddqd-note"));
        }
    }

    mod raw {
        use super::*;

        #[test]
        fn records_wire_actions() {
            let (recorder, engine, _) = recorder();
            let outcome = recorder
                .record_raw(r#"{"type":"click","value":{"x":1,"y":2,"appId":"starfield"},"timestamp":1000}"#)
                .unwrap();
            assert_eq!(outcome.progressed[0].as_str(), STARFIELD_CARTOGRAPHER);
            assert_eq!(
                lock_engine(&engine).last_action_at().map(|t| t.timestamp_millis()),
                Some(1000)
            );
        }

        #[test]
        fn missing_timestamp_uses_clock() {
            let (recorder, engine, _) = recorder();
            recorder.record_raw(r#"{"type":"terminal_command","value":"ls"}"#);
            assert_eq!(lock_engine(&engine).last_action_at(), Some(now()));
        }

        #[test]
        fn non_objects_are_dropped() {
            let (recorder, engine, _) = recorder();
            assert!(recorder.record_raw("[1, 2, 3]").is_none());
            assert!(recorder.record_raw("\"click\"").is_none());
            assert!(recorder.record_raw("not json").is_none());
            assert!(recorder.record_raw(r#"{"value": 1}"#).is_none());
            assert_eq!(lock_engine(&engine).last_action_at(), None);
        }

        #[test]
        fn unknown_types_are_recorded_without_effect() {
            let (recorder, _, store) = recorder();
            let outcome = recorder
                .record_raw(r#"{"type":"unknown_nonsense","value":{},"timestamp":5}"#)
                .unwrap();
            assert!(outcome.is_empty());
            assert!(!store.is_dirty());
        }
    }

    #[test]
    fn out_of_order_timestamps_are_clamped_forward() {
        let (recorder, engine, _) = recorder();
        let later = now() + chrono::Duration::seconds(30);

        recorder.record_action(PatternAction::terminal_command("ls", later));
        recorder.record_action(PatternAction::terminal_command("pwd", now()));

        assert_eq!(lock_engine(&engine).last_action_at(), Some(later));
    }

}
