//! Environment configuration for the engine binary.

use std::time::Duration;

const DEFAULT_SAVE_DB: &str = "retrodesk.db";
const DEFAULT_SAVE_SLOT: &str = "default";
const DEFAULT_AUTOSAVE_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// SQLite file holding save slots
    pub save_db: String,
    pub save_slot: String,
    /// `None` disables autosave
    pub autosave_interval: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            save_db: DEFAULT_SAVE_DB.to_string(),
            save_slot: DEFAULT_SAVE_SLOT.to_string(),
            autosave_interval: Some(Duration::from_secs(DEFAULT_AUTOSAVE_SECS)),
        }
    }
}

impl EngineConfig {
    /// Read `RETRODESK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank or invalid values fall back
    /// to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let save_db = non_empty("RETRODESK_SAVE_DB").unwrap_or(defaults.save_db);
        let save_slot = non_empty("RETRODESK_SAVE_SLOT").unwrap_or(defaults.save_slot);

        let autosave_interval = match non_empty("RETRODESK_AUTOSAVE_SECS") {
            None => defaults.autosave_interval,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => {
                    tracing::warn!(
                        value = %raw,
                        error = %e,
                        "Invalid RETRODESK_AUTOSAVE_SECS, using default"
                    );
                    defaults.autosave_interval
                }
            },
        };

        Self {
            save_db,
            save_slot,
            autosave_interval,
        }
    }
}
