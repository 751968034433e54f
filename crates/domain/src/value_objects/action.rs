//! PatternAction - a normalized record of one user interaction
//!
//! Every front-end app (terminal, file manager, games, widgets) reports what
//! the user did as a `PatternAction`. The wire shape is
//! `{ "type": string, "value": any, "timestamp": ms-since-epoch }`; on the
//! Rust side the payload is a tagged union so matchers are total functions.
//!
//! Parsing is tolerant by construction: anything that does not fit a known
//! category becomes `ActionPayload::Unrecognized` and simply fails to match.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Type tag for terminal commands
pub const TERMINAL_COMMAND: &str = "terminal_command";
/// Type tag for file manager / viewer access
pub const FILE_ACCESS: &str = "file_access";
/// Type tag for generic clicks
pub const CLICK: &str = "click";

/// What was done to a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileOperation {
    Open,
    Read,
    Write,
    Delete,
    List,
    /// Unknown operation (for forward compatibility)
    Other(String),
}

impl FileOperation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for FileOperation {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "open" => Self::Open,
            "read" => Self::Read,
            "write" => Self::Write,
            "delete" => Self::Delete,
            "list" => Self::List,
            _ => Self::Other(value),
        }
    }
}

impl From<FileOperation> for String {
    fn from(value: FileOperation) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific payload of an action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPayload {
    TerminalCommand {
        command: String,
    },
    FileAccess {
        path: String,
        operation: FileOperation,
    },
    Click {
        x: f64,
        y: f64,
        app_id: Option<String>,
        /// Element the click landed on (e.g. "star-7", "desktop-icon")
        context: Option<String>,
    },
    /// App-specific event reported as `<appId>_<action>`
    AppAction {
        app_id: String,
        action: String,
        value: Value,
    },
    /// Anything the engine does not understand. Never matches a built-in filter.
    Unrecognized {
        kind: String,
        value: Value,
    },
}

impl ActionPayload {
    /// The wire `type` tag for this payload.
    pub fn kind(&self) -> Cow<'_, str> {
        match self {
            Self::TerminalCommand { .. } => Cow::Borrowed(TERMINAL_COMMAND),
            Self::FileAccess { .. } => Cow::Borrowed(FILE_ACCESS),
            Self::Click { .. } => Cow::Borrowed(CLICK),
            Self::AppAction { app_id, action, .. } => Cow::Owned(format!("{app_id}_{action}")),
            Self::Unrecognized { kind, .. } => Cow::Borrowed(kind.as_str()),
        }
    }

    /// Key used by distinct-counting rules: two actions with the same key
    /// are "the same thing done twice".
    pub fn distinct_key(&self) -> String {
        match self {
            Self::TerminalCommand { command } => command.trim().to_string(),
            Self::FileAccess { path, operation } => format!("{operation}:{path}"),
            Self::Click {
                x,
                y,
                app_id,
                context,
            } => match context {
                Some(context) => format!("{}:{}", app_id.as_deref().unwrap_or(""), context),
                None => format!("{}:{x}:{y}", app_id.as_deref().unwrap_or("")),
            },
            Self::AppAction {
                app_id,
                action,
                value,
            } => format!("{app_id}_{action}:{value}"),
            Self::Unrecognized { kind, value } => format!("{kind}:{value}"),
        }
    }

    /// Build a payload from a wire `type` tag and `value`.
    pub fn from_wire(kind: &str, value: Value) -> Self {
        match kind {
            TERMINAL_COMMAND => parse_command(value),
            FILE_ACCESS => parse_file_access(value),
            CLICK => parse_click(value),
            _ => match kind.split_once('_') {
                Some((app_id, action)) if !app_id.is_empty() && !action.is_empty() => {
                    Self::AppAction {
                        app_id: app_id.to_string(),
                        action: action.to_string(),
                        value,
                    }
                }
                _ => Self::Unrecognized {
                    kind: kind.to_string(),
                    value,
                },
            },
        }
    }

    /// The wire `value` for this payload.
    pub fn to_wire_value(&self) -> Value {
        match self {
            Self::TerminalCommand { command } => Value::String(command.clone()),
            Self::FileAccess { path, operation } => {
                json!({ "path": path, "action": operation.as_str() })
            }
            Self::Click {
                x,
                y,
                app_id,
                context,
            } => {
                let mut map = Map::new();
                map.insert("x".into(), json!(x));
                map.insert("y".into(), json!(y));
                if let Some(app_id) = app_id {
                    map.insert("appId".into(), Value::String(app_id.clone()));
                }
                if let Some(context) = context {
                    map.insert("elementContext".into(), Value::String(context.clone()));
                }
                Value::Object(map)
            }
            Self::AppAction { value, .. } | Self::Unrecognized { value, .. } => value.clone(),
        }
    }
}

fn parse_command(value: Value) -> ActionPayload {
    let command = match &value {
        Value::String(command) => Some(command.clone()),
        Value::Object(map) => map
            .get("command")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    match command {
        Some(command) => ActionPayload::TerminalCommand { command },
        None => unrecognized(TERMINAL_COMMAND, value),
    }
}

fn parse_file_access(value: Value) -> ActionPayload {
    let parsed = value.as_object().and_then(|map| {
        let path = map.get("path")?.as_str()?.to_string();
        // A missing action is treated as an open: viewers only report the path.
        let operation = match map.get("action") {
            Some(Value::String(op)) => FileOperation::from(op.clone()),
            None | Some(Value::Null) => FileOperation::Open,
            Some(_) => return None,
        };
        Some((path, operation))
    });
    match parsed {
        Some((path, operation)) => ActionPayload::FileAccess { path, operation },
        None => unrecognized(FILE_ACCESS, value),
    }
}

fn parse_click(value: Value) -> ActionPayload {
    let parsed = value.as_object().and_then(|map| {
        let x = map.get("x")?.as_f64()?;
        let y = map.get("y")?.as_f64()?;
        let app_id = map.get("appId").and_then(Value::as_str).map(str::to_string);
        let context = map
            .get("elementContext")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some((x, y, app_id, context))
    });
    match parsed {
        Some((x, y, app_id, context)) => ActionPayload::Click {
            x,
            y,
            app_id,
            context,
        },
        None => unrecognized(CLICK, value),
    }
}

fn unrecognized(kind: &str, value: Value) -> ActionPayload {
    ActionPayload::Unrecognized {
        kind: kind.to_string(),
        value,
    }
}

/// Raw wire shape of an action
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    timestamp: i64,
}

/// An immutable record of one user action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireAction", into = "WireAction")]
pub struct PatternAction {
    payload: ActionPayload,
    timestamp: DateTime<Utc>,
}

impl PatternAction {
    pub fn new(payload: ActionPayload, timestamp: DateTime<Utc>) -> Self {
        Self { payload, timestamp }
    }

    pub fn terminal_command(command: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            ActionPayload::TerminalCommand {
                command: command.into(),
            },
            timestamp,
        )
    }

    pub fn file_access(
        path: impl Into<String>,
        operation: FileOperation,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            ActionPayload::FileAccess {
                path: path.into(),
                operation,
            },
            timestamp,
        )
    }

    pub fn click(
        x: f64,
        y: f64,
        app_id: Option<String>,
        context: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            ActionPayload::Click {
                x,
                y,
                app_id,
                context,
            },
            timestamp,
        )
    }

    pub fn app_action(
        app_id: impl Into<String>,
        action: impl Into<String>,
        value: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            ActionPayload::AppAction {
                app_id: app_id.into(),
                action: action.into(),
                value,
            },
            timestamp,
        )
    }

    /// Build an action from its wire parts. Never fails.
    pub fn from_wire(kind: &str, value: Value, timestamp_ms: i64) -> Self {
        Self::new(
            ActionPayload::from_wire(kind, value),
            millis_to_datetime(timestamp_ms),
        )
    }

    #[inline]
    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    #[inline]
    pub fn kind(&self) -> Cow<'_, str> {
        self.payload.kind()
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Returns a copy re-stamped with `timestamp`.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

impl From<WireAction> for PatternAction {
    fn from(wire: WireAction) -> Self {
        Self::from_wire(&wire.kind, wire.value, wire.timestamp)
    }
}

impl From<PatternAction> for WireAction {
    fn from(action: PatternAction) -> Self {
        Self {
            kind: action.kind().into_owned(),
            value: action.payload.to_wire_value(),
            timestamp: action.timestamp_millis(),
        }
    }
}
