//! Single-action predicates shared by every rule primitive

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{ActionPayload, CompiledText, FileOperation, TextMatch};

/// Predicate over one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "on")]
pub enum ActionFilter {
    /// Any recognised action whose wire tag equals `tag`
    Kind { tag: String },
    /// Terminal command text
    Command { text: TextMatch },
    /// File access on a matching path, optionally with a specific operation
    FileAccess {
        path: TextMatch,
        #[serde(default)]
        operation: Option<FileOperation>,
    },
    /// Click, optionally restricted to an app and an element context
    Click {
        #[serde(default)]
        app_id: Option<String>,
        #[serde(default)]
        context: Option<TextMatch>,
    },
    /// App-specific action (`<appId>_<action>`)
    App {
        app_id: String,
        #[serde(default)]
        action: Option<String>,
    },
}

impl ActionFilter {
    pub fn kind(tag: impl Into<String>) -> Self {
        Self::Kind { tag: tag.into() }
    }

    pub fn command(text: TextMatch) -> Self {
        Self::Command { text }
    }

    pub fn file_access(path: TextMatch, operation: Option<FileOperation>) -> Self {
        Self::FileAccess { path, operation }
    }

    pub fn click_in(app_id: impl Into<String>) -> Self {
        Self::Click {
            app_id: Some(app_id.into()),
            context: None,
        }
    }

    pub fn app(app_id: impl Into<String>, action: Option<&str>) -> Self {
        Self::App {
            app_id: app_id.into(),
            action: action.map(str::to_string),
        }
    }

    pub fn compile(&self) -> Result<CompiledFilter, DomainError> {
        Ok(match self {
            Self::Kind { tag } => {
                if tag.trim().is_empty() {
                    return Err(DomainError::validation("Kind filter tag cannot be empty"));
                }
                CompiledFilter::Kind(tag.trim().to_string())
            }
            Self::Command { text } => CompiledFilter::Command(text.compile()?),
            Self::FileAccess { path, operation } => CompiledFilter::FileAccess {
                path: path.compile()?,
                operation: operation.clone(),
            },
            Self::Click { app_id, context } => CompiledFilter::Click {
                app_id: app_id.clone(),
                context: context.as_ref().map(TextMatch::compile).transpose()?,
            },
            Self::App { app_id, action } => CompiledFilter::App {
                app_id: app_id.clone(),
                action: action.clone(),
            },
        })
    }
}

/// An `ActionFilter` ready for repeated evaluation
#[derive(Debug, Clone)]
pub enum CompiledFilter {
    Kind(String),
    Command(CompiledText),
    FileAccess {
        path: CompiledText,
        operation: Option<FileOperation>,
    },
    Click {
        app_id: Option<String>,
        context: Option<CompiledText>,
    },
    App {
        app_id: String,
        action: Option<String>,
    },
}

impl CompiledFilter {
    /// Unrecognized payloads never match anything.
    pub fn matches(&self, payload: &ActionPayload) -> bool {
        if matches!(payload, ActionPayload::Unrecognized { .. }) {
            return false;
        }

        match (self, payload) {
            (Self::Kind(tag), payload) => payload.kind() == tag.as_str(),
            (Self::Command(text), ActionPayload::TerminalCommand { command }) => {
                text.is_match(command)
            }
            (
                Self::FileAccess { path, operation },
                ActionPayload::FileAccess {
                    path: actual_path,
                    operation: actual_op,
                },
            ) => path.is_match(actual_path) && operation.as_ref().is_none_or(|op| op == actual_op),
            (
                Self::Click { app_id, context },
                ActionPayload::Click {
                    app_id: actual_app,
                    context: actual_context,
                    ..
                },
            ) => {
                let app_ok = app_id
                    .as_deref()
                    .is_none_or(|want| actual_app.as_deref() == Some(want));
                let context_ok = context.as_ref().is_none_or(|want| {
                    actual_context
                        .as_deref()
                        .map(|ctx| want.is_match(ctx))
                        .unwrap_or(false)
                });
                app_ok && context_ok
            }
            (
                Self::App { app_id, action },
                ActionPayload::AppAction {
                    app_id: actual_app,
                    action: actual_action,
                    ..
                },
            ) => {
                app_id == actual_app
                    && action.as_deref().is_none_or(|want| want == actual_action)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiled(filter: ActionFilter) -> CompiledFilter {
        filter.compile().unwrap()
    }

    #[test]
    fn command_filter_only_sees_commands() {
        let f = compiled(ActionFilter::command(TextMatch::exact("ls")));
        assert!(f.matches(&ActionPayload::TerminalCommand {
            command: "ls".into()
        }));
        assert!(!f.matches(&ActionPayload::FileAccess {
            path: "ls".into(),
            operation: FileOperation::Open
        }));
    }

    #[test]
    fn file_filter_checks_operation_when_given() {
        let f = compiled(ActionFilter::file_access(
            TextMatch::exact("/system/backup/admin.bak"),
            Some(FileOperation::Open),
        ));
        assert!(f.matches(&ActionPayload::FileAccess {
            path: "/system/backup/admin.bak".into(),
            operation: FileOperation::Open,
        }));
        assert!(!f.matches(&ActionPayload::FileAccess {
            path: "/system/backup/admin.bak".into(),
            operation: FileOperation::Delete,
        }));
    }

    #[test]
    fn click_filter_requires_app() {
        let f = compiled(ActionFilter::click_in("starfield"));
        assert!(f.matches(&ActionPayload::Click {
            x: 0.0,
            y: 0.0,
            app_id: Some("starfield".into()),
            context: None,
        }));
        assert!(!f.matches(&ActionPayload::Click {
            x: 0.0,
            y: 0.0,
            app_id: Some("calculator".into()),
            context: None,
        }));
        assert!(!f.matches(&ActionPayload::Click {
            x: 0.0,
            y: 0.0,
            app_id: None,
            context: None,
        }));
    }

    #[test]
    fn click_context_must_be_present_when_required() {
        let f = compiled(ActionFilter::Click {
            app_id: None,
            context: Some(TextMatch::prefix("star-")),
        });
        assert!(f.matches(&ActionPayload::Click {
            x: 0.0,
            y: 0.0,
            app_id: None,
            context: Some("star-9".into()),
        }));
        assert!(!f.matches(&ActionPayload::Click {
            x: 0.0,
            y: 0.0,
            app_id: None,
            context: None,
        }));
    }

    #[test]
    fn app_filter_with_and_without_action() {
        let payload = ActionPayload::AppAction {
            app_id: "doom".into(),
            action: "secret_found".into(),
            value: json!({}),
        };
        assert!(compiled(ActionFilter::app("doom", None)).matches(&payload));
        assert!(compiled(ActionFilter::app("doom", Some("secret_found"))).matches(&payload));
        assert!(!compiled(ActionFilter::app("doom", Some("died"))).matches(&payload));
    }

    #[test]
    fn kind_filter_ignores_unrecognized_payloads() {
        let f = compiled(ActionFilter::kind("file_access"));
        assert!(!f.matches(&ActionPayload::Unrecognized {
            kind: "file_access".into(),
            value: json!(42),
        }));
        assert!(f.matches(&ActionPayload::FileAccess {
            path: "/x".into(),
            operation: FileOperation::Read,
        }));
    }
}
