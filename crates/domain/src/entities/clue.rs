//! Clue entity - a discoverable piece of the mystery
//!
//! Clues are static content created at data-load time. Whether one has been
//! discovered is runtime state owned by the mystery store, not the clue.

use serde::{Deserialize, Serialize};

use crate::ids::ClueId;
use crate::value_objects::ClueTitle;

/// A narrative unit the player can uncover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    pub id: ClueId,
    pub title: ClueTitle,
    pub category: ClueCategory,
    #[serde(default)]
    pub display: ClueDisplay,
    /// Misleading on purpose. Still discoverable like any other clue.
    #[serde(default)]
    pub red_herring: bool,
    pub content: String,
}

/// Where the clue lives in the fiction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueCategory {
    Journal,
    Email,
    SystemLog,
    HiddenFile,
    Metadata,
    /// Unknown category (for forward compatibility)
    #[serde(other)]
    Unknown,
}

/// How prominently the journal shows the clue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueDisplay {
    #[default]
    Normal,
    Important,
    Secret,
}

impl Clue {
    pub fn new(
        id: ClueId,
        title: ClueTitle,
        category: ClueCategory,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title,
            category,
            display: ClueDisplay::Normal,
            red_herring: false,
            content: content.into(),
        }
    }

    pub fn with_display(mut self, display: ClueDisplay) -> Self {
        self.display = display;
        self
    }

    pub fn as_red_herring(mut self) -> Self {
        self.red_herring = true;
        self
    }

    pub fn is_secret(&self) -> bool {
        self.display == ClueDisplay::Secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clue() -> Clue {
        Clue::new(
            ClueId::new("admin-access").unwrap(),
            ClueTitle::new("Admin Access").unwrap(),
            ClueCategory::SystemLog,
            "Privileges escalated.",
        )
    }

    #[test]
    fn builder_sets_flags() {
        let clue = clue().with_display(ClueDisplay::Secret).as_red_herring();
        assert!(clue.is_secret());
        assert!(clue.red_herring);
    }

    #[test]
    fn unknown_category_deserializes() {
        let json = serde_json::json!({
            "id": "x",
            "title": "X",
            "category": "voicemail",
            "content": ""
        });
        let clue: Clue = serde_json::from_value(json).unwrap();
        assert_eq!(clue.category, ClueCategory::Unknown);
        assert_eq!(clue.display, ClueDisplay::Normal);
        assert!(!clue.red_herring);
    }
}
