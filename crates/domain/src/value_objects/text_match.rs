//! Text predicates used by action filters

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// How a piece of action text (command, path, element context) is compared.
///
/// Everything except `Exact` and `Prefix` is case-insensitive. Input is
/// trimmed before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "text")]
pub enum TextMatch {
    Exact(String),
    IgnoreCase(String),
    Prefix(String),
    /// Case-insensitive substring (keyword) match
    Contains(String),
    Regex(String),
}

impl TextMatch {
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    pub fn ignore_case(text: impl Into<String>) -> Self {
        Self::IgnoreCase(text.into())
    }

    pub fn prefix(text: impl Into<String>) -> Self {
        Self::Prefix(text.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(pattern.into())
    }

    /// Compile into a reusable matcher. Fails only for invalid regexes.
    pub fn compile(&self) -> Result<CompiledText, DomainError> {
        Ok(match self {
            Self::Exact(text) => CompiledText::Exact(text.trim().to_string()),
            Self::IgnoreCase(text) => CompiledText::IgnoreCase(text.trim().to_lowercase()),
            Self::Prefix(text) => CompiledText::Prefix(text.trim().to_string()),
            Self::Contains(text) => CompiledText::Contains(text.trim().to_lowercase()),
            Self::Regex(pattern) => CompiledText::Regex(
                regex_lite::Regex::new(pattern)
                    .map_err(|e| DomainError::validation(format!("Invalid regex '{}': {}", pattern, e)))?,
            ),
        })
    }
}

/// A `TextMatch` ready for repeated evaluation
#[derive(Debug, Clone)]
pub enum CompiledText {
    Exact(String),
    IgnoreCase(String),
    Prefix(String),
    Contains(String),
    Regex(regex_lite::Regex),
}

impl CompiledText {
    pub fn is_match(&self, input: &str) -> bool {
        let input = input.trim();
        match self {
            Self::Exact(text) => input == text,
            Self::IgnoreCase(text) => input.to_lowercase() == *text,
            Self::Prefix(text) => input.starts_with(text.as_str()),
            Self::Contains(text) => input.to_lowercase().contains(text.as_str()),
            Self::Regex(re) => re.is_match(input),
        }
    }
}
