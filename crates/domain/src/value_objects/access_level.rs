//! Access level - ordered gate for terminal-style commands

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Ordered access level: `Default < User < Admin < System`.
///
/// Raised by pattern activations or authentication-style checks, never
/// lowered automatically.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessLevel {
    #[default]
    Default,
    User,
    Admin,
    System,
}

impl AccessLevel {
    /// Returns true if this level grants what `required` asks for.
    pub fn permits(self, required: AccessLevel) -> bool {
        self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "SYSTEM" => Ok(Self::System),
            other => Err(DomainError::parse(format!("Unknown access level: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(AccessLevel::Default < AccessLevel::User);
        assert!(AccessLevel::User < AccessLevel::Admin);
        assert!(AccessLevel::Admin < AccessLevel::System);
    }

    #[test]
    fn permits_equal_or_lower() {
        assert!(AccessLevel::Admin.permits(AccessLevel::User));
        assert!(AccessLevel::Admin.permits(AccessLevel::Admin));
        assert!(!AccessLevel::User.permits(AccessLevel::System));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("admin".parse::<AccessLevel>().unwrap(), AccessLevel::Admin);
        assert!("root".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&AccessLevel::System).unwrap(),
            "\"SYSTEM\""
        );
    }
}
