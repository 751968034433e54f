//! Clue catalogue and authentication codes.

use std::collections::HashMap;

use retrodesk_domain::{AccessLevel, Clue, ClueId, DomainError};

/// Code the player can type to authenticate (e.g. `login <code>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCode {
    pub code: String,
    pub level: AccessLevel,
    /// Clue revealed on successful authentication
    pub reveals: Option<ClueId>,
}

impl AccessCode {
    pub fn new(code: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            code: code.into(),
            level,
            reveals: None,
        }
    }

    pub fn revealing(mut self, clue_id: ClueId) -> Self {
        self.reveals = Some(clue_id);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClueCatalogue {
    clues: Vec<Clue>,
    index: HashMap<ClueId, usize>,
    access_codes: Vec<AccessCode>,
}

impl ClueCatalogue {
    pub fn new(clues: Vec<Clue>, access_codes: Vec<AccessCode>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(clues.len());
        for (position, clue) in clues.iter().enumerate() {
            if index.insert(clue.id.clone(), position).is_some() {
                return Err(DomainError::constraint(format!(
                    "Duplicate clue id: {}",
                    clue.id
                )));
            }
        }
        for code in &access_codes {
            if code.code.trim().is_empty() {
                return Err(DomainError::validation("Access code cannot be empty"));
            }
        }
        Ok(Self {
            clues,
            index,
            access_codes,
        })
    }

    pub fn all_clues(&self) -> &[Clue] {
        &self.clues
    }

    pub fn get_clue(&self, id: &str) -> Option<&Clue> {
        self.index.get(id).map(|&position| &self.clues[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Exact, whitespace-trimmed match against the configured codes.
    pub fn find_access_code(&self, code: &str) -> Option<&AccessCode> {
        let code = code.trim();
        self.access_codes.iter().find(|c| c.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrodesk_domain::{ClueCategory, ClueTitle};

    fn clue(id: &str) -> Clue {
        Clue::new(
            ClueId::new(id).unwrap(),
            ClueTitle::new(id).unwrap(),
            ClueCategory::Journal,
            "",
        )
    }

    #[test]
    fn rejects_duplicate_clues() {
        let result = ClueCatalogue::new(vec![clue("a"), clue("a")], vec![]);
        assert!(matches!(result, Err(DomainError::Constraint(_))));
    }

    #[test]
    fn finds_trimmed_access_code() {
        let catalogue = ClueCatalogue::new(
            vec![clue("a")],
            vec![AccessCode::new("THX1138", AccessLevel::Admin)],
        )
        .unwrap();
        assert_eq!(
            catalogue.find_access_code(" THX1138 ").map(|c| c.level),
            Some(AccessLevel::Admin)
        );
        assert!(catalogue.find_access_code("thx1138").is_none());
        assert!(catalogue.get_clue("a").is_some());
    }
}
