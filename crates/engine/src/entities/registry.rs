//! Pattern registry - the immutable catalogue of pattern definitions.

use std::collections::HashMap;

use retrodesk_domain::{DomainError, PatternDefinition, PatternId, PatternType};

/// Read-only pattern catalogue, shared as `Arc<PatternRegistry>`.
///
/// Iteration order is insertion order; the engine evaluates patterns in
/// that order.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: Vec<PatternDefinition>,
    index: HashMap<PatternId, usize>,
}

impl PatternRegistry {
    /// # Errors
    ///
    /// `DomainError::Validation` for an invalid definition,
    /// `DomainError::Constraint` for a duplicate id.
    pub fn new(patterns: Vec<PatternDefinition>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(patterns.len());
        for (position, pattern) in patterns.iter().enumerate() {
            pattern.validate()?;
            if index.insert(pattern.id.clone(), position).is_some() {
                return Err(DomainError::constraint(format!(
                    "Duplicate pattern id: {}",
                    pattern.id
                )));
            }
        }
        Ok(Self { patterns, index })
    }

    pub fn all_patterns(&self) -> &[PatternDefinition] {
        &self.patterns
    }

    pub fn get_pattern(&self, id: &str) -> Option<&PatternDefinition> {
        self.index.get(id).map(|&position| &self.patterns[position])
    }

    /// Position in evaluation order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn patterns_of_type(
        &self,
        pattern_type: PatternType,
    ) -> impl Iterator<Item = &PatternDefinition> {
        self.patterns
            .iter()
            .filter(move |p| p.pattern_type == pattern_type)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
