//! Caller-supplied process choices per position

use std::collections::HashMap;

use crate::catalog::is_valid_id;
use crate::error::{ChainError, ChainResult};
use crate::key::PositionKey;

/// Map from position key to the process id chosen at that position.
///
/// Read-only during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOverrides {
    choices: HashMap<PositionKey, String>,
}

impl SelectionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the raw string map handed over by the embedding application.
    pub fn from_map<I>(raw: I) -> ChainResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut overrides = Self::new();
        for (key, process_id) in raw {
            overrides.insert_raw(&key, &process_id)?;
        }
        Ok(overrides)
    }

    /// Parse a JSON object of `{"<position key>": "<process id>"}`.
    pub fn from_json_str(json: &str) -> ChainResult<Self> {
        let raw: HashMap<String, String> = serde_json::from_str(json).map_err(|e| {
            ChainError::invalid_request(format!("overrides must be a JSON object of strings: {e}"))
        })?;
        Self::from_map(raw)
    }

    /// Parse one `KEY=PROCESS` assignment and add it.
    pub fn insert_assignment(&mut self, assignment: &str) -> ChainResult<()> {
        let (key, process_id) = assignment.split_once('=').ok_or_else(|| {
            ChainError::invalid_request(format!(
                "override {assignment:?} is not of the form KEY=PROCESS"
            ))
        })?;
        self.insert_raw(key.trim(), process_id.trim())
    }

    pub fn insert(&mut self, key: PositionKey, process_id: impl Into<String>) -> Option<String> {
        self.choices.insert(key, process_id.into())
    }

    fn insert_raw(&mut self, key: &str, process_id: &str) -> ChainResult<()> {
        let key = PositionKey::parse(key).ok_or_else(|| {
            ChainError::invalid_request(format!("malformed position key {key:?}"))
        })?;
        if !is_valid_id(process_id) {
            return Err(ChainError::invalid_request(format!(
                "override for {key} names an invalid process id {process_id:?}"
            )));
        }
        self.insert(key, process_id);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.choices.get(key).map(String::as_str)
    }

    /// True if any override targets a position strictly beneath `key`.
    pub fn has_descendant_of(&self, key: &PositionKey) -> bool {
        self.choices.keys().any(|k| key.is_ancestor_of(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_are_validated() {
        let mut overrides = SelectionOverrides::new();
        overrides.insert_assignment("44@0/32@1=30").unwrap();
        assert_eq!(overrides.get("44@0/32@1"), Some("30"));
        assert_eq!(overrides.get("32@1"), None);

        for bad in ["no-equals", "44=30", "44@0=", "44@0=a b", "=30"] {
            let err = overrides.insert_assignment(bad).unwrap_err();
            assert!(
                matches!(err, ChainError::InvalidRequest { .. }),
                "{bad}: {err}"
            );
        }
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn json_overrides() {
        let overrides = SelectionOverrides::from_json_str(r#"{"44@0": "38", "44@0/1@1": "1"}"#).unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.get("44@0"), Some("38"));

        assert!(SelectionOverrides::from_json_str("[1, 2]").is_err());
        assert!(SelectionOverrides::from_json_str(r#"{"bad key": "1"}"#).is_err());
    }

    #[test]
    fn descendant_lookup() {
        let root = PositionKey::new("44", 0, None).unwrap();
        let child = PositionKey::new("32", 1, Some(&root)).unwrap();
        let mut overrides = SelectionOverrides::new();
        assert!(!overrides.has_descendant_of(&root));

        overrides.insert(child.clone(), "30");
        assert!(overrides.has_descendant_of(&root));
        assert!(!overrides.has_descendant_of(&child));
    }
}
