//! Options attached to a Change

use crate::error::{GitError, GitResult};
use crate::integrity::OptionKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Backend-specific parameters of a Change (e.g. the owner of a repository)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<OptionKey, serde_json::Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites an option; keys cannot be empty
    pub fn assign(&mut self, key: impl Into<OptionKey>, value: serde_json::Value) -> GitResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(GitError::NilOptionKey);
        }
        self.0.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// String option, as most backends use them for addressing
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn keys(&self) -> Vec<OptionKey> {
        self.0.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &serde_json::Value)> {
        self.0.iter()
    }

    pub(crate) fn has_nil_key(&self) -> bool {
        self.0.keys().any(|k| k.is_empty())
    }
}

impl FromIterator<(OptionKey, serde_json::Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (OptionKey, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assign_overwrites() {
        let mut opts = Options::new();
        opts.assign("owner", json!("octo")).unwrap();
        opts.assign("owner", json!("cat")).unwrap();
        assert_eq!(opts.len(), 1);
        assert_eq!(opts.get_str("owner"), Some("cat"));
    }

    #[test]
    fn test_assign_rejects_empty_key() {
        let mut opts = Options::new();
        assert!(matches!(opts.assign("", json!(1)), Err(GitError::NilOptionKey)));
        assert!(opts.is_empty());
    }

    #[test]
    fn test_keys_are_ordered_and_equality_is_deep() {
        let a: Options = vec![
            ("b".to_string(), json!({"x": 1})),
            ("a".to_string(), json!(2)),
        ]
        .into_iter()
        .collect();
        let b: Options = vec![
            ("a".to_string(), json!(2)),
            ("b".to_string(), json!({"x": 1})),
        ]
        .into_iter()
        .collect();
        assert_eq!(a.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(a, b);
    }
}
