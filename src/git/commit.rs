//! Commits - consistency-checked groups of Changes

use crate::error::{GitError, GitResult};
use crate::git::change::Change;
use crate::git::collaborator::Collaborator;
use crate::git::options::Options;
use crate::integrity::Crud;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

/// An ordered set of Changes over one table, one option set and one kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub errored: bool,
    /// Collaborator assigned by a successful review
    #[serde(skip)]
    pub reviewer: Option<Arc<dyn Collaborator>>,
}

impl Commit {
    pub fn new(id: i64, changes: Vec<Change>) -> Self {
        Self {
            id,
            changes,
            ..Default::default()
        }
    }

    /// Decodes a commit as returned by an HTTP backend
    pub fn from_reader<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// Appends a change, unless an identical one is already committed
    pub fn add(&mut self, change: Change) -> GitResult<()> {
        if self.changes.contains(&change) {
            return Err(GitError::DuplicatedChange);
        }
        self.changes.push(change);
        Ok(())
    }

    /// The table every change targets
    pub fn table_name(&self) -> GitResult<&str> {
        let first = self.changes.first().ok_or(GitError::EmptyCommit)?;
        if self.changes.iter().any(|c| c.table_name != first.table_name) {
            return Err(GitError::MixedTables);
        }
        Ok(&first.table_name)
    }

    /// The option set every change carries
    pub fn options(&self) -> GitResult<Options> {
        let Some(first) = self.changes.first() else {
            return Ok(Options::new());
        };
        if self.changes.iter().any(|c| c.options != first.options) {
            return Err(GitError::MixedOptions);
        }
        Ok(first.options.clone())
    }

    /// The CRUD kind every change classifies into
    pub fn kind(&self) -> GitResult<Crud> {
        let mut kinds = self.changes.iter().map(Change::classify);
        let first = kinds.next().ok_or(GitError::EmptyCommit)??;
        for kind in kinds {
            if kind? != first {
                return Err(GitError::MixedTypes);
            }
        }
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    #[test]
    fn test_consistent_commit() {
        let comm = Commit::new(
            1,
            vec![
                fixtures::create_change(),
                fixtures::create_change().with_column("baz").with_value(3),
            ],
        );
        assert_eq!(comm.table_name().unwrap(), "foos");
        assert_eq!(comm.kind().unwrap(), Crud::Create);
        assert_eq!(comm.options().unwrap().get_str("owner"), Some("octo"));
    }

    #[test]
    fn test_mixed_tables() {
        let comm = Commit::new(1, vec![fixtures::create_change(), fixtures::bar_create_change()]);
        assert!(matches!(comm.table_name(), Err(GitError::MixedTables)));
    }

    #[test]
    fn test_mixed_tables_is_the_only_error() {
        let mut other = fixtures::create_change();
        other.table_name = "quxes".to_string();
        let comm = Commit::new(1, vec![fixtures::create_change(), other]);

        assert!(matches!(comm.table_name(), Err(GitError::MixedTables)));
        assert!(comm.options().is_ok());
        assert!(comm.kind().is_ok());
    }

    #[test]
    fn test_mixed_options() {
        let other = fixtures::create_change().with_option("owner", json!("cat")).unwrap();
        let comm = Commit::new(1, vec![fixtures::create_change(), other]);
        assert!(matches!(comm.options(), Err(GitError::MixedOptions)));
    }

    #[test]
    fn test_mixed_types() {
        let comm = Commit::new(1, vec![fixtures::create_change(), fixtures::update_change()]);
        assert!(matches!(comm.kind(), Err(GitError::MixedTypes)));
    }

    #[test]
    fn test_kind_surfaces_unclassifiable_changes() {
        let comm = Commit::new(1, vec![fixtures::create_change(), fixtures::inconsistent_change()]);
        assert!(matches!(comm.kind(), Err(GitError::UnclassifiableChange)));
    }

    #[test]
    fn test_empty_commit() {
        let comm = Commit::default();
        assert!(matches!(comm.table_name(), Err(GitError::EmptyCommit)));
        assert!(matches!(comm.kind(), Err(GitError::EmptyCommit)));
        assert!(comm.options().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut comm = Commit::default();
        comm.add(fixtures::create_change()).unwrap();
        assert!(matches!(comm.add(fixtures::create_change()), Err(GitError::DuplicatedChange)));
        assert_eq!(comm.changes.len(), 1);
    }

    #[test]
    fn test_from_reader_skips_reviewer() {
        let raw = r#"{"id": 7, "changes": [{"tableName": "foos", "entityId": "9"}], "merged": true}"#;
        let comm = Commit::from_reader(raw.as_bytes()).unwrap();
        assert_eq!(comm.id, 7);
        assert!(comm.merged);
        assert!(comm.reviewer.is_none());
        assert_eq!(comm.kind().unwrap(), Crud::Delete);
    }
}
