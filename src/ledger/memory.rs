//! In-memory ledger

use super::{Branch, Index, Ledger, LedgerError, LedgerResult};
use crate::git::change::Change;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    indices: HashMap<i64, Index>,
    branches: HashMap<String, Branch>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Thread-safe ledger kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<RwLock<State>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn branch_count(&self) -> usize {
        self.state.read().await.branches.len()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_index(&self) -> LedgerResult<Index> {
        let mut state = self.state.write().await;
        let index = Index {
            id: state.next_id(),
            changes: Vec::new(),
        };
        state.indices.insert(index.id, index.clone());
        Ok(index)
    }

    async fn create_branch(&self, name: &str, index_id: Option<i64>) -> LedgerResult<Branch> {
        let mut state = self.state.write().await;
        if state.branches.contains_key(name) {
            return Err(LedgerError::BranchExists(name.to_string()));
        }
        if let Some(id) = index_id {
            if !state.indices.contains_key(&id) {
                return Err(LedgerError::NotFound(format!("Index {}", id)));
            }
        }
        let branch = Branch {
            id: state.next_id(),
            name: name.to_string(),
            index_id,
            created_at: chrono::Utc::now(),
        };
        state.branches.insert(branch.name.clone(), branch.clone());
        Ok(branch)
    }

    async fn find_branch(&self, name: &str) -> LedgerResult<Option<Branch>> {
        Ok(self.state.read().await.branches.get(name).cloned())
    }

    async fn fetch_index(&self, id: i64) -> LedgerResult<Index> {
        self.state
            .read()
            .await
            .indices
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Index {}", id)))
    }

    async fn stage_change(&self, index_id: i64, mut change: Change) -> LedgerResult<Change> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let index = state
            .indices
            .get_mut(&index_id)
            .ok_or_else(|| LedgerError::NotFound(format!("Index {}", index_id)))?;
        change.id = Some(id);
        change.index_id = Some(index_id);
        index.changes.push(change.clone());
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_branch_with_index() {
        let ledger = MemoryLedger::new();
        let branch = assert_ok!(Branch::new_with_index(&ledger, "main").await);
        assert!(branch.index_id.is_some());

        let staged = assert_ok!(branch.stage(&ledger, fixtures::create_change()).await);
        assert_eq!(staged.index_id, branch.index_id);
        assert!(staged.id.is_some());

        let index = assert_ok!(branch.fetch_index(&ledger).await);
        assert_eq!(index.changes, vec![staged]);
    }

    #[tokio::test]
    async fn test_branch_without_index() {
        let ledger = MemoryLedger::new();
        let branch = assert_ok!(ledger.create_branch("detached", None).await);
        assert!(matches!(branch.fetch_index(&ledger).await, Err(LedgerError::NilIndexId)));
    }

    #[tokio::test]
    async fn test_branch_names_are_unique() {
        let ledger = MemoryLedger::new();
        assert_ok!(Branch::new_with_index(&ledger, "main").await);
        assert_err!(Branch::new_with_index(&ledger, "main").await);
        assert_eq!(ledger.branch_count().await, 1);

        let found = assert_ok!(ledger.find_branch("main").await);
        assert_eq!(found.map(|b| b.name), Some("main".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_index() {
        let ledger = MemoryLedger::new();
        assert!(matches!(ledger.fetch_index(99).await, Err(LedgerError::NotFound(_))));
        assert_err!(ledger.stage_change(99, fixtures::delete_change()).await);
        assert_err!(ledger.create_branch("main", Some(99)).await);
    }
}
