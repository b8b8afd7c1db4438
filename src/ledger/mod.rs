//! Version ledger
//!
//! Persists what the pull requests are made of: an [`Index`] is a staging area
//! of Changes, a [`Branch`] is a named pointer to one index.

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

use crate::git::change::Change;
use crate::integrity::BranchName;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("the BRANCH has NO INDEX assigned")]
    NilIndexId,

    #[error("Branch {0} already exists")]
    BranchExists(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Staging area of changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub id: i64,
    pub changes: Vec<Change>,
}

/// A named pointer to an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: i64,
    pub name: BranchName,
    pub index_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// Creates a fresh index and a branch pointing to it
    pub async fn new_with_index(ledger: &dyn Ledger, name: &str) -> LedgerResult<Self> {
        let index = ledger.create_index().await?;
        ledger.create_branch(name, Some(index.id)).await
    }

    /// Loads the index the branch points to, with its staged changes
    pub async fn fetch_index(&self, ledger: &dyn Ledger) -> LedgerResult<Index> {
        let index_id = self.index_id.ok_or(LedgerError::NilIndexId)?;
        ledger.fetch_index(index_id).await
    }

    pub async fn stage(&self, ledger: &dyn Ledger, change: Change) -> LedgerResult<Change> {
        let index_id = self.index_id.ok_or(LedgerError::NilIndexId)?;
        ledger.stage_change(index_id, change).await
    }
}

/// Storage of branches, indices and staged changes
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn create_index(&self) -> LedgerResult<Index>;

    async fn create_branch(&self, name: &str, index_id: Option<i64>) -> LedgerResult<Branch>;

    async fn find_branch(&self, name: &str) -> LedgerResult<Option<Branch>>;

    async fn fetch_index(&self, id: i64) -> LedgerResult<Index>;

    /// Records a change into an index; the stored change is returned with its
    /// id and index id assigned
    async fn stage_change(&self, index_id: i64, change: Change) -> LedgerResult<Change>;
}
