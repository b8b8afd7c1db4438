// PostgreSQL-backed ledger
//
// Stores branches, indices and staged changes in three tables; a change is
// kept whole as JSONB next to the columns it is looked up by.

use super::{Branch, Index, Ledger, LedgerError, LedgerResult};
use crate::git::change::Change;
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::types::Json;
use tokio_postgres::Row;
use tracing::info;

pub struct PgLedger {
    pool: Pool,
}

impl PgLedger {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create the ledger tables if they don't exist
    pub async fn ensure_schema(&self) -> LedgerResult<()> {
        let client = self.pool.get().await?;

        client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS indices (
                    id BIGSERIAL PRIMARY KEY,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
                CREATE TABLE IF NOT EXISTS branches (
                    id BIGSERIAL PRIMARY KEY,
                    name VARCHAR(255) UNIQUE NOT NULL,
                    index_id BIGINT REFERENCES indices(id) ON DELETE SET NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
                CREATE TABLE IF NOT EXISTS changes (
                    id BIGSERIAL PRIMARY KEY,
                    index_id BIGINT NOT NULL REFERENCES indices(id) ON DELETE CASCADE,
                    table_name VARCHAR(255) NOT NULL,
                    entity_id TEXT,
                    body JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                );
                CREATE INDEX IF NOT EXISTS idx_changes_index_id ON changes(index_id);",
            )
            .await?;

        info!("Ledger tables ready");
        Ok(())
    }
}

fn branch_from_row(row: &Row) -> Branch {
    Branch {
        id: row.get(0),
        name: row.get(1),
        index_id: row.get(2),
        created_at: row.get(3),
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn create_index(&self) -> LedgerResult<Index> {
        let client = self.pool.get().await?;
        let row = client
            .query_one("INSERT INTO indices DEFAULT VALUES RETURNING id", &[])
            .await?;
        Ok(Index {
            id: row.get(0),
            changes: Vec::new(),
        })
    }

    async fn create_branch(&self, name: &str, index_id: Option<i64>) -> LedgerResult<Branch> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "INSERT INTO branches (name, index_id) VALUES ($1, $2)
                 ON CONFLICT (name) DO NOTHING
                 RETURNING id, name, index_id, created_at",
                &[&name, &index_id],
            )
            .await?
            .ok_or_else(|| LedgerError::BranchExists(name.to_string()))?;
        Ok(branch_from_row(&row))
    }

    async fn find_branch(&self, name: &str) -> LedgerResult<Option<Branch>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, name, index_id, created_at FROM branches WHERE name = $1",
                &[&name],
            )
            .await?;
        Ok(row.as_ref().map(branch_from_row))
    }

    async fn fetch_index(&self, id: i64) -> LedgerResult<Index> {
        let client = self.pool.get().await?;
        client
            .query_opt("SELECT id FROM indices WHERE id = $1", &[&id])
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("Index {}", id)))?;

        let rows = client
            .query(
                "SELECT id, body FROM changes WHERE index_id = $1 ORDER BY id",
                &[&id],
            )
            .await?;

        let changes = rows
            .iter()
            .map(|row| {
                let Json(mut change): Json<Change> = row.get(1);
                change.id = Some(row.get(0));
                change.index_id = Some(id);
                change
            })
            .collect();

        Ok(Index { id, changes })
    }

    async fn stage_change(&self, index_id: i64, mut change: Change) -> LedgerResult<Change> {
        let client = self.pool.get().await?;
        change.index_id = Some(index_id);
        let row = client
            .query_one(
                "INSERT INTO changes (index_id, table_name, entity_id, body)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
                &[&index_id, &change.table_name, &change.entity_id, &Json(&change)],
            )
            .await?;
        change.id = Some(row.get(0));
        Ok(change)
    }
}
