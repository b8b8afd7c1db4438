//! In-memory collaborator
//!
//! Keeps rows per table, keyed by entity id, and serves every CRUD operation.

use crate::git::collaborator::Collaborator;
use crate::git::commit::Commit;
use crate::integrity::{ColumnName, TableName};
use crate::value::Value;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

pub type Row = BTreeMap<ColumnName, Value>;

/// Thread-safe row store acting as a backend
#[derive(Debug, Clone, Default)]
pub struct MemoryCollaborator {
    tables: Arc<RwLock<HashMap<TableName, HashMap<String, Row>>>>,
}

impl MemoryCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row(&self, table_name: &str, entity_id: &str) -> Option<Row> {
        let tables = self.tables.read().await;
        tables.get(table_name)?.get(entity_id).cloned()
    }

    pub async fn row_count(&self, table_name: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table_name).map_or(0, HashMap::len)
    }
}

fn entity_id_of(commit: &Commit) -> anyhow::Result<String> {
    commit
        .changes
        .first()
        .and_then(|c| c.entity_id.clone())
        .ok_or_else(|| anyhow!("commit {} carries no entity id", commit.id))
}

fn table_of(commit: &Commit) -> anyhow::Result<TableName> {
    Ok(commit.table_name()?.to_string())
}

#[async_trait]
impl Collaborator for MemoryCollaborator {
    async fn create(&self, _ctx: &CancellationToken, mut commit: Commit) -> anyhow::Result<Commit> {
        let table_name = table_of(&commit)?;
        let entity_id = Uuid::new_v4().to_string();

        let mut row = Row::new();
        for change in &mut commit.changes {
            change.entity_id = Some(entity_id.clone());
            if let (Some(column), Some(value)) = (&change.column_name, change.value()) {
                row.insert(column.clone(), value.clone());
            }
        }

        let mut tables = self.tables.write().await;
        tables.entry(table_name.clone()).or_default().insert(entity_id.clone(), row);
        debug!(table = %table_name, entity_id = %entity_id, "row created");
        Ok(commit)
    }

    async fn retrieve(&self, _ctx: &CancellationToken, mut commit: Commit) -> anyhow::Result<Commit> {
        let table_name = table_of(&commit)?;
        let tables = self.tables.read().await;
        let rows = tables
            .get(&table_name)
            .with_context(|| format!("table {} holds no rows", table_name))?;

        for change in &mut commit.changes {
            let entity_id = change.entity_id.clone().unwrap_or_default();
            let row = rows
                .get(&entity_id)
                .with_context(|| format!("row {} not found in {}", entity_id, table_name))?;
            let column = change.column_name.clone().unwrap_or_default();
            let value = row
                .get(&column)
                .cloned()
                .with_context(|| format!("column {} is not set on row {}", column, entity_id))?;
            change.set_value(Some(value))?;
        }
        Ok(commit)
    }

    async fn update(&self, _ctx: &CancellationToken, commit: Commit) -> anyhow::Result<Commit> {
        let table_name = table_of(&commit)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(&table_name)
            .with_context(|| format!("table {} holds no rows", table_name))?;

        for change in &commit.changes {
            let entity_id = change.entity_id.clone().unwrap_or_default();
            let row = rows
                .get_mut(&entity_id)
                .with_context(|| format!("row {} not found in {}", entity_id, table_name))?;
            if let (Some(column), Some(value)) = (&change.column_name, change.value()) {
                row.insert(column.clone(), value.clone());
            }
        }
        Ok(commit)
    }

    async fn delete(&self, _ctx: &CancellationToken, commit: Commit) -> anyhow::Result<Commit> {
        let table_name = table_of(&commit)?;
        let entity_id = entity_id_of(&commit)?;
        let mut tables = self.tables.write().await;
        tables
            .get_mut(&table_name)
            .and_then(|rows| rows.remove(&entity_id))
            .with_context(|| format!("row {} not found in {}", entity_id, table_name))?;
        debug!(table = %table_name, entity_id = %entity_id, "row deleted");
        Ok(commit)
    }
}
