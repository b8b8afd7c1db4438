//! Shared test fixtures: golden schemas, changes and a scriptable collaborator

use crate::git::change::Change;
use crate::git::collaborator::Collaborator;
use crate::git::commit::Commit;
use crate::git::team::Team;
use crate::schema::{validators, Column, Planisphere, Schema, Table};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn foo_schema() -> Schema {
    Schema::new(
        "foo",
        vec![Table::new("foos")
            .with_column(Column::new("bar", validators::string()))
            .with_column(Column::new("baz", validators::int()))
            .with_column(Column::new("qux", validators::json()))
            .with_option_key("owner")],
    )
}

pub fn bar_schema() -> Schema {
    Schema::new(
        "bar",
        vec![Table::new("bars")
            .with_column(Column::new("quux", validators::string()))
            .with_option_key("username")],
    )
}

pub fn planisphere() -> Planisphere {
    Planisphere::new(vec![foo_schema(), bar_schema()])
}

fn foo_change() -> Change {
    Change::new("foos").with_option("owner", json!("octo")).unwrap()
}

pub fn create_change() -> Change {
    foo_change().with_column("bar").with_value("x")
}

pub fn retrieve_change() -> Change {
    foo_change().with_entity_id("1").with_column("bar")
}

pub fn update_change() -> Change {
    foo_change().with_entity_id("1").with_column("bar").with_value("y")
}

pub fn delete_change() -> Change {
    foo_change().with_entity_id("1")
}

/// A change without value, ready to receive one
pub fn clean_value_change() -> Change {
    retrieve_change()
}

/// Value without column nor entity id
pub fn inconsistent_change() -> Change {
    foo_change().with_value("x")
}

pub fn bar_create_change() -> Change {
    Change::new("bars")
        .with_option("username", json!("octo"))
        .unwrap()
        .with_column("quux")
        .with_value("x")
}

/// The team of the `foo` schema, with the collaborator claiming `foos`
pub fn foo_team(collab: MockCollaborator) -> Team {
    Team::new("foo").with_member("foos", Arc::new(collab)).unwrap()
}

/// Collaborator answering every operation the same way
#[derive(Debug, Clone, Default)]
pub struct MockCollaborator {
    failure: Option<String>,
    entity_id: Option<String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockCollaborator {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failure: Some("backend unavailable".to_string()),
            ..Default::default()
        }
    }

    /// Created entities get this id
    pub fn assigning_entity_id(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, mut commit: Commit) -> anyhow::Result<Commit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = &self.failure {
            anyhow::bail!("{}", failure);
        }
        if let Some(entity_id) = &self.entity_id {
            for change in &mut commit.changes {
                change.entity_id = Some(entity_id.clone());
            }
        }
        Ok(commit)
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    async fn create(&self, _ctx: &CancellationToken, commit: Commit) -> anyhow::Result<Commit> {
        self.answer(commit).await
    }

    async fn retrieve(&self, _ctx: &CancellationToken, commit: Commit) -> anyhow::Result<Commit> {
        self.answer(commit).await
    }

    async fn update(&self, _ctx: &CancellationToken, commit: Commit) -> anyhow::Result<Commit> {
        self.answer(commit).await
    }

    async fn delete(&self, _ctx: &CancellationToken, commit: Commit) -> anyhow::Result<Commit> {
        self.answer(commit).await
    }
}
