//! The capability a backend adapter offers to the Owner

use crate::git::commit::Commit;
use crate::integrity::Crud;
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Backend handler responsible for the tables a Team member claims
///
/// The Owner only depends on this capability set. Every operation receives
/// a working copy of the Commit and returns the Commit as the backend left it
/// (e.g. with generated entity ids). Adapters implement the operations they
/// serve; the rest fail as unsupported.
#[async_trait]
pub trait Collaborator: fmt::Debug + Send + Sync {
    /// Prepares the backend for one call (sessions, clients, ...)
    async fn init(&self, _ctx: &CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create(&self, _ctx: &CancellationToken, _commit: Commit) -> anyhow::Result<Commit> {
        Err(unsupported(Crud::Create))
    }

    async fn retrieve(&self, _ctx: &CancellationToken, _commit: Commit) -> anyhow::Result<Commit> {
        Err(unsupported(Crud::Retrieve))
    }

    async fn update(&self, _ctx: &CancellationToken, _commit: Commit) -> anyhow::Result<Commit> {
        Err(unsupported(Crud::Update))
    }

    async fn delete(&self, _ctx: &CancellationToken, _commit: Commit) -> anyhow::Result<Commit> {
        Err(unsupported(Crud::Delete))
    }
}

fn unsupported(kind: Crud) -> anyhow::Error {
    anyhow::anyhow!("the {} operation is not supported by this collaborator", kind)
}
