//! git-crud - CRUD orchestration through a version-control metaphor
//!
//! Changes are grouped into Commits and PullRequests, checked against a
//! declarative Schema, and merged concurrently by the Collaborators a Team
//! assigns to each table:
//! - `schema`: Schema / Table / Column / Planisphere validation
//! - `git`: Change, Commit, PullRequest, Team registry and the Owner
//! - `ledger`: branch and index storage (memory or PostgreSQL)
//! - `collaborators`: concrete backend adapters

pub mod collaborators;
pub mod config;
pub mod error;
pub mod git;
pub mod integrity;
pub mod ledger;
pub mod manifest;
pub mod schema;
pub mod value;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{GitError, GitResult, MultiError, SchemaError, ValidationError};
pub use git::{Change, Collaborator, Commit, Community, CommitResult, Owner, PullRequest, Summary, Team};
pub use schema::{Planisphere, Schema};
pub use value::{Value, ValueType};
