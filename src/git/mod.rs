//! Git Module
//!
//! The version-control metaphor over CRUD mutations:
//! - [`Change`]: one typed mutation, classified into a CRUD kind
//! - [`Commit`]: changes agreeing on table, options and kind
//! - [`PullRequest`]: commits serviced by one [`Team`]
//! - [`Owner`]: reviews, delegates and merges pull requests concurrently

pub mod change;
pub mod collaborator;
pub mod commit;
pub mod options;
pub mod owner;
pub mod pull_request;
pub mod summary;
pub mod team;

pub use change::Change;
pub use collaborator::Collaborator;
pub use commit::Commit;
pub use options::Options;
pub use owner::Owner;
pub use pull_request::PullRequest;
pub use summary::{CommitResult, Summary};
pub use team::{Community, Member, Team};
