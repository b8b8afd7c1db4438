//! Pull requests - batches of commits serviced by one team

use crate::error::GitResult;
use crate::git::commit::Commit;
use crate::git::team::{Community, Team};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A group of Commits connected with the Team servicing them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(skip)]
    pub team: Option<Arc<Team>>,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

impl PullRequest {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self {
            commits,
            ..Default::default()
        }
    }

    /// Looks up the team of the schema; any previous team is dropped first
    pub fn assign_team(&mut self, community: &Community, schema_name: &str) -> GitResult<()> {
        self.team = None;
        self.team = Some(community.look_for(schema_name)?);
        Ok(())
    }

    pub fn commit(&self, id: i64) -> Option<&Commit> {
        self.commits.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitError;
    use crate::fixtures::{self, MockCollaborator};

    #[test]
    fn test_assign_team() {
        let community = Community::new(vec![fixtures::foo_team(MockCollaborator::ok())]);
        let mut pr = PullRequest::new(vec![]);

        pr.assign_team(&community, "foo").unwrap();
        assert_eq!(pr.team.as_ref().unwrap().assigned_schema, "foo");

        // Idempotent
        pr.assign_team(&community, "foo").unwrap();
        assert_eq!(pr.team.as_ref().unwrap().assigned_schema, "foo");
    }

    #[test]
    fn test_assign_team_resets_previous_team() {
        let community = Community::new(vec![fixtures::foo_team(MockCollaborator::ok())]);
        let mut pr = PullRequest::new(vec![]);
        pr.assign_team(&community, "foo").unwrap();

        let err = pr.assign_team(&community, "bar").unwrap_err();
        assert!(matches!(err, GitError::NotFoundSchema(_)));
        assert!(pr.team.is_none());
    }
}
