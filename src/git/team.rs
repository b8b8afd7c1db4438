//! The registry binding schemas to teams and tables to collaborators

use crate::error::{GitError, GitResult};
use crate::git::collaborator::Collaborator;
use crate::integrity::{SchemaName, TableName};
use std::sync::Arc;

/// A collaborator claiming one table
#[derive(Debug, Clone)]
pub struct Member {
    pub assigned_table: TableName,
    pub collab: Arc<dyn Collaborator>,
}

impl Member {
    pub fn new(assigned_table: impl Into<TableName>, collab: Arc<dyn Collaborator>) -> Self {
        Self {
            assigned_table: assigned_table.into(),
            collab,
        }
    }
}

/// The members servicing the tables of one schema
#[derive(Debug, Clone, Default)]
pub struct Team {
    pub assigned_schema: SchemaName,
    pub members: Vec<Member>,
}

impl Team {
    pub fn new(assigned_schema: impl Into<SchemaName>) -> Self {
        Self {
            assigned_schema: assigned_schema.into(),
            members: Vec::new(),
        }
    }

    /// Adds a member; a table can only be claimed once
    pub fn add_member(&mut self, member: Member) -> GitResult<()> {
        if self.members.iter().any(|m| m.assigned_table == member.assigned_table) {
            return Err(GitError::TableInUse(member.assigned_table));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn with_member(
        mut self,
        assigned_table: impl Into<TableName>,
        collab: Arc<dyn Collaborator>,
    ) -> GitResult<Self> {
        self.add_member(Member::new(assigned_table, collab))?;
        Ok(self)
    }

    /// The collaborator responsible for the table
    pub fn delegate(&self, table_name: &str) -> GitResult<Arc<dyn Collaborator>> {
        if self.members.is_empty() {
            return Err(GitError::NoMembers(table_name.to_string()));
        }
        self.members
            .iter()
            .find(|m| m.assigned_table == table_name)
            .map(|m| Arc::clone(&m.collab))
            .ok_or_else(|| GitError::NoCollaborators(table_name.to_string()))
    }
}

/// Every team, looked up by the schema it services
#[derive(Debug, Clone, Default)]
pub struct Community {
    teams: Vec<Arc<Team>>,
}

impl Community {
    pub fn new(teams: Vec<Team>) -> Self {
        Self {
            teams: teams.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn push(&mut self, team: Team) {
        self.teams.push(Arc::new(team));
    }

    pub fn look_for(&self, schema_name: &str) -> GitResult<Arc<Team>> {
        self.teams
            .iter()
            .find(|t| t.assigned_schema == schema_name)
            .cloned()
            .ok_or_else(|| GitError::NotFoundSchema(schema_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, MockCollaborator};

    #[test]
    fn test_delegate() {
        let team = fixtures::foo_team(MockCollaborator::ok());
        assert!(team.delegate("foos").is_ok());
        assert!(matches!(team.delegate("bars"), Err(GitError::NoCollaborators(t)) if t == "bars"));
    }

    #[test]
    fn test_delegate_without_members() {
        let team = Team::new("foo");
        assert!(matches!(team.delegate("foos"), Err(GitError::NoMembers(_))));
    }

    #[test]
    fn test_table_claimed_once() {
        let team = fixtures::foo_team(MockCollaborator::ok());
        let err = team
            .with_member("foos", Arc::new(MockCollaborator::ok()))
            .unwrap_err();
        assert!(matches!(err, GitError::TableInUse(t) if t == "foos"));
    }

    #[test]
    fn test_look_for() {
        let community = Community::new(vec![fixtures::foo_team(MockCollaborator::ok())]);
        assert_eq!(community.look_for("foo").unwrap().assigned_schema, "foo");
        assert!(matches!(community.look_for("bar"), Err(GitError::NotFoundSchema(_))));
    }
}
