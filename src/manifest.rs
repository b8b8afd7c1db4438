//! Orchestration manifests
//!
//! A manifest bundles what one orchestration needs: the project of schemas,
//! the schema to target and the pull request to merge.

use crate::error::MultiError;
use crate::git::collaborator::Collaborator;
use crate::git::pull_request::PullRequest;
use crate::git::team::{Community, Team};
use crate::schema::{Planisphere, Schema};
use anyhow::Context;
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub planisphere: Vec<Schema>,
    pub schema: String,
    pub pull_request: PullRequest,
}

impl Manifest {
    /// Decodes a manifest; every schema gets its builtin validators and must
    /// pass self validation
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut manifest: Manifest = serde_json::from_reader(reader).context("malformed manifest")?;

        let mut errs = MultiError::new();
        for schema in &mut manifest.planisphere {
            schema
                .apply_builtin_validators()
                .with_context(|| format!("schema {:?}", schema.name))?;
            if let Err(schema_errs) = schema.validate_self() {
                errs.extend(schema_errs.into_errors());
            }
        }
        errs.into_result().context("invalid planisphere")?;

        Ok(manifest)
    }

    pub fn project(&self) -> Planisphere {
        self.planisphere.iter().cloned().collect()
    }

    /// A community whose team binds every table of the target schema to a
    /// collaborator built by `collab`
    pub fn community<F>(&self, mut collab: F) -> anyhow::Result<Community>
    where
        F: FnMut(&str) -> Arc<dyn Collaborator>,
    {
        let schema = self
            .planisphere
            .iter()
            .find(|s| s.name == self.schema)
            .with_context(|| format!("schema {:?} is not in the planisphere", self.schema))?;

        let mut team = Team::new(schema.name.clone());
        for table_name in schema.table_names() {
            team = team.with_member(table_name, collab(table_name))?;
        }
        Ok(Community::new(vec![team]))
    }
}
