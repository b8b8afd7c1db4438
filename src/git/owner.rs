//! Owner - reviews, delegates and merges pull requests
//!
//! An orchestration walks a [`PullRequest`] through
//! `Delegating -> Reviewing -> Merging -> Done`. A failure while delegating
//! (bad project, unknown schema) is fatal and stored as the owner's error;
//! everything after that is isolated per commit and reported on the
//! [`Summary`] stream.

use crate::error::{GitError, GitResult, MultiError};
use crate::git::collaborator::Collaborator;
use crate::git::commit::Commit;
use crate::git::pull_request::PullRequest;
use crate::git::summary::{self, CommitResult, Summary};
use crate::git::team::{Community, Team};
use crate::integrity::Crud;
use crate::schema::{Planisphere, Schema};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The orchestrator of pull requests over a project of schemas
#[derive(Debug, Default)]
pub struct Owner {
    project: Option<Arc<Planisphere>>,
    call_timeout: Option<Duration>,
    summary_tx: Option<mpsc::Sender<CommitResult>>,
    summary: Option<Summary>,
    err: Option<GitError>,
}

impl Owner {
    pub fn new(project: Planisphere) -> GitResult<Self> {
        if project.is_empty() {
            return Err(GitError::EmptyProject);
        }
        Ok(Self::unchecked(Some(Arc::new(project))))
    }

    /// Builds an owner without checking its project; orchestration does
    pub(crate) fn unchecked(project: Option<Arc<Planisphere>>) -> Self {
        Self {
            project,
            ..Default::default()
        }
    }

    /// Bounds every collaborator call
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn project(&self) -> Option<&Planisphere> {
        self.project.as_deref()
    }

    /// Reviews then merges the pull request against the named schema
    ///
    /// Every review and merge task has completed once this returns. A fatal
    /// error is kept for [`Owner::wait_and_close`].
    pub async fn orchestrate(
        &mut self,
        ctx: &CancellationToken,
        community: &Community,
        schema_name: &str,
        pr: &mut PullRequest,
    ) {
        match self.delegate(ctx, community, schema_name, pr).await {
            Ok(()) => self.merge(ctx, pr).await,
            Err(err) => {
                warn!(schema = schema_name, error = %err, "orchestration aborted");
                self.err = Some(err);
            }
        }
    }

    /// Resolves the schema and team, then reviews every commit concurrently
    pub async fn delegate(
        &mut self,
        ctx: &CancellationToken,
        community: &Community,
        schema_name: &str,
        pr: &mut PullRequest,
    ) -> GitResult<()> {
        let project = match &self.project {
            None => return Err(GitError::NilProject),
            Some(project) if project.is_empty() => return Err(GitError::EmptyProject),
            Some(project) => Arc::clone(project),
        };
        let schema = project.schema_from_name(schema_name)?;

        pr.assign_team(community, schema_name)?;

        let (tx, rx) = summary::channel(pr.commits.len());
        self.summary_tx = Some(tx.clone());
        self.summary = Some(rx);

        info!(
            schema = schema_name,
            pr = pr.id,
            commits = pr.commits.len(),
            cancelled = ctx.is_cancelled(),
            "reviewing pull request"
        );

        let team = pr.team.clone();
        let reviews = pr.commits.iter_mut().map(|commit| {
            review_commit(
                Arc::clone(&schema),
                Arc::clone(&project),
                team.clone(),
                commit,
                tx.clone(),
            )
        });
        join_all(reviews).await;

        Ok(())
    }

    /// Dispatches every reviewed commit to its reviewer and applies outcomes
    ///
    /// A failed call leaves the commit contents untouched; the commit ends
    /// errored and no longer merged.
    pub async fn merge(&mut self, ctx: &CancellationToken, pr: &mut PullRequest) {
        let Some(tx) = self.summary_tx.clone() else {
            return;
        };

        let mut tasks: Vec<(usize, JoinHandle<GitResult<Commit>>)> = Vec::new();
        for (slot, commit) in pr.commits.iter_mut().enumerate() {
            if commit.errored || commit.merged {
                continue;
            }
            let kind = match commit.kind() {
                Ok(kind) => kind,
                Err(err) => {
                    commit.errored = true;
                    publish(&tx, CommitResult::failed(commit.id, err)).await;
                    continue;
                }
            };
            let Some(reviewer) = commit.reviewer.clone() else {
                commit.errored = true;
                publish(&tx, CommitResult::failed(commit.id, GitError::NilReviewer)).await;
                continue;
            };

            debug!(commit_id = commit.id, kind = %kind, "merge dispatched");
            commit.merged = true;
            let snapshot = commit.clone();
            let task = tokio::spawn(call_reviewer(
                ctx.clone(),
                reviewer,
                kind,
                snapshot,
                self.call_timeout,
            ));
            tasks.push((slot, task));
        }

        debug!(pr = pr.id, merging = tasks.len(), "merge tasks dispatched");

        for (slot, task) in tasks {
            let outcome = task
                .await
                .unwrap_or_else(|join_err| Err(GitError::TaskAborted(join_err.to_string())));
            let commit = &mut pr.commits[slot];
            match outcome {
                Ok(mut merged) => {
                    merged.id = commit.id;
                    merged.reviewer = commit.reviewer.take();
                    merged.merged = true;
                    merged.errored = false;
                    *commit = merged;
                    publish(&tx, CommitResult::merged(commit.id)).await;
                }
                Err(err) => {
                    warn!(commit_id = commit.id, error = %err, "merge failed");
                    commit.merged = false;
                    commit.errored = true;
                    publish(&tx, CommitResult::failed(commit.id, err)).await;
                }
            }
        }
    }

    pub async fn create(&self, ctx: &CancellationToken, commit: Commit) -> GitResult<Commit> {
        self.call(ctx, Crud::Create, commit).await
    }

    pub async fn retrieve(&self, ctx: &CancellationToken, commit: Commit) -> GitResult<Commit> {
        self.call(ctx, Crud::Retrieve, commit).await
    }

    pub async fn update(&self, ctx: &CancellationToken, commit: Commit) -> GitResult<Commit> {
        self.call(ctx, Crud::Update, commit).await
    }

    pub async fn delete(&self, ctx: &CancellationToken, commit: Commit) -> GitResult<Commit> {
        self.call(ctx, Crud::Delete, commit).await
    }

    async fn call(&self, ctx: &CancellationToken, kind: Crud, commit: Commit) -> GitResult<Commit> {
        let reviewer = commit.reviewer.clone().ok_or(GitError::NilReviewer)?;
        call_reviewer(ctx.clone(), reviewer, kind, commit, self.call_timeout).await
    }

    /// Takes the receiving end of the results stream, if one was allocated
    pub fn summary(&mut self) -> Option<Summary> {
        self.summary.take()
    }

    /// Closes the results stream and returns the fatal error, if any
    ///
    /// Every task is joined by [`Owner::orchestrate`] itself, so only the
    /// stream needs closing here.
    pub fn wait_and_close(&mut self) -> GitResult<()> {
        self.summary_tx = None;
        match self.err.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Reviews one commit and assigns its reviewer; failures are published
async fn review_commit(
    schema: Arc<Schema>,
    project: Arc<Planisphere>,
    team: Option<Arc<Team>>,
    commit: &mut Commit,
    tx: mpsc::Sender<CommitResult>,
) {
    match check_commit(schema, project, team, commit).await {
        Ok(reviewer) => {
            debug!(commit_id = commit.id, "commit reviewed");
            commit.reviewer = Some(reviewer);
        }
        Err(err) => {
            debug!(commit_id = commit.id, error = %err, "commit rejected");
            commit.errored = true;
            publish(&tx, CommitResult::failed(commit.id, err)).await;
        }
    }
}

async fn check_commit(
    schema: Arc<Schema>,
    project: Arc<Planisphere>,
    team: Option<Arc<Team>>,
    commit: &Commit,
) -> GitResult<Arc<dyn Collaborator>> {
    // An invalid change makes the schema checks meaningless
    for change in &commit.changes {
        change.validate()?;
    }

    let checks: Vec<_> = commit
        .changes
        .iter()
        .cloned()
        .map(|change| {
            let schema = Arc::clone(&schema);
            let project = Arc::clone(&project);
            tokio::task::spawn_blocking(move || {
                let keys = change.options.keys();
                schema.validate_ctx(
                    &change.table_name,
                    change.column_name.as_deref(),
                    &keys,
                    change.value(),
                    &project,
                )
            })
        })
        .collect();

    let table_name = commit.table_name()?;
    commit.options()?;
    commit.kind()?;

    let mut errs = MultiError::new();
    for check in checks {
        match check.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => errs.push(err),
            Err(join_err) => return Err(GitError::TaskAborted(join_err.to_string())),
        }
    }
    if !errs.is_empty() {
        return Err(GitError::SchemaChecks(errs));
    }

    team.ok_or(GitError::NilTeam)?.delegate(table_name)
}

/// Runs one backend call on a commit snapshot
async fn call_reviewer(
    ctx: CancellationToken,
    reviewer: Arc<dyn Collaborator>,
    kind: Crud,
    commit: Commit,
    timeout: Option<Duration>,
) -> GitResult<Commit> {
    let call = async {
        reviewer.init(&ctx).await?;
        let merged = match kind {
            Crud::Create => reviewer.create(&ctx, commit).await?,
            Crud::Retrieve => reviewer.retrieve(&ctx, commit).await?,
            Crud::Update => reviewer.update(&ctx, commit).await?,
            Crud::Delete => reviewer.delete(&ctx, commit).await?,
        };
        Ok::<_, GitError>(merged)
    };

    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(GitError::Timeout(limit))),
            None => call.await,
        }
    };

    // A cancelled context wins over a call that is already done
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(GitError::Cancelled),
        outcome = bounded => outcome,
    }
}

async fn publish(tx: &mpsc::Sender<CommitResult>, result: CommitResult) {
    let commit_id = result.commit_id;
    if tx.send(result).await.is_err() {
        warn!(commit_id, "summary receiver dropped, result lost");
    }
}
