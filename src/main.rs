//! git-crud - orchestrates a pull request manifest
//!
//! Reads a JSON manifest (planisphere, target schema, pull request), binds an
//! in-memory collaborator to every table of the target schema, optionally
//! stages the changes on a ledger branch, merges the pull request and prints
//! one JSON line per commit result.

use anyhow::Context;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use git_crud::collaborators::MemoryCollaborator;
use git_crud::config::{DatabaseConfig, Settings};
use git_crud::git::{Collaborator, CommitResult, Owner, PullRequest};
use git_crud::ledger::{Branch, Ledger, MemoryLedger, PgLedger};
use git_crud::manifest::Manifest;
use serde_json::json;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    let settings = Settings::load()?;
    info!("Configuration loaded successfully");

    let manifest_path = std::env::args()
        .nth(1)
        .or_else(|| settings.manifest_path.clone())
        .context("no manifest given (pass a path or set MANIFEST_PATH)")?;
    let file = File::open(&manifest_path).with_context(|| format!("cannot open {}", manifest_path))?;
    let mut manifest = Manifest::from_reader(BufReader::new(file))?;
    info!(manifest = %manifest_path, schema = %manifest.schema, "Manifest loaded");

    let ledger = init_ledger(settings.database.as_ref()).await?;
    stage_pull_request(ledger.as_ref(), &settings.ledger_branch, &manifest.pull_request).await?;

    let community = manifest.community(|_| Arc::new(MemoryCollaborator::new()) as Arc<dyn Collaborator>)?;
    let mut owner = Owner::new(manifest.project())?;
    if let Some(timeout) = settings.owner.call_timeout() {
        owner = owner.with_call_timeout(timeout);
    }

    let ctx = CancellationToken::new();
    tokio::spawn(shutdown_signal(ctx.clone()));

    owner
        .orchestrate(&ctx, &community, &manifest.schema, &mut manifest.pull_request)
        .await;
    let summary = owner.summary();
    if let Err(err) = owner.wait_and_close() {
        error!("Orchestration failed: {}", err);
        return Err(err.into());
    }

    let mut failures = 0;
    if let Some(summary) = summary {
        for result in summary.collect().await {
            if !result.is_ok() {
                failures += 1;
            }
            println!("{}", render(&result));
        }
    }
    info!(commits = manifest.pull_request.commits.len(), failures, "Pull request processed");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,git_crud=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .compact(),
        )
        .init();
}

/// PostgreSQL ledger when a database is configured, in-memory otherwise
async fn init_ledger(database: Option<&DatabaseConfig>) -> anyhow::Result<Box<dyn Ledger>> {
    let Some(database) = database else {
        info!("No database configured, using the in-memory ledger");
        return Ok(Box::new(MemoryLedger::new()));
    };

    let pool = create_pool(database)?;
    let ledger = PgLedger::new(pool);
    ledger.ensure_schema().await?;
    info!(host = %database.host, database = %database.database, "PostgreSQL ledger ready");
    Ok(Box::new(ledger))
}

fn create_pool(config: &DatabaseConfig) -> anyhow::Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.dbname = Some(config.database.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(deadpool_postgres::PoolConfig::new(config.max_pool_size));

    cfg.create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)
        .map_err(|e| anyhow::anyhow!("Failed to create pool: {}", e))
}

/// Stages every change of the pull request on the branch, creating it if needed
async fn stage_pull_request(ledger: &dyn Ledger, branch_name: &str, pr: &PullRequest) -> anyhow::Result<()> {
    let branch = match ledger.find_branch(branch_name).await? {
        Some(branch) if branch.index_id.is_some() => branch,
        Some(_) => {
            warn!(branch = branch_name, "Branch has no index, changes are not staged");
            return Ok(());
        }
        None => Branch::new_with_index(ledger, branch_name).await?,
    };

    let mut staged = 0;
    for commit in &pr.commits {
        for change in &commit.changes {
            branch.stage(ledger, change.clone()).await?;
            staged += 1;
        }
    }
    info!(branch = branch_name, staged, "Changes staged");
    Ok(())
}

fn render(result: &CommitResult) -> serde_json::Value {
    json!({
        "commitId": result.commit_id,
        "error": result.error.as_ref().map(|e| e.to_string()),
    })
}

/// Cancels the orchestration on Ctrl+C or SIGTERM
async fn shutdown_signal(ctx: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, cancelling orchestration...");
        },
        _ = terminate => {
            info!("Received terminate signal, cancelling orchestration...");
        },
    }
    ctx.cancel();
}
