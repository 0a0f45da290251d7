//! Run command - execute the configured retention policies.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use owo_colors::OwoColorize;

use janitor_core::retry::RetryingStore;
use janitor_retention::{
    execute_all, DockerCatalogPolicy, DockerQueryPolicy, ReleaseModuleConfig, ReleasePolicy,
    RetentionPolicy, SnapshotQueryPolicy, SnapshotWalkPolicy, TagFilters,
    DEFAULT_DELETE_CONCURRENCY, DEFAULT_TAGS_TO_KEEP,
};

use crate::client::HttpStore;
use crate::Config;

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Snapshot repository to clean (needs --release-repo).
    #[arg(long)]
    pub snapshot_repo: Option<String>,

    /// Release repository consulted for released versions (needs --snapshot-repo).
    #[arg(long)]
    pub release_repo: Option<String>,

    /// Walk the snapshot repository tree instead of querying it.
    #[arg(long)]
    pub snapshot_walk: bool,

    /// Container registry repository to clean.
    #[arg(long)]
    pub docker_repo: Option<String>,

    /// Newest tags to keep per image.
    #[arg(long, default_value_t = DEFAULT_TAGS_TO_KEEP)]
    pub docker_tags_to_keep: usize,

    /// File of patterns naming tags that must never be deleted.
    #[arg(long)]
    pub docker_filter_file: Option<PathBuf>,

    /// Walk the registry catalog instead of querying manifests.
    #[arg(long)]
    pub docker_catalog_walk: bool,

    /// Release module to clean, as REPO:ROOT[:AGE_DAYS[:KEEP[:MAX]]].
    /// Repeat the flag for more modules.
    #[arg(long = "release-clean", env = "JANITOR_RELEASE_CLEAN", value_delimiter = ',')]
    pub release_clean: Vec<String>,

    /// Concurrent deletions per retention group.
    #[arg(long, default_value_t = DEFAULT_DELETE_CONCURRENCY)]
    pub delete_concurrency: usize,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if no retention policy is configured, the store is
/// unreachable, or any policy fails.
pub async fn execute(args: RunArgs, config: &Config) -> Result<()> {
    let primary = HttpStore::primary(config).context("Failed to create store client")?;
    let release = HttpStore::release(config).context("Failed to create release store client")?;

    let store = RetryingStore::new(Arc::new(primary), config.retry);
    let release_store = RetryingStore::new(Arc::new(release), config.retry);

    let policies = build_policies(&args, &store, &release_store)?;
    if policies.is_empty() {
        bail!("Nothing to do: no retention policy configured");
    }

    let version = store
        .system_version()
        .await
        .with_context(|| format!("Store at {} did not answer", config.url))?;
    tracing::info!(
        url = %config.url,
        version = %version.version,
        revision = %version.revision,
        "connected to artifact store"
    );

    println!("Running {} retention policies", policies.len());
    let outcome = execute_all(&policies).await;

    println!();
    for name in &outcome.completed {
        println!("  {} {name}", "ok".green());
    }
    for failure in &outcome.failures {
        println!("  {} {}: {}", "failed".red(), failure.policy, failure.error);
    }
    println!();

    if outcome.has_failures() {
        bail!(
            "{} of {} policies failed",
            outcome.failures.len(),
            policies.len()
        );
    }
    println!("{}", "All policies completed".green().bold());
    Ok(())
}

/// Turns the flag set into the list of policies to run.
fn build_policies(
    args: &RunArgs,
    store: &RetryingStore,
    release_store: &RetryingStore,
) -> Result<Vec<Box<dyn RetentionPolicy>>> {
    let mut policies: Vec<Box<dyn RetentionPolicy>> = Vec::new();

    match (&args.snapshot_repo, &args.release_repo) {
        (Some(snapshot), Some(release)) => {
            if args.snapshot_walk {
                policies.push(Box::new(
                    SnapshotWalkPolicy::new(store.clone(), snapshot, release)
                        .with_delete_concurrency(args.delete_concurrency),
                ));
            } else {
                policies.push(Box::new(
                    SnapshotQueryPolicy::new(store.clone(), snapshot, release)
                        .with_delete_concurrency(args.delete_concurrency),
                ));
            }
        }
        (None, None) => {}
        _ => bail!("--snapshot-repo and --release-repo go together"),
    }

    if let Some(repo) = &args.docker_repo {
        if args.docker_catalog_walk {
            policies.push(Box::new(
                DockerCatalogPolicy::new(store.clone(), repo)
                    .with_delete_concurrency(args.delete_concurrency),
            ));
        } else {
            let filters = match &args.docker_filter_file {
                Some(path) => {
                    TagFilters::from_file(path).context("Failed to load docker tag filters")?
                }
                None => TagFilters::empty(),
            };
            policies.push(Box::new(
                DockerQueryPolicy::new(store.clone(), repo, args.docker_tags_to_keep, filters)
                    .with_delete_concurrency(args.delete_concurrency),
            ));
        }
    }

    for spec in &args.release_clean {
        let module: ReleaseModuleConfig = spec
            .parse()
            .with_context(|| format!("Bad release module spec {spec:?}"))?;
        policies.push(Box::new(ReleasePolicy::new(release_store.clone(), module)));
    }

    Ok(policies)
}
