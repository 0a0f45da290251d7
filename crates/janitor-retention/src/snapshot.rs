//! Snapshot retention.
//!
//! A snapshot version is stale once a newer release of the same
//! artifact exists. Two strategies implement this: a catalog query
//! over artifact descriptors, and a folder-tree walk that cross-checks
//! the release repository. Both delete from the snapshot repository
//! only.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, TryStreamExt};

use janitor_core::error::Result;
use janitor_core::item::ArtifactItem;
use janitor_core::query::ItemQuery;
use janitor_core::retry::RetryingStore;
use janitor_core::version::Version;

use crate::group;
use crate::policy::{RetentionPolicy, DEFAULT_DELETE_CONCURRENCY};

/// Marker suffix of snapshot versions.
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Returns the versions of one group that are stale: snapshot-suffixed
/// and ordering strictly below the newest non-snapshot version. With
/// no release version in the group, nothing is stale.
fn stale_snapshots(versions: &[&str]) -> Vec<String> {
    let newest_release = versions
        .iter()
        .filter(|v| !v.ends_with(SNAPSHOT_SUFFIX))
        .map(|v| Version::new(v))
        .max();
    let Some(newest_release) = newest_release else {
        return Vec::new();
    };
    versions
        .iter()
        .filter(|v| v.ends_with(SNAPSHOT_SUFFIX) && Version::new(v) < newest_release)
        .map(|v| (*v).to_owned())
        .collect()
}

/// Query-driven snapshot retention over a snapshot/release repository
/// pair.
///
/// Searches every artifact descriptor in the snapshot repository (and
/// the release repository, when distinct), groups rows by artifact,
/// and deletes the stale snapshot version folders from the snapshot
/// repository.
pub struct SnapshotQueryPolicy {
    store: RetryingStore,
    snapshot_repo: String,
    release_repo: String,
    delete_concurrency: usize,
}

impl SnapshotQueryPolicy {
    /// Creates the policy for a snapshot/release repository pair. The
    /// two repositories may be the same.
    #[must_use]
    pub fn new(
        store: RetryingStore,
        snapshot_repo: impl Into<String>,
        release_repo: impl Into<String>,
    ) -> Self {
        Self {
            store,
            snapshot_repo: snapshot_repo.into(),
            release_repo: release_repo.into(),
            delete_concurrency: DEFAULT_DELETE_CONCURRENCY,
        }
    }

    /// Overrides the per-group deletion concurrency.
    #[must_use]
    pub fn with_delete_concurrency(mut self, limit: usize) -> Self {
        self.delete_concurrency = limit.max(1);
        self
    }

    fn descriptor_query(&self) -> ItemQuery {
        let query = if self.snapshot_repo == self.release_repo {
            ItemQuery::repo(&self.snapshot_repo)
        } else {
            ItemQuery::repo(&self.snapshot_repo).or_repo(&self.release_repo)
        };
        query.name_matches("*.pom").include(["repo", "path", "name"])
    }

    async fn delete_stale(&self, logical_path: &str, versions: Vec<String>) -> Result<()> {
        let store = self.store.clone();
        let repo = self.snapshot_repo.clone();
        let prefix = logical_path.to_owned();
        stream::iter(versions.into_iter().map(Ok))
            .try_for_each_concurrent(self.delete_concurrency, move |version| {
                let store = store.clone();
                let repo = repo.clone();
                let path = format!("{prefix}/{version}");
                async move {
                    tracing::info!(repo = %repo, path = %path, "deleting stale snapshot");
                    store.delete(&repo, &path).await
                }
            })
            .await
    }
}

#[async_trait]
impl RetentionPolicy for SnapshotQueryPolicy {
    fn name(&self) -> &str {
        "snapshot-query"
    }

    async fn execute(&self) -> Result<()> {
        let query = self.descriptor_query();
        tracing::info!(aql = %query.to_aql(), "searching for artifact descriptors");
        let rows = self.store.search(&query).await?;
        let items = rows
            .iter()
            .map(ArtifactItem::from_aql)
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(descriptors = items.len(), "grouping artifacts by path");
        for (logical_path, group) in group::by_logical_path(items) {
            let versions: Vec<&str> = group.iter().map(|i| i.version.as_str()).collect();
            let stale = stale_snapshots(&versions);
            if stale.is_empty() {
                continue;
            }
            tracing::info!(artifact = %logical_path, stale = stale.len(), "stale snapshots found");
            self.delete_stale(&logical_path, stale).await?;
        }
        Ok(())
    }
}

/// Tree-walk snapshot retention over a snapshot/release repository
/// pair.
///
/// Walks the snapshot repository folder tree breadth-first. A folder
/// whose name carries the snapshot suffix is deleted when the matching
/// path, suffix stripped, exists non-empty in the release repository;
/// any other folder is descended into.
pub struct SnapshotWalkPolicy {
    store: RetryingStore,
    snapshot_repo: String,
    release_repo: String,
    delete_concurrency: usize,
}

impl SnapshotWalkPolicy {
    /// Creates the policy for a snapshot/release repository pair.
    #[must_use]
    pub fn new(
        store: RetryingStore,
        snapshot_repo: impl Into<String>,
        release_repo: impl Into<String>,
    ) -> Self {
        Self {
            store,
            snapshot_repo: snapshot_repo.into(),
            release_repo: release_repo.into(),
            delete_concurrency: DEFAULT_DELETE_CONCURRENCY,
        }
    }

    /// Overrides the per-folder deletion concurrency.
    #[must_use]
    pub fn with_delete_concurrency(mut self, limit: usize) -> Self {
        self.delete_concurrency = limit.max(1);
        self
    }
}

fn join_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_owned()
    } else {
        format!("{folder}/{name}")
    }
}

#[async_trait]
impl RetentionPolicy for SnapshotWalkPolicy {
    fn name(&self) -> &str {
        "snapshot-walk"
    }

    async fn execute(&self) -> Result<()> {
        let mut worklist = VecDeque::from([String::new()]);
        while let Some(folder) = worklist.pop_front() {
            let children = self
                .store
                .list_children(&self.snapshot_repo, &folder)
                .await?;
            let mut snapshots = Vec::new();
            for child in children.iter().filter(|c| c.folder) {
                let path = join_path(&folder, child.name());
                if child.name().ends_with(SNAPSHOT_SUFFIX) {
                    snapshots.push(path);
                } else {
                    worklist.push_back(path);
                }
            }
            if snapshots.is_empty() {
                continue;
            }

            let store = self.store.clone();
            let snapshot_repo = self.snapshot_repo.clone();
            let release_repo = self.release_repo.clone();
            stream::iter(snapshots.into_iter().map(Ok))
                .try_for_each_concurrent(self.delete_concurrency, move |path| {
                    let store = store.clone();
                    let snapshot_repo = snapshot_repo.clone();
                    let release_repo = release_repo.clone();
                    async move {
                        let release_path = path
                            .strip_suffix(SNAPSHOT_SUFFIX)
                            .unwrap_or(&path)
                            .to_owned();
                        let released = store.list_children(&release_repo, &release_path).await?;
                        if released.is_empty() {
                            tracing::debug!(path = %path, "no released counterpart, keeping snapshot");
                            return Ok(());
                        }
                        tracing::info!(
                            repo = %snapshot_repo,
                            path = %path,
                            release_path = %release_path,
                            "deleting superseded snapshot"
                        );
                        store.delete(&snapshot_repo, &path).await
                    }
                })
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_needs_a_newer_release() {
        let stale = stale_snapshots(&["1.0-SNAPSHOT", "1.1-SNAPSHOT", "1.2", "1.3-SNAPSHOT"]);
        assert_eq!(stale, vec!["1.0-SNAPSHOT".to_owned(), "1.1-SNAPSHOT".to_owned()]);
    }

    #[test]
    fn without_a_release_nothing_is_stale() {
        assert!(stale_snapshots(&["1.0-SNAPSHOT", "2.0-SNAPSHOT"]).is_empty());
    }

    #[test]
    fn release_only_groups_have_no_stale_snapshots() {
        assert!(stale_snapshots(&["1.0", "1.1", "1.2"]).is_empty());
    }

    #[test]
    fn snapshot_matching_its_own_release_is_stale() {
        // 1.0-SNAPSHOT orders below 1.0, so the released 1.0 makes it stale
        let stale = stale_snapshots(&["1.0", "1.0-SNAPSHOT"]);
        assert_eq!(stale, vec!["1.0-SNAPSHOT".to_owned()]);
    }

    #[test]
    fn newest_release_wins_over_numeric_string_ordering() {
        // 10 beats 8-SNAPSHOT even though "10" < "8" as text
        let stale = stale_snapshots(&["8-SNAPSHOT", "10"]);
        assert_eq!(stale, vec!["8-SNAPSHOT".to_owned()]);
    }

    #[test]
    fn equal_ordering_snapshot_is_retained() {
        // a lowercase twin misses the suffix check, counts as the
        // newest release, and compares equal rather than below
        assert!(stale_snapshots(&["1.0-snapshot", "1.0-SNAPSHOT"]).is_empty());
    }

    #[test]
    fn join_path_skips_empty_root() {
        assert_eq!(join_path("", "com"), "com");
        assert_eq!(join_path("com/acme", "app"), "com/acme/app");
    }
}
