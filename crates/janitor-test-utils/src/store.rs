//! Test store implementation with operation recording.
//!
//! Provides an in-memory artifact store that records all operations
//! for test assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use janitor_core::error::{Error, Result};
use janitor_core::item::AqlItem;
use janitor_core::query::ItemQuery;
use janitor_core::store::{ArtifactStore, StorageChild, SystemVersion};

/// Record of a store operation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Item search.
    Search {
        /// Rendered query text.
        aql: String,
    },
    /// Folder listing.
    ListChildren {
        /// Repository that was listed.
        repo: String,
        /// Folder path inside the repository.
        path: String,
    },
    /// Registry image listing.
    DockerRepositories {
        /// Registry repository.
        repo: String,
    },
    /// Image tag listing.
    DockerTags {
        /// Registry repository.
        repo: String,
        /// Image name.
        image: String,
    },
    /// Path deletion.
    Delete {
        /// Repository holding the path.
        repo: String,
        /// Deleted path.
        path: String,
    },
    /// Server version probe.
    SystemVersion,
}

/// In-memory artifact store with operation recording.
///
/// Search responses are served from a FIFO queue so a test scripts one
/// response per expected query; folder listings, image catalogs and
/// tag lists come from maps that default to empty. Deletes change no
/// state. Every call is recorded before the injected-failure check
/// runs, so retry tests can count attempts.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    search_responses: Arc<Mutex<VecDeque<Vec<AqlItem>>>>,
    children: Arc<Mutex<HashMap<(String, String), Vec<StorageChild>>>>,
    images: Arc<Mutex<HashMap<String, Vec<String>>>>,
    tags: Arc<Mutex<HashMap<(String, String), Vec<String>>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_remaining: Arc<AtomicU32>,
    fail_always: Arc<AtomicBool>,
}

impl RecordingStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next unanswered search. Once the
    /// queue is drained further searches return no rows.
    pub fn push_search_results(&self, items: Vec<AqlItem>) {
        self.search_responses.lock().expect("lock").push_back(items);
    }

    /// Sets the children of one folder.
    pub fn set_children(&self, repo: &str, path: &str, children: Vec<StorageChild>) {
        self.children
            .lock()
            .expect("lock")
            .insert((repo.to_owned(), path.to_owned()), children);
    }

    /// Sets the image names of a registry repository.
    pub fn set_docker_repositories<I, S>(&self, repo: &str, images: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images
            .lock()
            .expect("lock")
            .insert(repo.to_owned(), images.into_iter().map(Into::into).collect());
    }

    /// Sets the tags of one image.
    pub fn set_docker_tags<I, S>(&self, repo: &str, image: &str, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.lock().expect("lock").insert(
            (repo.to_owned(), image.to_owned()),
            tags.into_iter().map(Into::into).collect(),
        );
    }

    /// Makes every call fail from now on.
    pub fn fail_always(&self) {
        self.fail_always.store(true, Ordering::SeqCst);
    }

    /// Makes the next `count` calls fail, then recover.
    pub fn fail_times(&self, count: u32) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    /// Returns all recorded operations in call order.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns the recorded deletions as `(repo, path)` pairs.
    #[must_use]
    pub fn deletes(&self) -> Vec<(String, String)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                StoreOp::Delete { repo, path } => Some((repo, path)),
                _ => None,
            })
            .collect()
    }

    /// Number of searches issued so far, failed attempts included.
    #[must_use]
    pub fn search_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, StoreOp::Search { .. }))
            .count()
    }

    fn record(&self, op: StoreOp) {
        self.operations.lock().expect("lock").push(op);
    }

    fn check_failure(&self, operation: &str) -> Result<()> {
        if self.fail_always.load(Ordering::SeqCst) {
            return Err(Error::remote(format!("injected failure: {operation}")));
        }
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::remote(format!("injected failure: {operation}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for RecordingStore {
    async fn search(&self, query: &ItemQuery) -> Result<Vec<AqlItem>> {
        self.record(StoreOp::Search {
            aql: query.to_aql(),
        });
        self.check_failure("search")?;
        let response = self.search_responses.lock().expect("lock").pop_front();
        Ok(response.unwrap_or_default())
    }

    async fn list_children(&self, repo: &str, path: &str) -> Result<Vec<StorageChild>> {
        self.record(StoreOp::ListChildren {
            repo: repo.to_owned(),
            path: path.to_owned(),
        });
        self.check_failure("list_children")?;
        let children = self.children.lock().expect("lock");
        Ok(children
            .get(&(repo.to_owned(), path.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn docker_repositories(&self, repo: &str) -> Result<Vec<String>> {
        self.record(StoreOp::DockerRepositories {
            repo: repo.to_owned(),
        });
        self.check_failure("docker_repositories")?;
        let images = self.images.lock().expect("lock");
        Ok(images.get(repo).cloned().unwrap_or_default())
    }

    async fn docker_tags(&self, repo: &str, image: &str) -> Result<Vec<String>> {
        self.record(StoreOp::DockerTags {
            repo: repo.to_owned(),
            image: image.to_owned(),
        });
        self.check_failure("docker_tags")?;
        let tags = self.tags.lock().expect("lock");
        Ok(tags
            .get(&(repo.to_owned(), image.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, repo: &str, path: &str) -> Result<()> {
        self.record(StoreOp::Delete {
            repo: repo.to_owned(),
            path: path.to_owned(),
        });
        self.check_failure("delete")?;
        Ok(())
    }

    async fn system_version(&self) -> Result<SystemVersion> {
        self.record(StoreOp::SystemVersion);
        self.check_failure("system_version")?;
        Ok(SystemVersion {
            version: "7.55.0".to_owned(),
            revision: "75500900".to_owned(),
            addons: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::row;

    #[tokio::test]
    async fn serves_queued_search_responses_in_order() {
        let store = RecordingStore::new();
        store.push_search_results(vec![row("/a/1.0")]);
        store.push_search_results(vec![row("/b/2.0")]);

        let query = ItemQuery::repo("libs");
        let first = store.search(&query).await.expect("search");
        let second = store.search(&query).await.expect("search");
        let drained = store.search(&query).await.expect("search");

        assert_eq!(first[0].path, "/a/1.0");
        assert_eq!(second[0].path, "/b/2.0");
        assert!(drained.is_empty());
        assert_eq!(store.search_count(), 3);
    }

    #[tokio::test]
    async fn records_operations_in_call_order() {
        let store = RecordingStore::new();
        store.delete("libs", "/a/1.0").await.expect("delete");
        store.list_children("libs", "/a").await.expect("list");

        let ops = store.operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], StoreOp::Delete { .. }));
        assert!(matches!(ops[1], StoreOp::ListChildren { .. }));
        assert_eq!(
            store.deletes(),
            vec![("libs".to_owned(), "/a/1.0".to_owned())]
        );
    }

    #[tokio::test]
    async fn fail_times_recovers_after_the_given_count() {
        let store = RecordingStore::new();
        store.fail_times(2);

        let query = ItemQuery::repo("libs");
        assert!(store.search(&query).await.is_err());
        assert!(store.search(&query).await.is_err());
        assert!(store.search(&query).await.is_ok());
        // failed attempts are still recorded
        assert_eq!(store.search_count(), 3);
    }

    #[tokio::test]
    async fn fail_always_never_recovers() {
        let store = RecordingStore::new();
        store.fail_always();

        assert!(store.system_version().await.is_err());
        assert!(store.delete("libs", "/a/1.0").await.is_err());
    }

    #[tokio::test]
    async fn unscripted_lookups_default_to_empty() {
        let store = RecordingStore::new();
        assert!(store.list_children("libs", "/a").await.expect("list").is_empty());
        assert!(store
            .docker_repositories("docker")
            .await
            .expect("catalog")
            .is_empty());
        assert!(store
            .docker_tags("docker", "acme/app")
            .await
            .expect("tags")
            .is_empty());
    }
}
