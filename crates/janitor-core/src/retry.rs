//! Retry wrapper for remote store calls.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::item::AqlItem;
use crate::query::ItemQuery;
use crate::store::{ArtifactStore, StorageChild, SystemVersion};

/// Retry schedule for remote calls: a fixed delay between a bounded
/// number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Builds a schedule. `max_attempts` counts the first call, so 1
    /// means no retries; 0 is clamped to 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Schedule that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Total number of attempts, the first call included.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between consecutive attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    /// Twelve attempts, fifteen seconds apart.
    fn default() -> Self {
        Self::new(12, Duration::from_secs(15))
    }
}

/// Store handle that retries every call under a [`RetryPolicy`].
///
/// Each failed attempt is logged at warn level; once attempts run out
/// the last error is returned unchanged. Handles are cheap to clone
/// and share the underlying store.
#[derive(Clone)]
pub struct RetryingStore {
    inner: Arc<dyn ArtifactStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    /// Wraps a store with a retry schedule.
    #[must_use]
    pub fn new(inner: Arc<dyn ArtifactStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.policy.max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "remote call failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs an item search. See [`ArtifactStore::search`].
    pub async fn search(&self, query: &ItemQuery) -> Result<Vec<AqlItem>> {
        self.run("search", || self.inner.search(query)).await
    }

    /// Lists folder children. See [`ArtifactStore::list_children`].
    pub async fn list_children(&self, repo: &str, path: &str) -> Result<Vec<StorageChild>> {
        self.run("list_children", || self.inner.list_children(repo, path))
            .await
    }

    /// Lists registry images. See [`ArtifactStore::docker_repositories`].
    pub async fn docker_repositories(&self, repo: &str) -> Result<Vec<String>> {
        self.run("docker_repositories", || {
            self.inner.docker_repositories(repo)
        })
        .await
    }

    /// Lists image tags. See [`ArtifactStore::docker_tags`].
    pub async fn docker_tags(&self, repo: &str, image: &str) -> Result<Vec<String>> {
        self.run("docker_tags", || self.inner.docker_tags(repo, image))
            .await
    }

    /// Deletes a path. See [`ArtifactStore::delete`].
    pub async fn delete(&self, repo: &str, path: &str) -> Result<()> {
        self.run("delete", || self.inner.delete(repo, path)).await
    }

    /// Reports the server version. See [`ArtifactStore::system_version`].
    pub async fn system_version(&self) -> Result<SystemVersion> {
        self.run("system_version", || self.inner.system_version())
            .await
    }
}

impl fmt::Debug for RetryingStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct FlakyStore {
        calls: AtomicU32,
        failures_before_success: u32,
    }

    #[async_trait]
    impl ArtifactStore for FlakyStore {
        async fn search(&self, _query: &ItemQuery) -> Result<Vec<AqlItem>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(Error::remote("search unavailable"))
            } else {
                Ok(Vec::new())
            }
        }

        async fn list_children(&self, _repo: &str, _path: &str) -> Result<Vec<StorageChild>> {
            Ok(Vec::new())
        }

        async fn docker_repositories(&self, _repo: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn docker_tags(&self, _repo: &str, _image: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn delete(&self, _repo: &str, _path: &str) -> Result<()> {
            Ok(())
        }

        async fn system_version(&self) -> Result<SystemVersion> {
            Ok(SystemVersion {
                version: "7.0.0".to_owned(),
                revision: "0".to_owned(),
                addons: Vec::new(),
            })
        }
    }

    fn wrap(store: FlakyStore, attempts: u32) -> (Arc<FlakyStore>, RetryingStore) {
        let store = Arc::new(store);
        let retrying =
            RetryingStore::new(store.clone(), RetryPolicy::new(attempts, Duration::ZERO));
        (store, retrying)
    }

    #[tokio::test]
    async fn first_success_needs_no_retry() {
        let (store, retrying) = wrap(FlakyStore::default(), 5);
        retrying.search(&ItemQuery::repo("libs")).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_the_store_recovers() {
        let flaky = FlakyStore {
            failures_before_success: 2,
            ..FlakyStore::default()
        };
        let (store, retrying) = wrap(flaky, 5);
        retrying.search(&ItemQuery::repo("libs")).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_the_last_error() {
        let flaky = FlakyStore {
            failures_before_success: u32::MAX,
            ..FlakyStore::default()
        };
        let (store, retrying) = wrap(flaky, 3);
        let err = retrying.search(&ItemQuery::repo("libs")).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(
            RetryPolicy::new(0, Duration::ZERO).max_attempts(),
            1
        );
    }

    #[test]
    fn default_schedule_matches_documented_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 12);
        assert_eq!(policy.delay(), Duration::from_secs(15));
    }
}
