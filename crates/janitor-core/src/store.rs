//! Remote artifact store interface.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::item::AqlItem;
use crate::query::ItemQuery;

/// One entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageChild {
    /// Child name as returned by the store, with a leading `/`.
    pub uri: String,
    /// True when the child is a folder.
    #[serde(default)]
    pub folder: bool,
}

impl StorageChild {
    /// Child name without the leading `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.uri.strip_prefix('/').unwrap_or(&self.uri)
    }
}

/// Server identity reported by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemVersion {
    /// Release version of the server.
    pub version: String,
    /// Build revision.
    pub revision: String,
    /// Enabled addons.
    #[serde(default)]
    pub addons: Vec<String>,
}

/// Interface to the remote artifact store.
///
/// Implementations speak to one concrete store, or stand in for one in
/// tests. Retention code never calls this trait directly; it goes
/// through [`RetryingStore`](crate::retry::RetryingStore) so every
/// remote call gets the same retry treatment.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Runs an item search and returns all matched rows.
    async fn search(&self, query: &ItemQuery) -> Result<Vec<AqlItem>>;

    /// Lists the direct children of a folder. Listing an absent path
    /// yields an empty listing, not an error.
    async fn list_children(&self, repo: &str, path: &str) -> Result<Vec<StorageChild>>;

    /// Names of the images in a container registry repository.
    async fn docker_repositories(&self, repo: &str) -> Result<Vec<String>>;

    /// Tags of one image in a container registry repository.
    async fn docker_tags(&self, repo: &str, image: &str) -> Result<Vec<String>>;

    /// Deletes a file or folder. Deleting an absent path succeeds.
    async fn delete(&self, repo: &str, path: &str) -> Result<()>;

    /// Reports the server version. Doubles as a connectivity probe.
    async fn system_version(&self) -> Result<SystemVersion>;
}
