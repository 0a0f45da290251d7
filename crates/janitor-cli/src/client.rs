//! HTTP client for the artifact store REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use janitor_core::error::{Error, Result};
use janitor_core::item::{AqlItem, AqlResults};
use janitor_core::query::ItemQuery;
use janitor_core::store::{ArtifactStore, StorageChild, SystemVersion};

use crate::Config;

/// Timeout for any single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Artifact store client over an Artifactory-style REST API.
pub struct HttpStore {
    client: Client,
    base_url: String,
    user: String,
    password: String,
}

impl HttpStore {
    /// Creates a client for the store at `url` with basic-auth credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(url: &str, user: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| Error::configuration(format!("cannot build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
            user: user.to_owned(),
            password: password.to_owned(),
        })
    }

    /// Client for the store named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn primary(config: &Config) -> Result<Self> {
        Self::new(&config.url, &config.user, &config.password)
    }

    /// Client for release cleanup: same store, release credentials when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn release(config: &Config) -> Result<Self> {
        let (user, password) = config.release_credentials();
        Self::new(&config.url, user, password)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.user, Some(&self.password))
    }

    fn search_url(&self) -> String {
        format!("{}/api/search/aql", self.base_url)
    }

    fn storage_url(&self, repo: &str, path: &str) -> String {
        if path.is_empty() {
            format!("{}/api/storage/{repo}", self.base_url)
        } else {
            format!("{}/api/storage/{repo}/{path}", self.base_url)
        }
    }

    fn catalog_url(&self, repo: &str) -> String {
        format!("{}/api/docker/{repo}/v2/_catalog", self.base_url)
    }

    fn tags_url(&self, repo: &str, image: &str) -> String {
        format!("{}/api/docker/{repo}/v2/{image}/tags/list", self.base_url)
    }

    fn item_url(&self, repo: &str, path: &str) -> String {
        format!("{}/{repo}/{path}", self.base_url)
    }

    fn version_url(&self) -> String {
        format!("{}/api/system/version", self.base_url)
    }
}

async fn status_error(context: &str, response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::remote(format!("{context}: status {status}: {body}"))
}

fn transport_error(context: &str, err: reqwest::Error) -> Error {
    Error::remote_with_source(context, err)
}

#[async_trait]
impl ArtifactStore for HttpStore {
    async fn search(&self, query: &ItemQuery) -> Result<Vec<AqlItem>> {
        let response = self
            .client
            .post(self.search_url())
            .basic_auth(&self.user, Some(&self.password))
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query.to_aql())
            .send()
            .await
            .map_err(|err| transport_error("search request failed", err))?;
        if !response.status().is_success() {
            return Err(status_error("search rejected", response).await);
        }
        let results: AqlResults = response
            .json()
            .await
            .map_err(|err| transport_error("cannot parse search response", err))?;
        Ok(results.results)
    }

    async fn list_children(&self, repo: &str, path: &str) -> Result<Vec<StorageChild>> {
        let response = self
            .get(&self.storage_url(repo, path))
            .send()
            .await
            .map_err(|err| transport_error("storage listing request failed", err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error("storage listing rejected", response).await);
        }
        let listing: FolderListing = response
            .json()
            .await
            .map_err(|err| transport_error("cannot parse storage listing", err))?;
        Ok(listing.children)
    }

    async fn docker_repositories(&self, repo: &str) -> Result<Vec<String>> {
        let response = self
            .get(&self.catalog_url(repo))
            .send()
            .await
            .map_err(|err| transport_error("catalog request failed", err))?;
        if !response.status().is_success() {
            return Err(status_error("catalog listing rejected", response).await);
        }
        let page: CatalogPage = response
            .json()
            .await
            .map_err(|err| transport_error("cannot parse catalog response", err))?;
        Ok(page.repositories)
    }

    async fn docker_tags(&self, repo: &str, image: &str) -> Result<Vec<String>> {
        let response = self
            .get(&self.tags_url(repo, image))
            .send()
            .await
            .map_err(|err| transport_error("tag listing request failed", err))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error("tag listing rejected", response).await);
        }
        let page: TagsPage = response
            .json()
            .await
            .map_err(|err| transport_error("cannot parse tag listing", err))?;
        Ok(page.tags.unwrap_or_default())
    }

    async fn delete(&self, repo: &str, path: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.item_url(repo, path))
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await
            .map_err(|err| transport_error("delete request failed", err))?;
        // a path that is already gone counts as deleted
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(status_error("delete rejected", response).await)
    }

    async fn system_version(&self) -> Result<SystemVersion> {
        let response = self
            .get(&self.version_url())
            .send()
            .await
            .map_err(|err| transport_error("version request failed", err))?;
        if !response.status().is_success() {
            return Err(status_error("version request rejected", response).await);
        }
        response
            .json()
            .await
            .map_err(|err| transport_error("cannot parse version response", err))
    }
}

/// Folder info envelope of the storage API.
#[derive(Debug, Deserialize)]
struct FolderListing {
    #[serde(default)]
    children: Vec<StorageChild>,
}

/// One page of the registry catalog.
#[derive(Debug, Deserialize)]
struct CatalogPage {
    repositories: Vec<String>,
}

/// Tag listing of one image. The registry reports `null` for an image
/// without tags.
#[derive(Debug, Deserialize)]
struct TagsPage {
    tags: Option<Vec<String>>,
}
