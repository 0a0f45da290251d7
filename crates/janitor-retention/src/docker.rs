//! Container image tag retention.
//!
//! Two strategies: a catalog query over `manifest.json` items that
//! keeps the newest N tags per image, and a registry catalog walk that
//! removes snapshot tags already shadowed by a release tag of the same
//! name.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, TryStreamExt};
use regex::Regex;

use janitor_core::error::{Error, Result};
use janitor_core::item::ArtifactItem;
use janitor_core::query::ItemQuery;
use janitor_core::retry::RetryingStore;

use crate::group;
use crate::policy::{RetentionPolicy, DEFAULT_DELETE_CONCURRENCY};
use crate::snapshot::SNAPSHOT_SUFFIX;

/// Default number of newest tags kept per image.
pub const DEFAULT_TAGS_TO_KEEP: usize = 5;

/// Patterns protecting tags from deletion.
///
/// Loaded from a file with one regular expression per line; blank
/// lines and lines starting with `#` are skipped. A pattern protects a
/// tag when it matches the whole `image/tag` path.
#[derive(Debug, Default)]
pub struct TagFilters {
    patterns: Vec<Regex>,
}

impl TagFilters {
    /// No filters; every stale tag is deletable.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads filters from a file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or a line does not compile
    /// as a regular expression; the error names the offending line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::configuration(format!(
                "cannot read tag filter file {}: {err}",
                path.display()
            ))
        })?;
        Self::parse(&text)
    }

    /// Parses filters from newline-separated pattern text.
    ///
    /// # Errors
    ///
    /// Fails when a line does not compile as a regular expression.
    pub fn parse(text: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // anchored so a pattern must cover the whole image/tag path
            let pattern = Regex::new(&format!(r"\A(?:{line})\z")).map_err(|err| {
                Error::configuration(format!(
                    "invalid tag filter pattern on line {}: {err}",
                    index + 1
                ))
            })?;
            patterns.push(pattern);
        }
        Ok(Self { patterns })
    }

    /// True when any pattern matches the whole candidate path.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(candidate))
    }

    /// Number of loaded patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no patterns are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Query-driven tag retention for one registry repository.
///
/// Finds every image manifest, groups by image, sorts tags newest
/// first by modification time and deletes everything past the keep
/// count, unless a filter pattern protects it.
pub struct DockerQueryPolicy {
    store: RetryingStore,
    repo: String,
    tags_to_keep: usize,
    filters: TagFilters,
    delete_concurrency: usize,
}

impl DockerQueryPolicy {
    /// Creates the policy for one registry repository.
    #[must_use]
    pub fn new(
        store: RetryingStore,
        repo: impl Into<String>,
        tags_to_keep: usize,
        filters: TagFilters,
    ) -> Self {
        Self {
            store,
            repo: repo.into(),
            tags_to_keep,
            filters,
            delete_concurrency: DEFAULT_DELETE_CONCURRENCY,
        }
    }

    /// Overrides the per-image deletion concurrency.
    #[must_use]
    pub fn with_delete_concurrency(mut self, limit: usize) -> Self {
        self.delete_concurrency = limit.max(1);
        self
    }

    fn manifest_query(&self) -> ItemQuery {
        ItemQuery::repo(&self.repo)
            .name_equals("manifest.json")
            .include(["repo", "path", "name", "modified"])
    }

    /// Tags of one image ordered newest first. Every manifest row must
    /// carry a modification timestamp.
    fn ordered_tags(group: Vec<ArtifactItem>) -> Result<Vec<(DateTime<Utc>, String)>> {
        let mut tags = group
            .into_iter()
            .map(|item| {
                let modified = item.modified.ok_or_else(|| {
                    Error::malformed_timestamp(item.version_path(), "missing modified timestamp")
                })?;
                Ok((modified, item.version))
            })
            .collect::<Result<Vec<_>>>()?;
        tags.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(tags)
    }

    async fn delete_tags(&self, paths: Vec<String>) -> Result<()> {
        let store = self.store.clone();
        let repo = self.repo.clone();
        stream::iter(paths.into_iter().map(Ok))
            .try_for_each_concurrent(self.delete_concurrency, move |path| {
                let store = store.clone();
                let repo = repo.clone();
                async move {
                    tracing::info!(repo = %repo, path = %path, "deleting stale tag");
                    store.delete(&repo, &path).await
                }
            })
            .await
    }
}

#[async_trait]
impl RetentionPolicy for DockerQueryPolicy {
    fn name(&self) -> &str {
        "docker-query"
    }

    async fn execute(&self) -> Result<()> {
        let query = self.manifest_query();
        tracing::info!(aql = %query.to_aql(), "searching for image manifests");
        let rows = self.store.search(&query).await?;
        let items = rows
            .iter()
            .map(ArtifactItem::from_aql)
            .collect::<Result<Vec<_>>>()?;
        for (image, group) in group::by_logical_path(items) {
            let tags = Self::ordered_tags(group)?;
            let newest: Vec<&str> = tags
                .iter()
                .take(self.tags_to_keep)
                .map(|(_, tag)| tag.as_str())
                .collect();
            tracing::info!(image = %image, newest = ?newest, "newest tags retained");
            if tags.len() <= self.tags_to_keep {
                continue;
            }

            let mut doomed = Vec::new();
            for (_, tag) in &tags[self.tags_to_keep..] {
                let path = format!("{image}/{tag}");
                if self.filters.matches(&path) {
                    tracing::info!(path = %path, "tag protected by filter pattern");
                } else {
                    doomed.push(path);
                }
            }
            self.delete_tags(doomed).await?;
        }
        Ok(())
    }
}

/// Catalog-walk tag retention for one registry repository.
///
/// Lists every image and its tags through the registry API and deletes
/// each snapshot tag whose release twin (suffix stripped) exists on
/// the same image.
pub struct DockerCatalogPolicy {
    store: RetryingStore,
    repo: String,
    delete_concurrency: usize,
}

impl DockerCatalogPolicy {
    /// Creates the policy for one registry repository.
    #[must_use]
    pub fn new(store: RetryingStore, repo: impl Into<String>) -> Self {
        Self {
            store,
            repo: repo.into(),
            delete_concurrency: DEFAULT_DELETE_CONCURRENCY,
        }
    }

    /// Overrides the per-image deletion concurrency.
    #[must_use]
    pub fn with_delete_concurrency(mut self, limit: usize) -> Self {
        self.delete_concurrency = limit.max(1);
        self
    }
}

/// Snapshot tags shadowed by a release tag of the same name.
fn shadowed_snapshot_tags(tags: &[String]) -> Vec<&str> {
    let releases: HashSet<&str> = tags
        .iter()
        .filter(|t| !t.ends_with(SNAPSHOT_SUFFIX))
        .map(String::as_str)
        .collect();
    tags.iter()
        .filter(|tag| {
            tag.strip_suffix(SNAPSHOT_SUFFIX)
                .is_some_and(|base| releases.contains(base))
        })
        .map(String::as_str)
        .collect()
}

#[async_trait]
impl RetentionPolicy for DockerCatalogPolicy {
    fn name(&self) -> &str {
        "docker-catalog"
    }

    async fn execute(&self) -> Result<()> {
        let images = self.store.docker_repositories(&self.repo).await?;
        tracing::info!(repo = %self.repo, images = images.len(), "scanning registry catalog");
        for image in images {
            let tags = self.store.docker_tags(&self.repo, &image).await?;
            let doomed: Vec<String> = shadowed_snapshot_tags(&tags)
                .into_iter()
                .map(|tag| format!("{image}/{tag}"))
                .collect();
            if doomed.is_empty() {
                continue;
            }
            tracing::info!(image = %image, stale = doomed.len(), "shadowed snapshot tags found");

            let store = self.store.clone();
            let repo = self.repo.clone();
            stream::iter(doomed.into_iter().map(Ok))
                .try_for_each_concurrent(self.delete_concurrency, move |path| {
                    let store = store.clone();
                    let repo = repo.clone();
                    async move {
                        tracing::info!(repo = %repo, path = %path, "deleting shadowed snapshot tag");
                        store.delete(&repo, &path).await
                    }
                })
                .await?;
        }
        Ok(())
    }
}
