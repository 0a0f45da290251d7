//! Old release retention.
//!
//! One policy instance cleans one module root inside a release
//! repository. The newest versions are always protected, a minimum age
//! keeps recent releases around, and a per-run cap bounds how much one
//! run may delete.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;

use janitor_core::error::{Error, Result};
use janitor_core::item::ArtifactItem;
use janitor_core::query::ItemQuery;
use janitor_core::retry::RetryingStore;
use janitor_core::version::Version;

use crate::policy::RetentionPolicy;

/// Default minimum age in days before a version may be deleted.
pub const DEFAULT_MIN_AGE_DAYS: u32 = 365;

/// Default number of newest versions always retained.
pub const DEFAULT_MIN_RETAINED: usize = 3;

/// Default cap on deleted versions per run.
pub const DEFAULT_MAX_DELETIONS: usize = 128;

/// Configuration of one release retention module.
///
/// Parsed from the colon-delimited form
/// `repo:root[:minAgeDays[:minRetained[:maxDeletions]]]`, for example
/// `libs-release:com/acme/app:730:5:50`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseModuleConfig {
    /// Release repository.
    pub repo: String,
    /// Root path of the module inside the repository.
    pub root: String,
    /// Minimum age in days before a version may be deleted.
    pub min_age_days: u32,
    /// Number of newest versions that are always retained.
    pub min_retained: usize,
    /// Cap on deleted versions per run.
    pub max_deletions: usize,
}

impl FromStr for ReleaseModuleConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() < 2 || fields.len() > 5 {
            return Err(Error::configuration(format!(
                "release module {s:?} must have 2 to 5 colon-separated fields"
            )));
        }
        if fields[0].is_empty() || fields[1].is_empty() {
            return Err(Error::configuration(format!(
                "release module {s:?} needs a repository and a root path"
            )));
        }
        Ok(Self {
            repo: fields[0].to_owned(),
            root: fields[1].to_owned(),
            min_age_days: parse_field(s, fields.get(2), "minAgeDays", DEFAULT_MIN_AGE_DAYS)?,
            min_retained: parse_field(s, fields.get(3), "minRetained", DEFAULT_MIN_RETAINED)?,
            max_deletions: parse_field(s, fields.get(4), "maxDeletions", DEFAULT_MAX_DELETIONS)?,
        })
    }
}

fn parse_field<T: FromStr>(
    module: &str,
    field: Option<&&str>,
    name: &str,
    default: T,
) -> Result<T> {
    match field {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            Error::configuration(format!(
                "release module {module:?}: {name} {raw:?} is not a number"
            ))
        }),
    }
}

/// Deletes old release versions of one module.
///
/// All versions under the module root are ordered ascending; the
/// newest `min_retained` are dropped from consideration, anything
/// created inside the age window is dropped next, and at most
/// `max_deletions` of the rest are deleted, oldest first. Deleting a
/// version removes every file inside that version's folder, across
/// sibling modules released together.
pub struct ReleasePolicy {
    store: RetryingStore,
    config: ReleaseModuleConfig,
    name: String,
}

impl ReleasePolicy {
    /// Creates the policy for one module.
    #[must_use]
    pub fn new(store: RetryingStore, config: ReleaseModuleConfig) -> Self {
        let name = format!("release {}:{}", config.repo, config.root);
        Self {
            store,
            config,
            name,
        }
    }

    fn all_versions_query(&self) -> ItemQuery {
        ItemQuery::repo(&self.config.repo)
            .path_matches(format!("{}/*", self.config.root))
            .name_matches("*.pom")
            .include(["repo", "path", "name", "created"])
    }

    fn version_files_query(&self, item: &ArtifactItem) -> ItemQuery {
        ItemQuery::repo(&self.config.repo)
            .path_matches(format!("{}/*", item.parent_path()))
            .name_matches_any([
                format!("*-{}.*", item.version),
                format!("*-{}-*", item.version),
            ])
            .include(["repo", "path", "name"])
    }

    /// Orders versions ascending, protects the newest ones, and keeps
    /// only those created before the age cutoff.
    fn deletable(&self, items: Vec<ArtifactItem>) -> Result<Vec<ArtifactItem>> {
        let mut versions = items;
        versions.sort_by_cached_key(|item| Version::new(&item.version));
        versions.truncate(versions.len().saturating_sub(self.config.min_retained));

        let cutoff = Utc::now() - chrono::Duration::days(i64::from(self.config.min_age_days));
        let mut old = Vec::new();
        for item in versions {
            let created = item.created.ok_or_else(|| {
                Error::malformed_timestamp(item.version_path(), "missing created timestamp")
            })?;
            if created <= cutoff {
                old.push(item);
            }
        }
        Ok(old)
    }

    async fn delete_version(&self, item: &ArtifactItem) -> Result<()> {
        tracing::info!(
            version = %item.version,
            path = %item.logical_path,
            "deleting release version"
        );
        let files = self.store.search(&self.version_files_query(item)).await?;
        // The name globs also match versions extending this one, such
        // as `1.0.5` or `1.0-beta` when deleting `1.0`. Only rows
        // inside the version's own folder belong to it.
        let folder_suffix = format!("/{}", item.version);
        for file in &files {
            if !file.path.ends_with(&folder_suffix) {
                continue;
            }
            let path = format!("{}/{}", file.path, file.name);
            tracing::info!(repo = %self.config.repo, path = %path, "deleting release file");
            self.store.delete(&self.config.repo, &path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RetentionPolicy for ReleasePolicy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<()> {
        let query = self.all_versions_query();
        tracing::info!(aql = %query.to_aql(), "searching for release versions");
        let rows = self.store.search(&query).await?;
        let items = rows
            .iter()
            .map(ArtifactItem::from_aql)
            .collect::<Result<Vec<_>>>()?;
        let total = items.len();

        let deletable = self.deletable(items)?;
        if deletable.is_empty() {
            tracing::info!(
                repo = %self.config.repo,
                root = %self.config.root,
                versions = total,
                "no release versions eligible for deletion"
            );
            return Ok(());
        }
        tracing::info!(
            repo = %self.config.repo,
            root = %self.config.root,
            versions = total,
            eligible = deletable.len(),
            deleting = deletable.len().min(self.config.max_deletions),
            "deleting old release versions"
        );
        for item in deletable.iter().take(self.config.max_deletions) {
            self.delete_version(item).await?;
        }
        Ok(())
    }
}
