//! Artifact item descriptors.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{Error, Result};

/// One row of a catalog search response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AqlItem {
    /// Repository holding the item.
    pub repo: String,
    /// Folder path of the item, relative to the repository root.
    pub path: String,
    /// File name of the item.
    pub name: String,
    /// Last-modified timestamp, present when the query asked for it.
    #[serde(default)]
    pub modified: Option<String>,
    /// Creation timestamp, present when the query asked for it.
    #[serde(default)]
    pub created: Option<String>,
}

/// Envelope of a catalog search response.
#[derive(Debug, Deserialize)]
pub struct AqlResults {
    /// Matched items.
    pub results: Vec<AqlItem>,
}

/// A versioned artifact derived from a search row.
///
/// The final segment of the row's path is taken as the version, the
/// rest as the logical artifact path, so `com/acme/app/1.2.0` becomes
/// logical path `com/acme/app` with version `1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactItem {
    /// Path of the artifact without the version segment.
    pub logical_path: String,
    /// Version segment, exactly as it appears in the path.
    pub version: String,
    /// Last-modified timestamp, when the source row carried one.
    pub modified: Option<DateTime<Utc>>,
    /// Creation timestamp, when the source row carried one.
    pub created: Option<DateTime<Utc>>,
}

impl ArtifactItem {
    /// Builds a descriptor from a search row, splitting its path and
    /// parsing any timestamps it carries.
    ///
    /// # Errors
    ///
    /// Fails when the path has no `/` to split on or a timestamp is
    /// not valid RFC 3339.
    pub fn from_aql(item: &AqlItem) -> Result<Self> {
        let (logical_path, version) = item
            .path
            .rsplit_once('/')
            .ok_or_else(|| Error::malformed_path(&item.path))?;
        Ok(Self {
            logical_path: logical_path.to_owned(),
            version: version.to_owned(),
            modified: item.modified.as_deref().map(parse_timestamp).transpose()?,
            created: item.created.as_deref().map(parse_timestamp).transpose()?,
        })
    }

    /// Repository-relative path of the version folder.
    #[must_use]
    pub fn version_path(&self) -> String {
        format!("{}/{}", self.logical_path, self.version)
    }

    /// Logical path with its final segment removed. Single-segment
    /// paths stay as they are.
    #[must_use]
    pub fn parent_path(&self) -> &str {
        match self.logical_path.rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => parent,
            _ => &self.logical_path,
        }
    }
}

/// Parses a store timestamp (RFC 3339 with offset) into UTC.
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| Error::malformed_timestamp(value, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(path: &str) -> AqlItem {
        AqlItem {
            repo: "libs".to_owned(),
            path: path.to_owned(),
            name: "app-1.0.pom".to_owned(),
            modified: None,
            created: None,
        }
    }

    #[test]
    fn splits_path_at_final_slash() {
        let item = ArtifactItem::from_aql(&row("com/acme/app/1.2.0")).unwrap();
        assert_eq!(item.logical_path, "com/acme/app");
        assert_eq!(item.version, "1.2.0");
        assert_eq!(item.version_path(), "com/acme/app/1.2.0");
    }

    #[test]
    fn keeps_leading_slash_in_logical_path() {
        let item = ArtifactItem::from_aql(&row("/test/1.0-SNAPSHOT")).unwrap();
        assert_eq!(item.logical_path, "/test");
        assert_eq!(item.version, "1.0-SNAPSHOT");
    }

    #[test]
    fn path_without_separator_is_malformed() {
        let err = ArtifactItem::from_aql(&row("standalone")).unwrap_err();
        assert!(matches!(err, Error::MalformedPath { path } if path == "standalone"));
    }

    #[test]
    fn parent_path_drops_one_segment() {
        let item = ArtifactItem::from_aql(&row("com/acme/app/1.2.0")).unwrap();
        assert_eq!(item.parent_path(), "com/acme");
    }

    #[test]
    fn parent_path_of_short_logical_path_is_unchanged() {
        let leading = ArtifactItem::from_aql(&row("/test/1.0")).unwrap();
        assert_eq!(leading.parent_path(), "/test");
        let bare = ArtifactItem::from_aql(&row("test/1.0")).unwrap();
        assert_eq!(bare.parent_path(), "test");
    }

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let mut source = row("acme/image/1.1");
        source.modified = Some("2000-05-05T16:44:30.629+02:00".to_owned());
        let item = ArtifactItem::from_aql(&source).unwrap();
        let expected = Utc.with_ymd_and_hms(2000, 5, 5, 14, 44, 30).unwrap()
            + chrono::Duration::milliseconds(629);
        assert_eq!(item.modified, Some(expected));
        assert_eq!(item.created, None);
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let mut source = row("acme/image/1.1");
        source.created = Some("yesterday".to_owned());
        let err = ArtifactItem::from_aql(&source).unwrap_err();
        assert!(matches!(err, Error::MalformedTimestamp { value, .. } if value == "yesterday"));
    }
}
