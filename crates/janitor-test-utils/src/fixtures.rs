//! Factory functions for store fixtures.

use janitor_core::item::AqlItem;
use janitor_core::store::StorageChild;

/// Search row with the given folder path. Repository and file name
/// carry placeholder values for tests that only group by path.
#[must_use]
pub fn row(path: &str) -> AqlItem {
    named_row(path, "artifact.pom")
}

/// Search row with an explicit file name.
#[must_use]
pub fn named_row(path: &str, name: &str) -> AqlItem {
    AqlItem {
        repo: "test-repo".to_owned(),
        path: path.to_owned(),
        name: name.to_owned(),
        modified: None,
        created: None,
    }
}

/// Search row carrying a last-modified timestamp.
#[must_use]
pub fn modified_row(path: &str, modified: &str) -> AqlItem {
    AqlItem {
        modified: Some(modified.to_owned()),
        ..row(path)
    }
}

/// Search row carrying a created timestamp.
#[must_use]
pub fn created_row(path: &str, name: &str, created: &str) -> AqlItem {
    AqlItem {
        created: Some(created.to_owned()),
        ..named_row(path, name)
    }
}

/// Folder entry of a storage listing.
#[must_use]
pub fn folder(name: &str) -> StorageChild {
    StorageChild {
        uri: format!("/{name}"),
        folder: true,
    }
}

/// File entry of a storage listing.
#[must_use]
pub fn file(name: &str) -> StorageChild {
    StorageChild {
        uri: format!("/{name}"),
        folder: false,
    }
}
