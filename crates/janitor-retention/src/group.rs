//! Grouping of artifact descriptors.

use std::collections::BTreeMap;

use janitor_core::item::ArtifactItem;

/// Descriptors grouped by logical path, ordered by path.
pub type RetentionGroups = BTreeMap<String, Vec<ArtifactItem>>;

/// Groups descriptors by their logical path.
///
/// Iteration over the result is ordered by path, so runs over the same
/// catalog state make the same decisions in the same order. Within a
/// group the input order is preserved.
#[must_use]
pub fn by_logical_path(items: Vec<ArtifactItem>) -> RetentionGroups {
    let mut groups = RetentionGroups::new();
    for item in items {
        groups
            .entry(item.logical_path.clone())
            .or_default()
            .push(item);
    }
    groups
}
