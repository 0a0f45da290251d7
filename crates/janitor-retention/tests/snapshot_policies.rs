//! Snapshot retention policy tests.
//!
//! Covers both strategies against a recording store: the catalog-query
//! policy (grouping, version ordering, repository OR-form) and the
//! tree-walk policy (descent, release cross-check), plus retry
//! behavior when the store misbehaves.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use janitor_core::error::Error;
use janitor_core::retry::{RetryPolicy, RetryingStore};
use janitor_retention::policy::RetentionPolicy;
use janitor_retention::{SnapshotQueryPolicy, SnapshotWalkPolicy};
use janitor_test_utils::fixtures::{file, folder, row};
use janitor_test_utils::RecordingStore;

fn retrying(store: &RecordingStore) -> RetryingStore {
    RetryingStore::new(Arc::new(store.clone()), RetryPolicy::none())
}

fn retrying_with_attempts(store: &RecordingStore, attempts: u32) -> RetryingStore {
    RetryingStore::new(Arc::new(store.clone()), RetryPolicy::new(attempts, Duration::ZERO))
}

fn sorted_deletes(store: &RecordingStore) -> Vec<(String, String)> {
    let mut deletes = store.deletes();
    deletes.sort();
    deletes
}

#[tokio::test]
async fn query_policy_deletes_snapshots_below_the_newest_release() {
    let store = RecordingStore::new();
    store.push_search_results(vec![
        row("/test/1.0-SNAPSHOT"),
        row("/test/1.1-SNAPSHOT"),
        row("/test/1.2"),
        row("/test/1.3-SNAPSHOT"),
        row("/a/b/c/8-SNAPSHOT"),
        row("/a/b/c/10"),
    ]);

    let policy = SnapshotQueryPolicy::new(retrying(&store), "snapshots", "releases");
    policy.execute().await.expect("policy run");

    assert_eq!(
        sorted_deletes(&store),
        vec![
            ("snapshots".to_owned(), "/a/b/c/8-SNAPSHOT".to_owned()),
            ("snapshots".to_owned(), "/test/1.0-SNAPSHOT".to_owned()),
            ("snapshots".to_owned(), "/test/1.1-SNAPSHOT".to_owned()),
        ]
    );
}

#[tokio::test]
async fn query_policy_searches_both_repositories_when_distinct() {
    let store = RecordingStore::new();
    let policy = SnapshotQueryPolicy::new(retrying(&store), "snapshots", "releases");
    policy.execute().await.expect("policy run");

    let ops = store.operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(
        ops[0],
        janitor_test_utils::StoreOp::Search {
            aql: r#"items.find({"$and":[{"$or":[{"repo":"snapshots"},{"repo":"releases"}]},{"name":{"$match":"*.pom"}}]}).include("repo","path","name")"#
                .to_owned()
        }
    );
}

#[tokio::test]
async fn query_policy_uses_the_single_repo_form_for_a_shared_repo() {
    let store = RecordingStore::new();
    let policy = SnapshotQueryPolicy::new(retrying(&store), "libs", "libs");
    policy.execute().await.expect("policy run");

    let ops = store.operations();
    assert_eq!(
        ops[0],
        janitor_test_utils::StoreOp::Search {
            aql: r#"items.find({"$and":[{"repo":"libs"},{"name":{"$match":"*.pom"}}]}).include("repo","path","name")"#
                .to_owned()
        }
    );
}

#[tokio::test]
async fn query_policy_keeps_snapshots_without_any_release() {
    let store = RecordingStore::new();
    store.push_search_results(vec![
        row("/test/1.0-SNAPSHOT"),
        row("/test/1.1-SNAPSHOT"),
    ]);

    let policy = SnapshotQueryPolicy::new(retrying(&store), "snapshots", "releases");
    policy.execute().await.expect("policy run");

    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn query_policy_fails_on_malformed_paths_without_deleting() {
    let store = RecordingStore::new();
    store.push_search_results(vec![row("standalone")]);

    let policy = SnapshotQueryPolicy::new(retrying(&store), "snapshots", "releases");
    let err = policy.execute().await.unwrap_err();

    assert!(matches!(err, Error::MalformedPath { .. }));
    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn query_policy_retries_search_until_attempts_run_out() {
    let store = RecordingStore::new();
    store.fail_always();

    let policy =
        SnapshotQueryPolicy::new(retrying_with_attempts(&store, 3), "snapshots", "releases");
    let err = policy.execute().await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(store.search_count(), 3);
    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn query_policy_recovers_from_transient_search_failures() {
    let store = RecordingStore::new();
    store.fail_times(2);
    store.push_search_results(vec![row("/test/1.0-SNAPSHOT"), row("/test/1.2")]);

    let policy =
        SnapshotQueryPolicy::new(retrying_with_attempts(&store, 5), "snapshots", "releases");
    policy.execute().await.expect("policy run");

    assert_eq!(store.search_count(), 3);
    assert_eq!(
        store.deletes(),
        vec![("snapshots".to_owned(), "/test/1.0-SNAPSHOT".to_owned())]
    );
}

#[tokio::test]
async fn walk_policy_deletes_snapshots_with_a_released_counterpart() {
    let store = RecordingStore::new();
    store.set_children(
        "snapshots",
        "",
        vec![folder("a"), folder("b-SNAPSHOT"), file("index.html")],
    );
    store.set_children(
        "snapshots",
        "a",
        vec![
            folder("1.0-SNAPSHOT"),
            folder("2.0-SNAPSHOT"),
            file("maven-metadata.xml"),
        ],
    );
    store.set_children("releases", "b", vec![file("b.jar")]);
    store.set_children("releases", "a/1.0", vec![file("a-1.0.pom")]);
    // releases:a/2.0 stays absent, so a/2.0-SNAPSHOT must survive

    let policy = SnapshotWalkPolicy::new(retrying(&store), "snapshots", "releases");
    policy.execute().await.expect("policy run");

    assert_eq!(
        sorted_deletes(&store),
        vec![
            ("snapshots".to_owned(), "a/1.0-SNAPSHOT".to_owned()),
            ("snapshots".to_owned(), "b-SNAPSHOT".to_owned()),
        ]
    );
}

#[tokio::test]
async fn walk_policy_descends_through_deep_trees() {
    let store = RecordingStore::new();
    store.set_children("snapshots", "", vec![folder("com")]);
    store.set_children("snapshots", "com", vec![folder("acme")]);
    store.set_children("snapshots", "com/acme", vec![folder("9.1-SNAPSHOT")]);
    store.set_children("releases", "com/acme/9.1", vec![file("acme-9.1.jar")]);

    let policy = SnapshotWalkPolicy::new(retrying(&store), "snapshots", "releases");
    policy.execute().await.expect("policy run");

    assert_eq!(
        store.deletes(),
        vec![("snapshots".to_owned(), "com/acme/9.1-SNAPSHOT".to_owned())]
    );
}

#[tokio::test]
async fn walk_policy_surfaces_listing_failures_after_retries() {
    let store = RecordingStore::new();
    store.fail_always();

    let policy =
        SnapshotWalkPolicy::new(retrying_with_attempts(&store, 2), "snapshots", "releases");
    let err = policy.execute().await.unwrap_err();

    assert!(err.is_remote());
    assert_eq!(store.operations().len(), 2);
    assert!(store.deletes().is_empty());
}
