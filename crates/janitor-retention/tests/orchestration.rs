//! Orchestration tests over real policies.
//!
//! A failing policy must not keep the remaining policies from running,
//! and the outcome has to name every policy that failed.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use janitor_core::retry::{RetryPolicy, RetryingStore};
use janitor_retention::policy::{execute_all, RetentionPolicy};
use janitor_retention::{DockerCatalogPolicy, SnapshotQueryPolicy};
use janitor_test_utils::RecordingStore;

fn retrying(store: &RecordingStore) -> RetryingStore {
    RetryingStore::new(Arc::new(store.clone()), RetryPolicy::none())
}

#[tokio::test]
async fn a_failing_policy_does_not_stop_the_rest() {
    let snapshot_store = RecordingStore::new();
    snapshot_store.fail_always();

    let docker_store = RecordingStore::new();
    docker_store.set_docker_repositories("docker-local", ["acme/app"]);
    docker_store.set_docker_tags("docker-local", "acme/app", ["1.0", "1.0-SNAPSHOT"]);

    let policies: Vec<Box<dyn RetentionPolicy>> = vec![
        Box::new(SnapshotQueryPolicy::new(
            retrying(&snapshot_store),
            "libs-snapshot",
            "libs-release",
        )),
        Box::new(DockerCatalogPolicy::new(retrying(&docker_store), "docker-local")),
    ];

    let outcome = execute_all(&policies).await;

    assert!(outcome.has_failures());
    assert_eq!(outcome.completed, vec!["docker-catalog".to_owned()]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].policy, "snapshot-query");
    assert!(outcome.failures[0].error.is_remote());
    // the docker policy still did its work
    assert_eq!(
        docker_store.deletes(),
        vec![("docker-local".to_owned(), "acme/app/1.0-SNAPSHOT".to_owned())]
    );
}

#[tokio::test]
async fn a_clean_run_reports_every_policy_as_completed() {
    let snapshot_store = RecordingStore::new();
    let docker_store = RecordingStore::new();
    docker_store.set_docker_repositories("docker-local", ["acme/app"]);
    docker_store.set_docker_tags("docker-local", "acme/app", ["1.0"]);

    let policies: Vec<Box<dyn RetentionPolicy>> = vec![
        Box::new(SnapshotQueryPolicy::new(
            retrying(&snapshot_store),
            "libs-snapshot",
            "libs-release",
        )),
        Box::new(DockerCatalogPolicy::new(retrying(&docker_store), "docker-local")),
    ];

    let outcome = execute_all(&policies).await;

    assert!(!outcome.has_failures());
    assert_eq!(
        outcome.completed,
        vec!["snapshot-query".to_owned(), "docker-catalog".to_owned()]
    );
    assert!(docker_store.deletes().is_empty());
}
