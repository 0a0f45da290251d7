//! # janitor-retention
//!
//! Retention policies for the janitor artifact retention engine.
//!
//! Each policy decides which artifacts in a remote store are stale and
//! deletes them:
//!
//! - **Snapshot**: snapshot versions superseded by a newer release,
//!   via catalog query or folder-tree walk
//! - **Docker**: image tags past a keep count, or snapshot tags
//!   shadowed by a release tag
//! - **Release**: old release versions of one module, age-gated and
//!   capped per run
//!
//! Policies share the [`RetentionPolicy`] trait and run under
//! [`execute_all`], which isolates failures so one broken policy never
//! stops the rest. Every remote call goes through a
//! [`RetryingStore`](janitor_core::retry::RetryingStore); policies
//! hold no bare store handle.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod docker;
pub mod group;
pub mod policy;
pub mod release;
pub mod snapshot;

pub use docker::{DockerCatalogPolicy, DockerQueryPolicy, TagFilters, DEFAULT_TAGS_TO_KEEP};
pub use policy::{
    execute_all, PolicyFailure, RetentionPolicy, RunOutcome, DEFAULT_DELETE_CONCURRENCY,
};
pub use release::{ReleaseModuleConfig, ReleasePolicy};
pub use snapshot::{SnapshotQueryPolicy, SnapshotWalkPolicy, SNAPSHOT_SUFFIX};
