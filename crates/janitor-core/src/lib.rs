//! # janitor-core
//!
//! Core abstractions for the janitor artifact retention engine.
//!
//! This crate provides the foundational types used by every retention
//! policy and by the command-line front end:
//!
//! - **Version Ordering**: Total order over artifact version strings
//! - **Item Descriptors**: Search rows and their versioned-path form
//! - **Catalog Queries**: Builder for the store's item search language
//! - **Store Interface**: The remote store trait and its retry wrapper
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `janitor-core` is the only crate allowed to define shared
//! primitives. Retention policies and transport implementations both
//! depend on the contracts defined here and never on each other's
//! internals.
//!
//! ## Example
//!
//! ```rust
//! use janitor_core::prelude::*;
//!
//! let query = ItemQuery::repo("libs-snapshot")
//!     .name_matches("*.pom")
//!     .include(["repo", "path", "name"]);
//! assert!(query.to_aql().starts_with("items.find"));
//!
//! assert!(Version::new("1.4.3-SNAPSHOT") < Version::new("1.4.3"));
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod item;
pub mod observability;
pub mod query;
pub mod retry;
pub mod store;
pub mod version;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use janitor_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::item::{AqlItem, AqlResults, ArtifactItem};
    pub use crate::query::ItemQuery;
    pub use crate::retry::{RetryPolicy, RetryingStore};
    pub use crate::store::{ArtifactStore, StorageChild, SystemVersion};
    pub use crate::version::Version;
}

pub use error::{Error, Result};
