//! Shared test utilities for the janitor crates.
//!
//! This crate provides:
//! - [`RecordingStore`]: In-memory artifact store with operation recording
//! - Factory functions for search rows and folder listings
//!
//! # Example
//!
//! ```rust,ignore
//! use janitor_test_utils::{RecordingStore, fixtures::row};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let store = RecordingStore::new();
//!     store.push_search_results(vec![row("/test/1.0-SNAPSHOT")]);
//!     // ... run a policy against the store ...
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod fixtures;
pub mod store;

pub use fixtures::*;
pub use store::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("janitor_retention=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
