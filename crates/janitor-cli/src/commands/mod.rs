//! CLI subcommand implementations.

pub mod ping;
pub mod run;
