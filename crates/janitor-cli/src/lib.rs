//! # janitor-cli
//!
//! Command-line interface for the janitor artifact retention engine.
//!
//! ## Commands
//!
//! - `janitor run` - Run the configured retention policies
//! - `janitor ping` - Check connectivity to the artifact store
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `JANITOR_URL` - Base URL of the artifact store
//! - `JANITOR_USER` / `JANITOR_PASSWORD` - Store credentials
//! - `JANITOR_RELEASE_USER` / `JANITOR_RELEASE_PASSWORD` - Optional
//!   credentials used only by release cleanup
//! - `JANITOR_RELEASE_CLEAN` - Comma-separated release module specs

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;

use std::time::Duration;

use clap::{Parser, Subcommand};

use janitor_core::observability;
use janitor_core::retry::RetryPolicy;

/// Janitor CLI - artifact retention from the command line.
#[derive(Debug, Parser)]
#[command(name = "janitor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the artifact store.
    #[arg(long, env = "JANITOR_URL")]
    pub url: String,

    /// User for the artifact store.
    #[arg(long, env = "JANITOR_USER")]
    pub user: String,

    /// Password for the artifact store.
    #[arg(long, env = "JANITOR_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// User for release cleanup, when different from `--user`.
    #[arg(long, env = "JANITOR_RELEASE_USER")]
    pub release_user: Option<String>,

    /// Password for release cleanup, when different from `--password`.
    #[arg(long, env = "JANITOR_RELEASE_PASSWORD", hide_env_values = true)]
    pub release_password: Option<String>,

    /// Attempts per remote call before giving up.
    #[arg(long, default_value_t = 12)]
    pub retry_count: u32,

    /// Pause between attempts, in seconds.
    #[arg(long, default_value_t = 15)]
    pub retry_sleep_secs: u64,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            release_user: self.release_user.clone(),
            release_password: self.release_password.clone(),
            retry: RetryPolicy::new(self.retry_count, Duration::from_secs(self.retry_sleep_secs)),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the configured retention policies.
    Run(commands::run::RunArgs),
    /// Check connectivity to the artifact store.
    Ping,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable log lines.
    #[default]
    Pretty,
    /// One JSON object per log line.
    Json,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Json => Self::Json,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the artifact store.
    pub url: String,
    /// User for the artifact store.
    pub user: String,
    /// Password for the artifact store.
    pub password: String,
    /// User for release cleanup, when different from the primary.
    pub release_user: Option<String>,
    /// Password for release cleanup, when different from the primary.
    pub release_password: Option<String>,
    /// Retry policy applied to every remote call.
    pub retry: RetryPolicy,
}

impl Config {
    /// Credentials for release cleanup, falling back to the primary pair.
    #[must_use]
    pub fn release_credentials(&self) -> (&str, &str) {
        (
            self.release_user.as_deref().unwrap_or(&self.user),
            self.release_password.as_deref().unwrap_or(&self.password),
        )
    }
}
