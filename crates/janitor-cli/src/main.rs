//! Janitor CLI - retention cleanup for artifact repositories.
//!
//! The main entry point for the `janitor` binary.

use anyhow::Result;
use clap::Parser;

use janitor_cli::{Cli, Commands};
use janitor_core::observability::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format.into());

    let config = cli.config();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Run(args) => janitor_cli::commands::run::execute(args, &config).await,
            Commands::Ping => janitor_cli::commands::ping::execute(&config).await,
        }
    })
}
