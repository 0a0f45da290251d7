//! Ping command - check connectivity to the artifact store.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use janitor_core::store::ArtifactStore;

use crate::client::HttpStore;
use crate::Config;

/// Execute the ping command.
///
/// The probe is a single attempt without retries, so a dead store is
/// reported right away.
///
/// # Errors
///
/// Returns an error if the store cannot be reached or rejects the probe.
pub async fn execute(config: &Config) -> Result<()> {
    let store = HttpStore::primary(config).context("Failed to create store client")?;

    let version = store
        .system_version()
        .await
        .with_context(|| format!("Store at {} did not answer", config.url))?;

    println!("{} {}", "OK".green().bold(), config.url);
    println!("  Version:  {}", version.version);
    println!("  Revision: {}", version.revision);
    if !version.addons.is_empty() {
        println!("  Addons:   {}", version.addons.join(", "));
    }

    Ok(())
}
