use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use config::Config;
use gin_core::InMemoryRepositoryStore;
use indexing::{IndexDispatcher, IndexRebuilder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct RebuildArgs {
    #[arg(long, help = "JSON manifest: an array of {id, owner, name, path} objects")]
    pub repos: PathBuf,

    #[arg(
        long,
        default_value_t = 30,
        help = "Seconds to wait for scheduled requests before exiting"
    )]
    pub drain_secs: u64
}

pub async fn run(args: RebuildArgs, config: &Config) -> Result<()> {
    let dispatcher = IndexDispatcher::new(&config.search)?;
    let store = InMemoryRepositoryStore::from_manifest(&args.repos)
        .with_context(|| format!("Cannot load {}", args.repos.display()))?;
    let rebuilder = IndexRebuilder::new(Arc::new(store), dispatcher);

    let scheduled = rebuilder.rebuild_index().await?;
    let count = scheduled.scheduled();
    output::info(&format!("{count} repositories scheduled for indexing"));

    // Outcomes are only logged; this just keeps the process alive for them.
    if tokio::time::timeout(Duration::from_secs(args.drain_secs), scheduled.wait())
        .await
        .is_err()
    {
        output::warn(&format!(
            "Gave up waiting after {}s, some requests may not have been sent",
            args.drain_secs
        ));
    } else {
        output::success(&format!("Rebuild finished for {count} repositories"));
    }
    Ok(())
}
