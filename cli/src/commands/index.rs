use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use config::Config;
use gin_core::Repository;
use indexing::IndexDispatcher;
use std::path::PathBuf;

#[derive(Args)]
pub struct IndexArgs {
    #[arg(long, help = "Repository ID")]
    pub id: i64,

    #[arg(long, help = "Owner name")]
    pub owner: String,

    #[arg(long, help = "Repository name")]
    pub name: String,

    #[arg(long, help = "Repository path on disk (not sent to the service)")]
    pub path: Option<PathBuf>
}

pub async fn run(args: IndexArgs, config: &Config) -> Result<()> {
    let dispatcher = IndexDispatcher::new(&config.search)?;
    let repo = Repository::new(
        args.id,
        args.owner,
        args.name,
        args.path.unwrap_or_default()
    );

    dispatcher
        .dispatch(&repo)
        .await
        .with_context(|| format!("Indexing {} failed", repo.full_name()))?;

    output::success(&format!("Index request for {repo} accepted"));
    Ok(())
}
