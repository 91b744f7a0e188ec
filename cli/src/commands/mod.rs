pub mod annex;
pub mod index;
pub mod rebuild;
pub mod search;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gin-sidecar",
    author,
    version,
    about = "Search index dispatch and git-annex sidecar management",
    long_about = "Operator tooling for the search index and the git-annex sidecar of \
                  repositories.\n\nSettings come from defaults, then an optional config file, \
                  then GIN_* environment variables."
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "GIN_CONFIG",
        help = "Configuration file (.toml, .yaml or .yml)"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Send one repository to the search service and wait for the outcome")]
    Index(index::IndexArgs),

    #[command(about = "Reindex every repository listed in a manifest")]
    Rebuild(rebuild::RebuildArgs),

    #[command(subcommand, about = "Set up, sync or tear down a repository's annex")]
    Annex(annex::AnnexCommand),

    #[command(about = "Query the search service")]
    Search(search::SearchArgs)
}
