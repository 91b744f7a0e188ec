use crate::output;
use anyhow::Result;
use clap::Args;
use config::Config;
use gin_core::{SearchKind, SearchRequest};
use indexing::SearchClient;

#[derive(Args)]
pub struct SearchArgs {
    #[arg(help = "Query string")]
    pub query: String,

    #[arg(
        long,
        default_value = "match",
        help = "match, fuzzy, wildcard, query or suggest"
    )]
    pub kind: SearchKind,

    #[arg(long, default_value_t = 0, help = "Search on behalf of this user ID")]
    pub user_id: i64,

    #[arg(long, help = "Output as JSON")]
    pub json: bool
}

pub async fn run(args: SearchArgs, config: &Config) -> Result<()> {
    let client = SearchClient::new(&config.search)?;
    let request = SearchRequest {
        user_id: args.user_id,
        query: args.query,
        kind: args.kind,
        ..Default::default()
    };

    let results = client.search(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        output::info("No results");
        return Ok(());
    }

    output::header(&format!("Files ({})", results.blobs.len()));
    for blob in &results.blobs {
        if let Some(source) = &blob.source {
            println!("  {:>6.2}  {}: {}", blob.score, source.repo_name, source.path);
        }
    }
    output::header(&format!("Commits ({})", results.commits.len()));
    for commit in &results.commits {
        if let Some(source) = &commit.source {
            println!("  {:>6.2}  {}: {}", commit.score, source.repo_name, source.oid);
        }
    }
    Ok(())
}
