use crate::output;
use annex::{AnnexLifecycle, SetupReport, TeardownReport};
use anyhow::{Context, Result};
use clap::Subcommand;
use config::Config;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum AnnexCommand {
    #[command(about = "Initialize and configure the annex (safe to repeat)")]
    Setup {
        #[arg(help = "Repository path")]
        path: PathBuf
    },

    #[command(about = "Synchronize annexed content, retrying once on failure")]
    Sync {
        #[arg(help = "Repository path")]
        path: PathBuf
    },

    #[command(about = "Uninit the annex and make the tree deletable")]
    Teardown {
        #[arg(help = "Repository path")]
        path: PathBuf
    }
}

pub async fn run(cmd: AnnexCommand, config: &Config) -> Result<()> {
    let lifecycle = AnnexLifecycle::from_config(&config.annex);

    match cmd {
        AnnexCommand::Setup { path } => {
            let report = tokio::task::spawn_blocking(move || lifecycle.setup(&path))
                .await
                .context("Annex worker failed")??;
            print_setup(&report);
        }
        AnnexCommand::Sync { path } => {
            let shown = path.display().to_string();
            tokio::task::spawn_blocking(move || lifecycle.sync(&path))
                .await
                .context("Annex worker failed")??;
            output::success(&format!("Synchronized {shown}"));
        }
        AnnexCommand::Teardown { path } => {
            let report = tokio::task::spawn_blocking(move || lifecycle.teardown(&path))
                .await
                .context("Annex worker failed")?;
            print_teardown(&report);
        }
    }
    Ok(())
}

fn print_setup(report: &SetupReport) {
    output::header("Annex setup");
    output::field("path", report.path.display());
    let completed: Vec<&str> = report.completed.iter().map(|s| s.as_str()).collect();
    output::field("completed", completed.join(", "));
    for failure in &report.failures {
        output::warn(&format!("{} failed: {}", failure.step, failure.error));
    }
    if report.is_complete() {
        output::success("Annex configured");
    }
}

fn print_teardown(report: &TeardownReport) {
    output::header("Annex teardown");
    output::field("path", report.path.display());
    match (&report.uninit_error, &report.remediation) {
        (None, _) => output::success("Annex uninitialized"),
        (Some(e), remediation) => {
            output::warn(&format!("uninit failed: {e}"));
            if let Some(r) = remediation {
                output::field("files", r.files);
                output::field("directories", r.directories);
                for failure in &r.failures {
                    output::warn(&format!("{}: {}", failure.path, failure.reason));
                }
            }
        }
    }
}
