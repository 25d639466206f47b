mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gpfinder_core::Postcode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gpfinder")]
#[command(about = "Find GP surgeries near a UK postcode")]
struct Cli {
    /// Root of the raw page store (overrides GPFINDER_RAW_DIR).
    #[arg(long, global = true)]
    raw_dir: Option<PathBuf>,

    /// Directory for the summary table (overrides GPFINDER_OUTPUT_DIR).
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk the directory's search results and store each page.
    Discover {
        #[arg(value_parser = Postcode::parse)]
        postcode: Postcode,
    },
    /// Fetch details for discovered surgeries and write the summary table.
    Summarise {
        #[arg(value_parser = Postcode::parse)]
        postcode: Postcode,
        /// Re-attempt surgeries whose earlier detail or reviews fetch failed.
        #[arg(long)]
        retry_failed: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = gpfinder_core::load_app_config()?;
    if let Some(raw_dir) = cli.raw_dir {
        config.raw_dir = raw_dir;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "configuration loaded");

    let run = async {
        match cli.command {
            Commands::Discover { postcode } => commands::run_discover(&config, &postcode).await,
            Commands::Summarise {
                postcode,
                retry_failed,
            } => commands::run_summarise(&config, &postcode, retry_failed).await,
        }
    };

    tokio::select! {
        result = run => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::warn!(raw_dir = %config.raw_dir.display(), "interrupted; stored pages are kept for the next run");
            anyhow::bail!("interrupted")
        }
    }
}
