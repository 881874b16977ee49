//! Repostats CLI - harvest GitHub repository metrics into CSV tables.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::harvest::{HarvestOptions, Table};

const DEFAULT_LOG_FILTER: &str = "repostats=info,repostats_cli=info";

#[derive(Parser)]
#[command(name = "repostats")]
#[command(version)]
#[command(about = "Harvest GitHub repository metrics into CSV tables")]
#[command(
    long_about = "Repostats pulls tags, pull requests, commits and branches for every \
repository of one GitHub account and reduces them to flat CSV metric tables \
(latest tags, pull request status, deployment frequency and speed, and more)."
)]
#[command(after_long_help = r#"EXAMPLES
    Harvest every table for an account:
        $ repostats harvest --owner acme --output ./metrics

    Harvest only the deployment tables:
        $ repostats harvest deployment-frequency deployment-speed

    List the account's repositories:
        $ repostats repos --owner acme

CONFIGURATION
    Repostats reads configuration from:
      1. ~/.config/repostats/config.toml (or $XDG_CONFIG_HOME/repostats/config.toml)
      2. ./repostats.toml
      3. Environment variables (REPOSTATS_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    REPOSTATS_GITHUB_OWNER    Account whose repositories are harvested
    REPOSTATS_GITHUB_TOKEN    GitHub personal access token
    REPOSTATS_OUTPUT_DIR      Destination directory for the CSV tables
    REPOSTATS_HARVEST__*      Harvest knobs (e.g. REPOSTATS_HARVEST__MAX_RETRIES)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest one or more metric tables
    Harvest {
        /// Tables to harvest (default: all of them)
        #[arg(value_enum)]
        tables: Vec<Table>,

        /// Account whose repositories are harvested (overrides config)
        #[arg(short = 'u', long)]
        owner: Option<String>,

        /// Destination directory for the CSV tables (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum concurrent repository tasks (default from config or 4)
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,
    },
    /// List the account's repositories without writing any table
    Repos {
        /// Account whose repositories are listed (overrides config)
        #[arg(short = 'u', long)]
        owner: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Log warnings about skipped repositories and per-table progress are the
    // only run feedback, so logging is always on.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = config::Config::load();
    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            tables,
            owner,
            output,
            concurrency,
        } => {
            commands::harvest::handle_harvest(
                HarvestOptions {
                    tables,
                    owner,
                    output,
                    concurrency,
                },
                &config,
            )
            .await?;
        }
        Commands::Repos { owner } => {
            commands::harvest::handle_repos(owner, &config).await?;
        }
    }

    Ok(())
}
