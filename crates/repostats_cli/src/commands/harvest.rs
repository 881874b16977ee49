//! The harvest command: fetch metrics and write the CSV tables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use repostats::{CsvSink, GitHubClient, Harvester, ReqwestTransport};
use tracing::info;

use crate::config::Config;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Table {
    /// Newest tag per repository (dim_latest_tags.csv)
    LatestTags,
    /// Every tag per repository (dim_tags.csv)
    Tags,
    /// Per-pull-request listing (dim_pull_requests_stats.csv)
    PullRequests,
    /// Status breakdown per repository (dim_pull_requests_status.csv)
    PullRequestStatus,
    /// Every commit per repository (dim_commits.csv)
    Commits,
    /// Time-to-merge of merged pull requests (dim_deployment_frequency.csv)
    DeploymentFrequency,
    /// Average inter-commit interval (dim_deployment_speed.csv)
    DeploymentSpeed,
    /// Commit/tag/branch counts (fact_repositories.csv)
    RepositoryFacts,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::LatestTags,
        Table::Tags,
        Table::PullRequests,
        Table::PullRequestStatus,
        Table::Commits,
        Table::DeploymentFrequency,
        Table::DeploymentSpeed,
        Table::RepositoryFacts,
    ];

    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Table::LatestTags => "dim_latest_tags.csv",
            Table::Tags => "dim_tags.csv",
            Table::PullRequests => "dim_pull_requests_stats.csv",
            Table::PullRequestStatus => "dim_pull_requests_status.csv",
            Table::Commits => "dim_commits.csv",
            Table::DeploymentFrequency => "dim_deployment_frequency.csv",
            Table::DeploymentSpeed => "dim_deployment_speed.csv",
            Table::RepositoryFacts => "fact_repositories.csv",
        }
    }
}

/// Options resolved from CLI flags and config.
pub struct HarvestOptions {
    pub tables: Vec<Table>,
    pub owner: Option<String>,
    pub output: Option<PathBuf>,
    pub concurrency: Option<usize>,
}

pub async fn handle_harvest(
    opts: HarvestOptions,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = opts
        .owner
        .or_else(|| config.github_owner())
        .ok_or("no account configured; pass --owner or set REPOSTATS_GITHUB_OWNER")?;
    let token = config
        .github_token()
        .ok_or("no GitHub token configured; set REPOSTATS_GITHUB_TOKEN")?;

    let output_dir = opts.output.unwrap_or_else(|| config.output_dir());
    std::fs::create_dir_all(&output_dir)?;

    let harvester = build_harvester(&owner, &token, opts.concurrency, config)?;

    let tables = if opts.tables.is_empty() {
        Table::ALL.to_vec()
    } else {
        opts.tables
    };

    info!(%owner, tables = tables.len(), "starting harvest");
    let repos = harvester.repositories().await?;
    info!(count = repos.len(), "listed repositories");

    for table in tables {
        write_table(&harvester, &repos, table, &output_dir).await?;
    }

    Ok(())
}

pub async fn handle_repos(
    owner: Option<String>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let owner = owner
        .or_else(|| config.github_owner())
        .ok_or("no account configured; pass --owner or set REPOSTATS_GITHUB_OWNER")?;
    let token = config
        .github_token()
        .ok_or("no GitHub token configured; set REPOSTATS_GITHUB_TOKEN")?;

    let harvester = build_harvester(&owner, &token, None, config)?;
    for repo in harvester.repositories().await? {
        println!("{}\t{}", repo.id, repo.name);
    }
    Ok(())
}

fn build_harvester(
    owner: &str,
    token: &str,
    concurrency: Option<usize>,
    config: &Config,
) -> Result<Harvester, Box<dyn std::error::Error>> {
    let transport = Arc::new(ReqwestTransport::with_timeout(HTTP_TIMEOUT)?);
    let client = GitHubClient::with_config(transport, token, owner, config.fetch_config());
    Ok(Harvester::new(client)
        .with_concurrency(concurrency.unwrap_or(config.harvest.concurrency)))
}

async fn write_table(
    harvester: &Harvester,
    repos: &[repostats::Repository],
    table: Table,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let sink = CsvSink::new(output_dir.join(table.file_name()));

    match table {
        Table::LatestTags => sink.write(&harvester.latest_tags(repos).await)?,
        Table::Tags => sink.write(&harvester.tags(repos).await)?,
        Table::PullRequests => sink.write(&harvester.pull_requests(repos).await)?,
        Table::PullRequestStatus => sink.write(&harvester.pull_request_status(repos).await)?,
        Table::Commits => sink.write(&harvester.commits(repos).await)?,
        Table::DeploymentFrequency => sink.write(&harvester.deployment_frequency(repos).await)?,
        Table::DeploymentSpeed => sink.write(&harvester.deployment_speed(repos).await)?,
        Table::RepositoryFacts => sink.write(&harvester.repository_facts(repos).await)?,
    }

    info!(table = table.file_name(), "wrote table");
    Ok(())
}
