//! Deployment frequency: time-to-merge for pull requests landed on the
//! default branch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::github::{PullRequest, Repository};
use crate::sink::TableRow;

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentFrequencyRow {
    pub repository_id: u64,
    pub repository: String,
    pub pull_request_number: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: DateTime<Utc>,
    pub time_to_merge_days: f64,
}

impl TableRow for DeploymentFrequencyRow {
    const HEADERS: &'static [&'static str] = &[
        "Repository ID",
        "Repository",
        "Pull Request Number",
        "Title",
        "Created At",
        "Merged At",
        "Time to Merge (days)",
    ];
}

/// One row per merged pull request; closed-but-refused PRs have no merge
/// timestamp and are skipped.
pub fn merge_frequency_rows(repo: &Repository, pulls: &[PullRequest]) -> Vec<DeploymentFrequencyRow> {
    pulls
        .iter()
        .filter_map(|pr| {
            let merged_at = pr.merged_at?;
            let time_to_merge_days = pr.time_to_merge_days()?;
            Some(DeploymentFrequencyRow {
                repository_id: repo.id,
                repository: repo.name.clone(),
                pull_request_number: pr.number,
                title: pr.title.clone(),
                created_at: pr.created_at,
                merged_at,
                time_to_merge_days,
            })
        })
        .collect()
}
