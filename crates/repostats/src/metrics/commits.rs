//! Commit metrics: the per-commit listing and deployment speed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::github::{Commit, Repository};
use crate::sink::TableRow;

#[derive(Debug, Clone, Serialize)]
pub struct CommitRow {
    pub repository_id: u64,
    pub repository: String,
    pub commit_id: String,
    pub author: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

impl TableRow for CommitRow {
    const HEADERS: &'static [&'static str] = &[
        "Repository ID",
        "Repository",
        "Commit ID",
        "Author",
        "Message",
        "Date",
    ];
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSpeedRow {
    pub repository_id: u64,
    pub repository: String,
    pub deployment_speed_days: f64,
}

impl TableRow for DeploymentSpeedRow {
    const HEADERS: &'static [&'static str] =
        &["Repository ID", "Repository", "Deployment Speed (days)"];
}

pub fn commit_rows(repo: &Repository, commits: &[Commit]) -> Vec<CommitRow> {
    commits
        .iter()
        .map(|c| CommitRow {
            repository_id: repo.id,
            repository: repo.name.clone(),
            commit_id: c.sha.clone(),
            author: c.commit.author.name.clone(),
            message: c.commit.message.clone(),
            date: c.commit.author.date,
        })
        .collect()
}

/// Average inter-commit interval in days.
///
/// Commits are sorted by author timestamp ascending; only non-negative
/// consecutive deltas contribute. Undefined for fewer than two commits or
/// when the total elapsed time is zero.
pub fn deployment_speed_days(commits: &[Commit]) -> Option<f64> {
    if commits.len() < 2 {
        return None;
    }

    let mut dates: Vec<DateTime<Utc>> = commits.iter().map(|c| c.commit.author.date).collect();
    dates.sort();

    let total_secs: i64 = dates
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .filter(|&d| d >= 0)
        .sum();

    if total_secs == 0 {
        return None;
    }

    Some(total_secs as f64 / (commits.len() - 1) as f64 / 86_400.0)
}

pub fn deployment_speed_row(repo: &Repository, commits: &[Commit]) -> Option<DeploymentSpeedRow> {
    deployment_speed_days(commits).map(|days| DeploymentSpeedRow {
        repository_id: repo.id,
        repository: repo.name.clone(),
        deployment_speed_days: days,
    })
}
