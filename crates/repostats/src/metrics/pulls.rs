//! Pull request metrics: the per-PR stats listing and the per-repository
//! status breakdown.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::github::{PullRequest, Repository};
use crate::sink::TableRow;

#[derive(Debug, Clone, Serialize)]
pub struct PullRequestRow {
    pub repository_id: u64,
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub state: String,
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl TableRow for PullRequestRow {
    const HEADERS: &'static [&'static str] = &[
        "Repository ID",
        "Repository",
        "Number",
        "Title",
        "State",
        "User",
        "Created At",
        "Updated At",
        "Closed At",
        "Merged At",
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestStatusRow {
    pub repository_id: u64,
    pub repository: String,
    pub open: usize,
    pub closed: usize,
    pub merged: usize,
    pub refused: usize,
    pub total: usize,
    pub with_comments: usize,
    pub without_comments: usize,
}

impl TableRow for PullRequestStatusRow {
    const HEADERS: &'static [&'static str] = &[
        "Repository ID",
        "Repository",
        "Open Pull Requests",
        "Closed Pull Requests",
        "Merged Pull Requests",
        "Refused Pull Requests",
        "Total Pull Requests",
        "PR with Comments",
        "PR without Comments",
    ];
}

/// One stats row per pull request.
pub fn pull_request_rows(repo: &Repository, pulls: &[PullRequest]) -> Vec<PullRequestRow> {
    pulls
        .iter()
        .map(|pr| PullRequestRow {
            repository_id: repo.id,
            repository: repo.name.clone(),
            number: pr.number,
            title: pr.title.clone(),
            state: pr.state.clone(),
            user: pr
                .user
                .as_ref()
                .map(|u| u.login.clone())
                .unwrap_or_default(),
            created_at: pr.created_at,
            updated_at: pr.updated_at,
            closed_at: pr.closed_at,
            merged_at: pr.merged_at,
        })
        .collect()
}

/// Open/closed/merged/refused/total breakdown.
///
/// Closed pull requests partition into merged (merge timestamp present) and
/// refused (absent); open count is the size of the open listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub open: usize,
    pub closed: usize,
    pub merged: usize,
    pub refused: usize,
    pub total: usize,
}

pub fn status_counts(open: &[PullRequest], closed: &[PullRequest]) -> StatusCounts {
    let merged = closed.iter().filter(|pr| pr.is_merged()).count();
    StatusCounts {
        open: open.len(),
        closed: closed.len(),
        merged,
        refused: closed.len() - merged,
        total: open.len() + closed.len(),
    }
}

/// Comment-presence classification across a repository's pull requests.
///
/// A pull request whose comment lookup failed is recorded in neither bucket,
/// so the two columns only ever count successfully inspected PRs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentTally {
    pub with_comments: usize,
    pub without_comments: usize,
}

impl CommentTally {
    pub fn record(&mut self, comment_count: usize) {
        if comment_count > 0 {
            self.with_comments += 1;
        } else {
            self.without_comments += 1;
        }
    }
}

pub fn status_row(
    repo: &Repository,
    counts: StatusCounts,
    comments: CommentTally,
) -> PullRequestStatusRow {
    PullRequestStatusRow {
        repository_id: repo.id,
        repository: repo.name.clone(),
        open: counts.open,
        closed: counts.closed,
        merged: counts.merged,
        refused: counts.refused,
        total: counts.total,
        with_comments: comments.with_comments,
        without_comments: comments.without_comments,
    }
}
