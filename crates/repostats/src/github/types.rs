//! Wire types for the GitHub REST API payloads the harvesters consume.
//!
//! Only the fields the metrics need are modeled; everything else in the
//! payload is ignored. Optional fields are tolerant of `null`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A repository as returned by the list-repositories endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// The account a pull request was opened by.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

/// A pull request, from either the open or closed listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub user: Option<Account>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// A closed pull request counts as merged when a merge timestamp exists;
    /// closed without one means it was refused.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    /// Elapsed time between creation and merge, in fractional days.
    /// Only defined when a merge timestamp exists.
    #[must_use]
    pub fn time_to_merge_days(&self) -> Option<f64> {
        let merged_at = self.merged_at?;
        Some((merged_at - self.created_at).num_seconds() as f64 / 86_400.0)
    }
}

/// A commit from the list-commits endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub author: CommitAuthor,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

/// A tag. The platform's default ordering puts the latest tag first.
#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A branch, from list-branches or get-branch.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// An issue comment on a pull request. Only its presence matters.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_tolerates_null_timestamps_and_user() {
        let json = r#"{
            "number": 7,
            "title": "Add parser",
            "state": "open",
            "user": null,
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": null,
            "closed_at": null,
            "merged_at": null
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert!(!pr.is_merged());
        assert!(pr.time_to_merge_days().is_none());
        assert!(pr.user.is_none());
    }

    #[test]
    fn time_to_merge_is_fractional_days() {
        let json = r#"{
            "number": 1,
            "title": "Fix",
            "state": "closed",
            "user": {"login": "alice"},
            "created_at": "2024-03-01T00:00:00Z",
            "closed_at": "2024-03-02T12:00:00Z",
            "merged_at": "2024-03-02T12:00:00Z"
        }"#;
        let pr: PullRequest = serde_json::from_str(json).unwrap();
        assert!(pr.is_merged());
        let days = pr.time_to_merge_days().unwrap();
        assert!((days - 1.5).abs() < 1e-9);
    }

    #[test]
    fn commit_decodes_nested_author() {
        let json = r#"{
            "sha": "abc123",
            "commit": {
                "author": {"name": "Bob", "date": "2024-01-15T08:30:00Z"},
                "message": "initial commit"
            }
        }"#;
        let commit: Commit = serde_json::from_str(json).unwrap();
        assert_eq!(commit.sha, "abc123");
        assert_eq!(commit.commit.author.name, "Bob");
    }

    #[test]
    fn repository_tolerates_missing_optional_fields() {
        let json = r#"{"id": 42, "name": "widget"}"#;
        let repo: Repository = serde_json::from_str(json).unwrap();
        assert_eq!(repo.id, 42);
        assert!(repo.description.is_none());
        assert!(repo.default_branch.is_none());
    }
}
