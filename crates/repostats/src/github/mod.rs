//! GitHub REST API integration.

mod client;
mod types;

pub use client::{GitHubClient, PullState, DEFAULT_BASE_URL};
pub use types::{Account, Branch, Commit, CommitAuthor, CommitDetail, IssueComment, PullRequest, Repository, Tag};
