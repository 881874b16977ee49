//! GitHub API client for one configured account.
//!
//! Every method is a thin composition of the shared [`Fetcher`] and
//! [`Paginator`]; the client only knows which route to hit and which cursor
//! style the endpoint uses.

use std::sync::Arc;

use crate::fetch::{FetchConfig, FetchError, Fetcher};
use crate::http::HttpTransport;
use crate::pagination::{CursorStyle, Paginator};

use super::types::{Branch, Commit, IssueComment, PullRequest, Repository, Tag};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// The `state` filter accepted by the list-pull-requests endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
    Open,
    Closed,
    All,
}

impl PullState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PullState::Open => "open",
            PullState::Closed => "closed",
            PullState::All => "all",
        }
    }
}

/// Authenticated client scoped to one account (the harvest target).
#[derive(Clone)]
pub struct GitHubClient {
    fetcher: Fetcher,
    base_url: String,
    owner: String,
}

impl GitHubClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        token: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self::with_config(transport, token, owner, FetchConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn HttpTransport>,
        token: impl Into<String>,
        owner: impl Into<String>,
        config: FetchConfig,
    ) -> Self {
        Self {
            fetcher: Fetcher::with_config(transport, token, config),
            base_url: DEFAULT_BASE_URL.to_string(),
            owner: owner.into(),
        }
    }

    /// Point the client at a different API root. Used by tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn repo_route(&self, repo: &str, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.base_url, self.owner, repo, suffix)
    }

    /// List every repository of the configured account, in the platform's
    /// creation order.
    pub async fn list_repos(&self) -> Result<Vec<Repository>, FetchError> {
        let url = format!("{}/users/{}/repos", self.base_url, self.owner);
        Paginator::new(&self.fetcher, CursorStyle::PageNumber)
            .collect(&url, &[("sort", "created")])
            .await
    }

    pub async fn list_tags(&self, repo: &str) -> Result<Vec<Tag>, FetchError> {
        Paginator::new(&self.fetcher, CursorStyle::PageNumber)
            .collect(&self.repo_route(repo, "/tags"), &[])
            .await
    }

    pub async fn list_commits(&self, repo: &str) -> Result<Vec<Commit>, FetchError> {
        Paginator::new(&self.fetcher, CursorStyle::LinkHeader)
            .collect(&self.repo_route(repo, "/commits"), &[])
            .await
    }

    /// List pull requests filtered by state, optionally restricted to those
    /// targeting `base`.
    pub async fn list_pulls(
        &self,
        repo: &str,
        state: PullState,
        base: Option<&str>,
    ) -> Result<Vec<PullRequest>, FetchError> {
        let mut query = vec![("state", state.as_str())];
        if let Some(base) = base {
            query.push(("base", base));
        }
        Paginator::new(&self.fetcher, CursorStyle::LinkHeader)
            .collect(&self.repo_route(repo, "/pulls"), &query)
            .await
    }

    /// Issue comments on a pull request (comment presence classification).
    pub async fn list_pull_comments(
        &self,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, FetchError> {
        let route = self.repo_route(repo, &format!("/issues/{number}/comments"));
        Paginator::new(&self.fetcher, CursorStyle::PageNumber)
            .collect(&route, &[])
            .await
    }

    /// Fetch a single branch. `None` when the branch does not exist (or the
    /// repository is gone).
    pub async fn get_branch(&self, repo: &str, branch: &str) -> Result<Option<Branch>, FetchError> {
        let url = self.repo_route(repo, &format!("/branches/{branch}"));
        Ok(self.fetcher.get_json::<Branch>(&url).await?.into_data())
    }

    pub async fn count_commits(&self, repo: &str) -> Result<usize, FetchError> {
        Paginator::new(&self.fetcher, CursorStyle::PageNumber)
            .count(&self.repo_route(repo, "/commits"), &[])
            .await
    }

    pub async fn count_tags(&self, repo: &str) -> Result<usize, FetchError> {
        Paginator::new(&self.fetcher, CursorStyle::PageNumber)
            .count(&self.repo_route(repo, "/tags"), &[])
            .await
    }

    pub async fn count_branches(&self, repo: &str) -> Result<usize, FetchError> {
        Paginator::new(&self.fetcher, CursorStyle::PageNumber)
            .count(&self.repo_route(repo, "/branches"), &[])
            .await
    }
}
