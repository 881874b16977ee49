//! Harvest orchestration.
//!
//! One [`Harvester`] method per output table. Each method fans out one task
//! per repository, bounded by a semaphore, and awaits the tasks in spawn
//! order so rows always come out in the account's repository order. A repo
//! whose fetches fail is logged and skipped; only the initial repository
//! listing is fatal.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::fetch::FetchError;
use crate::github::{GitHubClient, PullState, Repository};
use crate::metrics::commits::{commit_rows, deployment_speed_row, CommitRow, DeploymentSpeedRow};
use crate::metrics::deploy::{merge_frequency_rows, DeploymentFrequencyRow};
use crate::metrics::pulls::{
    pull_request_rows, status_counts, status_row, CommentTally, PullRequestRow,
    PullRequestStatusRow,
};
use crate::metrics::summary::{fact_row, RepositoryFactRow};
use crate::metrics::tags::{latest_tag_row, tag_rows, LatestTagRow, TagRow};
use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// The repository listing failed; without it no table can be built.
    #[error("failed to list repositories for {owner}")]
    ListRepos {
        owner: String,
        #[source]
        source: FetchError,
    },
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Fans repository work out over a bounded set of tasks.
#[derive(Clone)]
pub struct Harvester {
    client: Arc<GitHubClient>,
    concurrency: usize,
}

impl Harvester {
    pub const DEFAULT_CONCURRENCY: usize = 4;

    pub fn new(client: GitHubClient) -> Self {
        Self {
            client: Arc::new(client),
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// List the account's repositories. Every table method takes this list,
    /// so one harvest run lists the account exactly once.
    pub async fn repositories(&self) -> Result<Vec<Repository>, HarvestError> {
        self.client
            .list_repos()
            .await
            .map_err(|source| HarvestError::ListRepos {
                owner: self.client.owner().to_string(),
                source,
            })
    }

    /// The newest tag of each repository.
    pub async fn latest_tags(&self, repos: &[Repository]) -> Vec<LatestTagRow> {
        self.fan_out(repos, |client, repo| async move {
            let tags = client.list_tags(&repo.name).await?;
            Ok(vec![latest_tag_row(&repo, &tags)])
        })
        .await
    }

    /// Every tag of every repository.
    pub async fn tags(&self, repos: &[Repository]) -> Vec<TagRow> {
        self.fan_out(repos, |client, repo| async move {
            let tags = client.list_tags(&repo.name).await?;
            Ok(tag_rows(&repo, &tags))
        })
        .await
    }

    /// Every pull request of every repository, any state.
    pub async fn pull_requests(&self, repos: &[Repository]) -> Vec<PullRequestRow> {
        self.fan_out(repos, |client, repo| async move {
            let pulls = client.list_pulls(&repo.name, PullState::All, None).await?;
            Ok(pull_request_rows(&repo, &pulls))
        })
        .await
    }

    /// Per-repository status breakdown with comment-presence counts.
    ///
    /// Comment lookups run one pull request at a time inside the repo's
    /// task; a failed lookup drops that PR from both comment columns and
    /// nothing else.
    pub async fn pull_request_status(&self, repos: &[Repository]) -> Vec<PullRequestStatusRow> {
        self.fan_out(repos, |client, repo| async move {
            let open = client.list_pulls(&repo.name, PullState::Open, None).await?;
            let closed = client
                .list_pulls(&repo.name, PullState::Closed, None)
                .await?;
            let counts = status_counts(&open, &closed);

            let mut tally = CommentTally::default();
            for pr in open.iter().chain(closed.iter()) {
                match client.list_pull_comments(&repo.name, pr.number).await {
                    Ok(comments) => tally.record(comments.len()),
                    Err(error) => warn!(
                        repo = %repo.name,
                        number = pr.number,
                        %error,
                        "comment lookup failed, excluding pull request from comment columns"
                    ),
                }
            }

            Ok(vec![status_row(&repo, counts, tally)])
        })
        .await
    }

    /// Every commit of every repository.
    pub async fn commits(&self, repos: &[Repository]) -> Vec<CommitRow> {
        self.fan_out(repos, |client, repo| async move {
            let commits = client.list_commits(&repo.name).await?;
            Ok(commit_rows(&repo, &commits))
        })
        .await
    }

    /// Time-to-merge of every pull request merged into the default branch.
    ///
    /// Repositories without a default branch, or whose default branch no
    /// longer exists, contribute no rows.
    pub async fn deployment_frequency(&self, repos: &[Repository]) -> Vec<DeploymentFrequencyRow> {
        self.fan_out(repos, |client, repo| async move {
            let Some(branch) = repo.default_branch.clone() else {
                debug!(repo = %repo.name, "no default branch, skipping");
                return Ok(Vec::new());
            };
            if client.get_branch(&repo.name, &branch).await?.is_none() {
                warn!(repo = %repo.name, %branch, "default branch not found, skipping");
                return Ok(Vec::new());
            }
            let closed = client
                .list_pulls(&repo.name, PullState::Closed, Some(&branch))
                .await?;
            Ok(merge_frequency_rows(&repo, &closed))
        })
        .await
    }

    /// Average inter-commit interval per repository.
    pub async fn deployment_speed(&self, repos: &[Repository]) -> Vec<DeploymentSpeedRow> {
        self.fan_out(repos, |client, repo| async move {
            let commits = client.list_commits(&repo.name).await?;
            Ok(deployment_speed_row(&repo, &commits).into_iter().collect())
        })
        .await
    }

    /// Commit, tag and branch counts per repository.
    pub async fn repository_facts(&self, repos: &[Repository]) -> Vec<RepositoryFactRow> {
        self.fan_out(repos, |client, repo| async move {
            let (commits, tags, branches) = tokio::join!(
                client.count_commits(&repo.name),
                client.count_tags(&repo.name),
                client.count_branches(&repo.name),
            );
            Ok(vec![fact_row(&repo, commits?, tags?, branches?)])
        })
        .await
    }

    /// Spawn one task per repository, bounded by `concurrency`, and collect
    /// row batches in spawn order. Failed repositories are logged and
    /// dropped; their rows are simply absent.
    async fn fan_out<T, F, Fut>(&self, repos: &[Repository], work: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(Arc<GitHubClient>, Repository) -> Fut,
        Fut: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
    {
        if repos.is_empty() {
            return Vec::new();
        }

        let concurrency = self.concurrency.min(repos.len());
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let mut handles = Vec::with_capacity(repos.len());
        for repo in repos {
            let semaphore = Arc::clone(&semaphore);
            let name = repo.name.clone();
            let fut = work(Arc::clone(&self.client), repo.clone());

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            name,
                            Err(FetchError::Transport {
                                url: String::new(),
                                message: "semaphore closed unexpectedly".to_string(),
                            }),
                        );
                    }
                };
                (name, fut.await)
            });
            handles.push(handle);
        }

        let mut rows = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(mut batch))) => rows.append(&mut batch),
                Ok((name, Err(error))) => {
                    warn!(repo = %name, %error, "skipping repository");
                }
                Err(error) => warn!(%error, "harvest task failed"),
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use crate::http::mock::MockTransport;
    use std::time::Duration;

    fn harvester(transport: MockTransport) -> Harvester {
        let client = GitHubClient::with_config(
            Arc::new(transport),
            "t",
            "acme",
            FetchConfig {
                max_retries: 0,
                retry_delay: Duration::from_millis(1),
                requests_per_second: None,
            },
        )
        .with_base_url("https://x");
        Harvester::new(client).with_concurrency(2)
    }

    fn repo(id: u64, name: &str) -> Repository {
        serde_json::from_str(&format!(
            r#"{{"id": {id}, "name": "{name}", "default_branch": "main"}}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn failed_repository_listing_is_fatal() {
        let transport = MockTransport::new();
        transport.push_transport_error(
            "https://x/users/acme/repos?per_page=100&sort=created&page=1",
            "connection reset",
        );

        let result = harvester(transport).repositories().await;
        assert!(matches!(result, Err(HarvestError::ListRepos { .. })));
    }

    #[tokio::test]
    async fn failed_repo_is_skipped_and_order_is_preserved() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://x/repos/acme/alpha/tags?per_page=100&page=1",
            r#"[{"name": "v2"}, {"name": "v1"}]"#,
        );
        transport.push_json("https://x/repos/acme/alpha/tags?per_page=100&page=2", "[]");
        transport
            .push_transport_error("https://x/repos/acme/broken/tags?per_page=100&page=1", "boom");
        transport.push_json(
            "https://x/repos/acme/zeta/tags?per_page=100&page=1",
            r#"[{"name": "r1"}]"#,
        );
        transport.push_json("https://x/repos/acme/zeta/tags?per_page=100&page=2", "[]");

        let repos = vec![repo(1, "alpha"), repo(2, "broken"), repo(3, "zeta")];
        let rows = harvester(transport).latest_tags(&repos).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].repository_name, "alpha");
        assert_eq!(rows[0].latest_tag, "v2");
        assert_eq!(rows[1].repository_name, "zeta");
        assert_eq!(rows[1].latest_tag, "r1");
    }

    #[tokio::test]
    async fn status_excludes_pull_requests_with_failed_comment_lookups() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://x/repos/acme/alpha/pulls?per_page=100&state=open",
            r#"[{"number": 1, "title": "a", "state": "open",
                 "created_at": "2024-01-01T00:00:00Z"}]"#,
        );
        transport.push_json(
            "https://x/repos/acme/alpha/pulls?per_page=100&state=closed",
            r#"[{"number": 2, "title": "b", "state": "closed",
                 "created_at": "2024-01-01T00:00:00Z",
                 "merged_at": "2024-01-02T00:00:00Z"}]"#,
        );
        transport.push_json(
            "https://x/repos/acme/alpha/issues/1/comments?per_page=100&page=1",
            r#"[{"id": 10}]"#,
        );
        transport.push_json(
            "https://x/repos/acme/alpha/issues/1/comments?per_page=100&page=2",
            "[]",
        );
        transport.push_transport_error(
            "https://x/repos/acme/alpha/issues/2/comments?per_page=100&page=1",
            "boom",
        );

        let rows = harvester(transport)
            .pull_request_status(&[repo(1, "alpha")])
            .await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].open, 1);
        assert_eq!(rows[0].closed, 1);
        assert_eq!(rows[0].merged, 1);
        assert_eq!(rows[0].refused, 0);
        assert_eq!(rows[0].total, 2);
        // PR 2's lookup failed, so only PR 1 appears in the comment columns.
        assert_eq!(rows[0].with_comments, 1);
        assert_eq!(rows[0].without_comments, 0);
    }

    #[tokio::test]
    async fn deployment_frequency_skips_missing_default_branch() {
        let transport = MockTransport::new();
        transport.push_response(
            "https://x/repos/acme/alpha/branches/main",
            crate::http::HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let mut no_branch = repo(2, "beta");
        no_branch.default_branch = None;

        let rows = harvester(transport)
            .deployment_frequency(&[repo(1, "alpha"), no_branch])
            .await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn deployment_frequency_reports_merged_pulls_on_default_branch() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://x/repos/acme/alpha/branches/main",
            r#"{"name": "main"}"#,
        );
        transport.push_json(
            "https://x/repos/acme/alpha/pulls?per_page=100&state=closed&base=main",
            r#"[{"number": 1, "title": "ship", "state": "closed",
                 "created_at": "2024-01-01T00:00:00Z",
                 "merged_at": "2024-01-02T00:00:00Z"},
                {"number": 2, "title": "refused", "state": "closed",
                 "created_at": "2024-01-01T00:00:00Z"}]"#,
        );

        let rows = harvester(transport)
            .deployment_frequency(&[repo(1, "alpha")])
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pull_request_number, 1);
        assert!((rows[0].time_to_merge_days - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn repository_facts_join_three_counts() {
        let transport = MockTransport::new();
        transport.push_json(
            "https://x/repos/acme/alpha/commits?per_page=100&page=1",
            r#"[{"sha": "a", "commit": {"author": {"name": "n", "date": "2024-01-01T00:00:00Z"}, "message": "m"}}]"#,
        );
        transport.push_json("https://x/repos/acme/alpha/commits?per_page=100&page=2", "[]");
        transport.push_json(
            "https://x/repos/acme/alpha/tags?per_page=100&page=1",
            r#"[{"name": "v1"}, {"name": "v2"}]"#,
        );
        transport.push_json("https://x/repos/acme/alpha/tags?per_page=100&page=2", "[]");
        transport.push_json(
            "https://x/repos/acme/alpha/branches?per_page=100&page=1",
            r#"[{"name": "main"}, {"name": "dev"}, {"name": "wip"}]"#,
        );
        transport.push_json("https://x/repos/acme/alpha/branches?per_page=100&page=2", "[]");

        let rows = harvester(transport)
            .repository_facts(&[repo(1, "alpha")])
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].commits_count, 1);
        assert_eq!(rows[0].tags_count, 2);
        assert_eq!(rows[0].branches_count, 3);
    }
}
