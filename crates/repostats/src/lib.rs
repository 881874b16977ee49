//! Repostats - GitHub repository metrics harvester.
//!
//! This library pulls tags, pull requests, commits and branches for every
//! repository of one account through the GitHub REST API and reduces them to
//! flat metric tables, ready to be written out as CSV.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use repostats::{CsvSink, GitHubClient, Harvester, ReqwestTransport};
//!
//! let transport = Arc::new(ReqwestTransport::with_timeout(Duration::from_secs(30))?);
//! let client = GitHubClient::new(transport, token, "acme");
//! let harvester = Harvester::new(client);
//!
//! let repos = harvester.repositories().await?;
//! let rows = harvester.latest_tags(&repos).await;
//! CsvSink::new("latest_tags.csv").write(&rows)?;
//! ```

pub mod fetch;
pub mod github;
pub mod harvest;
pub mod http;
pub mod metrics;
pub mod pagination;
pub mod sink;

pub use fetch::{FetchConfig, FetchError, FetchOutcome, Fetcher};
pub use github::{GitHubClient, PullState, Repository, DEFAULT_BASE_URL};
pub use harvest::{HarvestError, Harvester};
pub use http::{HttpError, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use pagination::{CursorStyle, Paginator, MAX_PAGE_SIZE};
pub use sink::{CsvSink, SinkError, TableRow};
