//! Rate-limited, fault-tolerant GET fetcher.
//!
//! Every harvester goes through this one component instead of carrying its
//! own retry loop. It distinguishes three failure classes:
//!
//! - 403 with an `X-RateLimit-Reset` header is not a failure: the fetcher
//!   sleeps until the stated reset time (plus a small margin) and retries the
//!   same request without consuming the retry budget.
//! - Transport failures are retried a fixed number of times with a fixed
//!   inter-attempt delay; exhaustion surfaces as [`FetchError::Transport`].
//! - Any other non-2xx status is terminal for that request: logged and
//!   returned as [`FetchOutcome::Missing`] so callers can degrade the
//!   affected row instead of aborting the run.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Safety margin added on top of the platform's stated rate-limit reset time.
const RATE_LIMIT_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure after the retry budget was exhausted.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body was not the JSON shape the caller asked for.
    #[error("decode error for {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Transport failures are transient and worth retrying; decode failures
    /// are not (the payload will not change on a retry).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Result of a single fetch.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// 2xx response with a decoded payload, plus the `rel="next"` URL from
    /// the `Link` header when the endpoint paginates by cursor.
    Fetched { data: T, next_url: Option<String> },
    /// Terminal non-2xx status. The caller tolerates the absent data.
    Missing { status: u16 },
}

impl<T> FetchOutcome<T> {
    /// Unwrap the payload, mapping a missing result to `None`.
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Fetched { data, .. } => Some(data),
            Self::Missing { .. } => None,
        }
    }
}

/// Retry and pacing knobs for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Retries after the initial attempt for transient transport failures.
    pub max_retries: usize,
    /// Fixed delay between transient-failure attempts.
    pub retry_delay: Duration,
    /// Proactive request pacing in requests per second. `None` disables the
    /// pacer and leaves only the reactive 403 handling.
    pub requests_per_second: Option<u32>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            requests_per_second: Some(10),
        }
    }
}

/// Authenticated GET fetcher shared by every harvester.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    token: String,
    config: FetchConfig,
    pacer: Option<Arc<GovernorRateLimiter>>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, token: impl Into<String>) -> Self {
        Self::with_config(transport, token, FetchConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn HttpTransport>,
        token: impl Into<String>,
        config: FetchConfig,
    ) -> Self {
        let pacer = config.requests_per_second.map(|rps| {
            let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
            Arc::new(RateLimiter::direct(Quota::per_second(rps)))
        });
        Self {
            transport,
            token: token.into(),
            config,
            pacer,
        }
    }

    /// GET `url` and decode the JSON payload.
    ///
    /// Rate-limit suspensions happen transparently inside this call. A
    /// transient transport failure is retried `max_retries` times; any other
    /// non-2xx status becomes [`FetchOutcome::Missing`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<FetchOutcome<T>, FetchError> {
        let backoff = ConstantBuilder::default()
            .with_delay(self.config.retry_delay)
            .with_max_times(self.config.max_retries);

        let op = || self.attempt::<T>(url);

        op.retry(backoff)
            .when(FetchError::is_transient)
            .notify(|err, dur| {
                tracing::warn!("request failed, retrying in {:?}: {}", dur, err);
            })
            .await
    }

    /// One attempt: sends the request, absorbing rate-limit suspensions.
    async fn attempt<T: DeserializeOwned>(&self, url: &str) -> Result<FetchOutcome<T>, FetchError> {
        let response = loop {
            if let Some(ref pacer) = self.pacer {
                pacer.until_ready().await;
            }

            let request = HttpRequest::get(url)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "repostats")
                .header("Authorization", format!("token {}", self.token));

            let response = self.transport.send(request).await.map_err(|e| match e {
                HttpError::Transport(message) => FetchError::Transport {
                    url: url.to_string(),
                    message,
                },
                HttpError::NoMockResponse { url } => FetchError::Transport {
                    url,
                    message: "no response".to_string(),
                },
            })?;

            if let Some(wait) = rate_limit_wait(&response) {
                tracing::info!(
                    url,
                    wait_secs = wait.as_secs(),
                    "rate limit exceeded, sleeping until reset"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            break response;
        };

        if !response.is_success() {
            tracing::warn!(url, status = response.status, "request failed, skipping");
            return Ok(FetchOutcome::Missing {
                status: response.status,
            });
        }

        let next_url = response.header("link").and_then(next_link);
        let data: T = serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FetchOutcome::Fetched { data, next_url })
    }
}

/// Rate-limit suspension duration, if the response signals one.
///
/// GitHub signals quota exhaustion with a 403 paired with an
/// `X-RateLimit-Reset` header holding the reset time in epoch seconds.
fn rate_limit_wait(response: &HttpResponse) -> Option<Duration> {
    if response.status != 403 {
        return None;
    }
    let reset: i64 = response.header("x-ratelimit-reset")?.parse().ok()?;
    let now = chrono::Utc::now().timestamp();
    let wait = Duration::from_secs(reset.saturating_sub(now).max(0) as u64);
    Some(wait + RATE_LIMIT_MARGIN)
}

/// Extract the `rel="next"` URL from a `Link` header.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/user/repos?page=2>; rel="next", <...&page=5>; rel="last"`
fn next_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let part = part.trim();

        let mut url = None;
        let mut is_next = false;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel) = segment.strip_prefix("rel=") {
                is_next = rel.trim_matches('"') == "next";
            }
        }

        if is_next {
            return url.map(str::to_string);
        }
    }
    None
}
