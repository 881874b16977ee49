//! Generic pagination over GitHub list endpoints.
//!
//! Two cursor styles appear in the API: endpoints advanced by incrementing an
//! explicit `page` query parameter, and endpoints advanced by following the
//! `Link` header's `rel="next"` URL. Both terminate the same way: an empty
//! page (or a missing next relation) ends the walk. An empty first page
//! yields nothing and is not an error.

use serde::de::DeserializeOwned;

use crate::fetch::{FetchError, FetchOutcome, Fetcher};

/// GitHub's maximum `per_page` value.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How a list endpoint advances through result pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    /// Increment an explicit `page` query parameter until a page is empty.
    PageNumber,
    /// Follow the `Link` header's `rel="next"` URL until it is absent.
    LinkHeader,
}

/// Walks every page of a list endpoint.
///
/// Not restartable: each call re-executes all requests. Never assumes a
/// maximum page count and never deduplicates.
pub struct Paginator<'a> {
    fetcher: &'a Fetcher,
    style: CursorStyle,
    per_page: u32,
}

impl<'a> Paginator<'a> {
    pub fn new(fetcher: &'a Fetcher, style: CursorStyle) -> Self {
        Self {
            fetcher,
            style,
            per_page: MAX_PAGE_SIZE,
        }
    }

    /// Override the page size. Clamped to the platform maximum of 100.
    #[must_use]
    pub fn with_page_size(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Collect every item across all pages, in page order.
    pub async fn collect<T: DeserializeOwned>(
        &self,
        base_url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        self.for_each_page(base_url, query, |page: Vec<T>| items.extend(page))
            .await?;
        Ok(items)
    }

    /// Exhaust all pages, summing item counts without retaining items.
    pub async fn count(&self, base_url: &str, query: &[(&str, &str)]) -> Result<usize, FetchError> {
        let mut total = 0usize;
        self.for_each_page(base_url, query, |page: Vec<serde_json::Value>| {
            total += page.len();
        })
        .await?;
        Ok(total)
    }

    async fn for_each_page<T: DeserializeOwned>(
        &self,
        base_url: &str,
        query: &[(&str, &str)],
        mut on_page: impl FnMut(Vec<T>),
    ) -> Result<(), FetchError> {
        let mut page = 1u32;
        let mut url = self.page_url(base_url, query, page);

        loop {
            match self.fetcher.get_json::<Vec<T>>(&url).await? {
                FetchOutcome::Missing { status } => {
                    // Terminal non-2xx mid-walk: stop and keep what we have.
                    tracing::warn!(url, status, "pagination stopped early");
                    return Ok(());
                }
                FetchOutcome::Fetched { data, next_url } => {
                    if data.is_empty() {
                        return Ok(());
                    }
                    on_page(data);

                    match self.style {
                        CursorStyle::LinkHeader => match next_url {
                            Some(next) => url = next,
                            None => return Ok(()),
                        },
                        CursorStyle::PageNumber => {
                            page += 1;
                            url = self.page_url(base_url, query, page);
                        }
                    }
                }
            }
        }
    }

    fn page_url(&self, base_url: &str, query: &[(&str, &str)], page: u32) -> String {
        let sep = if base_url.contains('?') { '&' } else { '?' };
        let mut url = format!("{base_url}{sep}per_page={}", self.per_page);
        for (key, value) in query {
            url.push_str(&format!("&{key}={value}"));
        }
        if self.style == CursorStyle::PageNumber {
            url.push_str(&format!("&page={page}"));
        }
        url
    }
}
