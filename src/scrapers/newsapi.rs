//! NewsAPI article source.
//!
//! Lists candidate articles from [NewsAPI](https://newsapi.org) in one of two
//! modes:
//!
//! - **Top headlines** (`/top-headlines`): current headlines matching the topic
//! - **Search** (`/everything`): everything published within a recency
//!   window, ordered by the requested sort order
//!
//! The provider always answers with a JSON envelope carrying a `status`
//! field. Anything other than `"ok"` is surfaced as a [`ProviderError`];
//! an `"ok"` envelope with no articles is an empty result, not an error.

use crate::error::ProviderError;
use crate::models::{ArticleQuery, ArticleRef, SearchMode};
use crate::utils::truncate_for_log;
use chrono::{Days, NaiveDate, Utc};
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Title NewsAPI substitutes for articles pulled by the publisher.
const REMOVED_TITLE: &str = "[Removed]";

/// Anything that can list candidate articles for a query.
pub trait ArticleSource {
    /// Return articles in provider order, at most `query.page_size` of them.
    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<Vec<ArticleRef>, ProviderError>;
}

/// HTTP client for the NewsAPI v2 endpoints.
pub struct NewsApiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NewsApiClient {
    /// Build a client against `base_url` (normally `https://newsapi.org/v2`).
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl ArticleSource for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(topic = %query.topic, mode = ?query.mode))]
    async fn fetch_articles(&self, query: &ArticleQuery) -> Result<Vec<ArticleRef>, ProviderError> {
        let (endpoint, params) = request_parts(query, Utc::now().date_naive());
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?params, "Querying news provider");

        let resp = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&params)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        let envelope = match serde_json::from_str::<NewsApiResponse>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ProviderError::Status {
                    status: status.as_u16(),
                    body: truncate_for_log(&body, 300),
                });
            }
            Err(e) => return Err(ProviderError::Decode(e)),
        };

        let articles = envelope.into_articles(query.page_size as usize)?;
        info!(count = articles.len(), "Fetched article list");
        Ok(articles)
    }
}

/// Endpoint and query string for a request issued on `today`.
fn request_parts(
    query: &ArticleQuery,
    today: NaiveDate,
) -> (&'static str, Vec<(&'static str, String)>) {
    let mut params = vec![
        ("q", query.topic.clone()),
        ("language", query.language.clone()),
        ("pageSize", query.page_size.to_string()),
    ];
    match query.mode {
        SearchMode::TopHeadlines => ("top-headlines", params),
        SearchMode::Search {
            recency_days,
            sort_by,
        } => {
            let from = today
                .checked_sub_days(Days::new(u64::from(recency_days)))
                .unwrap_or(NaiveDate::MIN);
            params.push(("from", from.format("%Y-%m-%d").to_string()));
            params.push(("sortBy", sort_by.to_string()));
            ("everything", params)
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    url: Option<String>,
}

impl NewsApiResponse {
    fn into_articles(self, limit: usize) -> Result<Vec<ArticleRef>, ProviderError> {
        if self.status != "ok" {
            return Err(ProviderError::Rejected {
                code: self.code.unwrap_or_else(|| self.status.clone()),
                message: self
                    .message
                    .unwrap_or_else(|| "no message from provider".to_string()),
            });
        }

        let received = self.articles.len();
        let articles: Vec<ArticleRef> = self
            .articles
            .into_iter()
            .filter_map(RawArticle::into_ref)
            .unique_by(|a| a.url.clone())
            .take(limit)
            .collect();

        if articles.len() < received {
            debug!(
                received,
                kept = articles.len(),
                "Dropped unusable or duplicate article records"
            );
        }
        Ok(articles)
    }
}

impl RawArticle {
    fn into_ref(self) -> Option<ArticleRef> {
        let title = self.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
        let url = self.url?;
        if title == REMOVED_TITLE {
            return None;
        }
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                Some(ArticleRef { title, url })
            }
            _ => {
                warn!(%url, "Skipping article with unusable URL");
                None
            }
        }
    }
}
