//! Runtime configuration resolved from the environment.
//!
//! All settings come from environment variables (optionally seeded from a
//! `.env` file by `main`). Credentials are required; everything else has a
//! default.
//!
//! # Required Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `NEWS_API_KEY` | NewsAPI key |
//! | `OPENAI_API_KEY` | Chat completion API key |
//! | `DIGEST_SENDER_EMAIL` | Sender address, also the SMTP username |
//! | `DIGEST_SENDER_PASSWORD` | SMTP password (app password for Gmail) |
//! | `DIGEST_RECIPIENT_EMAIL` | Recipient address |
//!
//! # Optional Variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NEWS_TOPIC` | `technology` |
//! | `NEWS_LANGUAGE` | `en` |
//! | `NEWS_PAGE_SIZE` | `10` (1 to 100) |
//! | `NEWS_MODE` | `headlines` (or `search`) |
//! | `NEWS_RECENCY_DAYS` | `7` (1 to 365) |
//! | `NEWS_SORT_BY` | `publishedAt` |
//! | `NEWS_API_BASE_URL` | `https://newsapi.org/v2` |
//! | `OPENAI_MODEL` | `gpt-4o-mini` |
//! | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
//! | `SMTP_HOST` | `smtp.gmail.com` |
//! | `DIGEST_DRY_RUN` | off |

use crate::error::ConfigError;
use crate::models::{ArticleQuery, SearchMode, SortOrder};
use std::fmt;
use tracing::warn;

pub const DEFAULT_TOPIC: &str = "technology";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_RECENCY_DAYS: u32 = 7;
pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// NewsAPI rejects page sizes above this.
const MAX_PAGE_SIZE: u32 = 100;

/// Widest search window, in days.
const MAX_RECENCY_DAYS: u32 = 365;

const REQUIRED: [&str; 5] = [
    "NEWS_API_KEY",
    "OPENAI_API_KEY",
    "DIGEST_SENDER_EMAIL",
    "DIGEST_SENDER_PASSWORD",
    "DIGEST_RECIPIENT_EMAIL",
];

/// Everything one run needs.
#[derive(Clone)]
pub struct Config {
    pub news_api_key: String,
    pub news_api_base_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub sender_email: String,
    pub sender_password: String,
    pub recipient_email: String,
    pub smtp_host: String,
    pub query: ArticleQuery,
    pub dry_run: bool,
}

// Hand-written so credentials never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("news_api_base_url", &self.news_api_base_url)
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("sender_email", &self.sender_email)
            .field("recipient_email", &self.recipient_email)
            .field("smtp_host", &self.smtp_host)
            .field("query", &self.query)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as absent. Every missing required variable is
    /// reported at once rather than one per attempt.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&'static str> = REQUIRED
            .iter()
            .copied()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        let required = |name: &'static str| get(name).unwrap_or_default();

        let page_size = match get("NEWS_PAGE_SIZE") {
            Some(raw) => parse_bounded("NEWS_PAGE_SIZE", &raw, MAX_PAGE_SIZE)?,
            None => DEFAULT_PAGE_SIZE,
        };

        // Search-only settings are validated in either mode.
        let raw_recency = get("NEWS_RECENCY_DAYS");
        let recency_days = match &raw_recency {
            Some(raw) => parse_bounded("NEWS_RECENCY_DAYS", raw, MAX_RECENCY_DAYS)?,
            None => DEFAULT_RECENCY_DAYS,
        };
        let raw_sort = get("NEWS_SORT_BY");
        let sort_by = match &raw_sort {
            Some(raw) => raw.parse::<SortOrder>().map_err(|reason| ConfigError::Invalid {
                var: "NEWS_SORT_BY",
                value: raw.clone(),
                reason,
            })?,
            None => SortOrder::PublishedAt,
        };

        let mode = match get("NEWS_MODE").as_deref() {
            None | Some("headlines") => {
                if raw_recency.is_some() || raw_sort.is_some() {
                    warn!("NEWS_RECENCY_DAYS and NEWS_SORT_BY apply only in search mode; ignoring");
                }
                SearchMode::TopHeadlines
            }
            Some("search") => SearchMode::Search {
                recency_days,
                sort_by,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "NEWS_MODE",
                    value: other.to_string(),
                    reason: "expected `headlines` or `search`".to_string(),
                });
            }
        };

        Ok(Self {
            news_api_key: required("NEWS_API_KEY"),
            news_api_base_url: get("NEWS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NEWS_API_BASE_URL.to_string()),
            openai_api_key: required("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            sender_email: required("DIGEST_SENDER_EMAIL"),
            sender_password: required("DIGEST_SENDER_PASSWORD"),
            recipient_email: required("DIGEST_RECIPIENT_EMAIL"),
            smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            query: ArticleQuery {
                topic: get("NEWS_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
                language: get("NEWS_LANGUAGE").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                page_size,
                mode,
            },
            dry_run: get("DIGEST_DRY_RUN").is_some_and(|v| is_truthy(&v)),
        })
    }
}

/// Parse a count that must lie in `1..=max`.
fn parse_bounded(var: &'static str, raw: &str, max: u32) -> Result<u32, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason,
    };
    let n = raw.parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if n == 0 || n > max {
        return Err(invalid(format!("must be between 1 and {max}")));
    }
    Ok(n)
}

fn is_truthy(v: &str) -> bool {
    matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
