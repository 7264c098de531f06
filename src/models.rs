//! Data models passed between pipeline stages.
//!
//! - [`ArticleRef`]: an article as listed by the news provider
//! - [`ExtractedContent`]: paragraph text scraped from an article page
//! - [`Summary`]: an article paired with its one-paragraph synopsis
//! - [`Digest`]: the rendered email for one run
//! - [`ArticleQuery`]: what to ask the news provider for
//!
//! Nothing here outlives a single run.

use std::fmt;
use std::str::FromStr;

/// An article listed by the news provider.
///
/// Identified by `url` for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    /// The headline as reported by the provider.
    pub title: String,
    /// Absolute URL of the article page.
    pub url: String,
}

/// Article text scraped from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub url: String,
    pub text: String,
}

/// A synopsis of one article.
///
/// `body` is either model output or
/// [`SUMMARY_UNAVAILABLE`](crate::summarizer::SUMMARY_UNAVAILABLE).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub article: ArticleRef,
    pub body: String,
}

/// The rendered email, consumed once by the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub plain_body: String,
    pub rich_body: String,
}

/// Sort order for search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    PublishedAt,
    Relevancy,
    Popularity,
}

impl SortOrder {
    /// The provider's wire value for `sortBy`.
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::PublishedAt => "publishedAt",
            SortOrder::Relevancy => "relevancy",
            SortOrder::Popularity => "popularity",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publishedAt" => Ok(SortOrder::PublishedAt),
            "relevancy" => Ok(SortOrder::Relevancy),
            "popularity" => Ok(SortOrder::Popularity),
            other => Err(format!(
                "unknown sort order `{other}` (expected publishedAt, relevancy or popularity)"
            )),
        }
    }
}

/// Which provider endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Current top headlines matching the topic.
    TopHeadlines,
    /// Everything published in the last `recency_days`, ordered by `sort_by`.
    Search { recency_days: u32, sort_by: SortOrder },
}

/// What to ask the news provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    /// Keywords, passed verbatim as `q`.
    pub topic: String,
    /// ISO-639-1 code, e.g. `en`.
    pub language: String,
    /// Upper bound on returned articles.
    pub page_size: u32,
    pub mode: SearchMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_wire_values() {
        for order in [
            SortOrder::PublishedAt,
            SortOrder::Relevancy,
            SortOrder::Popularity,
        ] {
            assert_eq!(order.as_str().parse::<SortOrder>(), Ok(order));
        }
    }

    #[test]
    fn test_sort_order_rejects_unknown() {
        let err = "newest".parse::<SortOrder>().unwrap_err();
        assert!(err.contains("newest"));
    }

    #[test]
    fn test_sort_order_display() {
        assert_eq!(SortOrder::PublishedAt.to_string(), "publishedAt");
    }
}
