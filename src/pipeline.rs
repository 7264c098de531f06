//! The fetch → scrape → summarize → deliver run.
//!
//! [`Pipeline`] owns one service object per stage and decides, per stage,
//! whether a failure skips an article or ends the run:
//!
//! | Stage | On failure |
//! |-------|------------|
//! | article source | abort ([`RunError::Provider`]) |
//! | content extractor | skip the article |
//! | summarizer | keep the article with a placeholder summary |
//! | delivery | abort ([`RunError::Delivery`]) |
//!
//! Articles are processed one at a time in source order.

use crate::api::AskAsync;
use crate::error::RunError;
use crate::models::{ArticleQuery, ArticleRef, Digest, Summary};
use crate::outputs::digest::DigestComposer;
use crate::outputs::email::DeliveryChannel;
use crate::scrapers::article::ContentExtractor;
use crate::scrapers::newsapi::ArticleSource;
use crate::summarizer::Summarizer;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument};

/// How a run ended when nothing went fatally wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The provider had no articles for the query.
    NoArticles,
    /// Articles were listed but none yielded usable text.
    NothingToSend { listed: usize },
    /// The digest was handed to the mail server.
    Delivered { articles: usize },
    /// Dry run: the digest was composed but not sent.
    Composed { digest: Digest },
}

pub struct Pipeline<S, E, A, D> {
    source: S,
    extractor: E,
    summarizer: Summarizer<A>,
    composer: DigestComposer,
    delivery: D,
    dry_run: bool,
}

impl<S, E, A, D> Pipeline<S, E, A, D>
where
    S: ArticleSource,
    E: ContentExtractor,
    A: AskAsync,
    D: DeliveryChannel,
{
    pub fn new(
        source: S,
        extractor: E,
        summarizer: Summarizer<A>,
        composer: DigestComposer,
        delivery: D,
    ) -> Self {
        Self {
            source,
            extractor,
            summarizer,
            composer,
            delivery,
            dry_run: false,
        }
    }

    /// Compose the digest but skip delivery.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[instrument(level = "info", skip_all, fields(topic = %query.topic, %period))]
    pub async fn run(&self, query: &ArticleQuery, period: &str) -> Result<RunOutcome, RunError> {
        let articles = self.source.fetch_articles(query).await?;
        if articles.is_empty() {
            info!("No articles found for this topic");
            return Ok(RunOutcome::NoArticles);
        }
        let listed = articles.len();
        info!(count = listed, "Articles to process");

        let summaries = self.summarize_articles(articles).await;
        info!(
            listed,
            summarized = summaries.len(),
            skipped = listed - summaries.len(),
            "Completed article processing"
        );

        let Some(digest) = self.composer.compose(&summaries, period) else {
            info!("No article produced usable text; skipping delivery");
            return Ok(RunOutcome::NothingToSend { listed });
        };

        if self.dry_run {
            info!("Dry run; digest not sent");
            return Ok(RunOutcome::Composed { digest });
        }

        self.delivery.deliver(&digest).await?;
        Ok(RunOutcome::Delivered {
            articles: summaries.len(),
        })
    }

    /// Extract and summarize each article in order, dropping any whose
    /// extraction failed.
    pub async fn summarize_articles(&self, articles: Vec<ArticleRef>) -> Vec<Summary> {
        let total = articles.len();
        stream::iter(articles.into_iter().enumerate())
            .then(|(i, article)| async move {
                debug!(index = i, total, url = %article.url, "Processing article");
                let Some(content) = self.extractor.extract(&article.url).await else {
                    return None;
                };
                debug!(
                    url = %content.url,
                    chars = content.text.chars().count(),
                    "Extracted article text"
                );
                let body = self.summarizer.summarize(&content.text).await;
                info!(index = i, title = %article.title, "Summarized article");
                Some(Summary { article, body })
            })
            .filter_map(std::future::ready)
            .collect()
            .await
    }
}
