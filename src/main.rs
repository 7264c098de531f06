//! # News Digest
//!
//! A batch job that emails a digest of recent news on one topic.
//!
//! ## Usage
//!
//! ```sh
//! export NEWS_API_KEY=... OPENAI_API_KEY=...
//! export DIGEST_SENDER_EMAIL=me@gmail.com DIGEST_SENDER_PASSWORD=app-password
//! export DIGEST_RECIPIENT_EMAIL=reader@example.com
//! news_digest
//! ```
//!
//! Settings may also live in a `.env` file in the working directory. See
//! [`config`] for every variable.
//!
//! ## Architecture
//!
//! One run is a sequential pipeline:
//! 1. **Listing**: ask NewsAPI for articles on the topic
//! 2. **Extraction**: download each article and keep its paragraph text
//! 3. **Summarization**: one paragraph per article from a chat model
//! 4. **Delivery**: render plain and HTML bodies and send them over SMTPS
//!
//! Per-article failures skip (extraction) or placeholder (summarization)
//! that article; listing and delivery failures end the run.

use chrono::Local;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod summarizer;
mod utils;

use api::OpenAiChat;
use config::Config;
use outputs::digest::DigestComposer;
use outputs::email::SmtpDelivery;
use error::RunError;
use pipeline::{Pipeline, RunOutcome};
use scrapers::article::PageExtractor;
use scrapers::newsapi::NewsApiClient;
use summarizer::Summarizer;
use utils::period_label;

/// Exit status for a run that ended normally, whether or not mail went out.
const EXIT_OK: u8 = 0;
/// Exit status for provider, startup or delivery failures.
const EXIT_FAILURE: u8 = 1;
/// Exit status for unusable configuration.
const EXIT_CONFIG: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(
            error = %e,
            "Failed to read .env file; continuing with process environment"
        ),
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error; nothing was fetched");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    info!(?config, "Loaded configuration");

    let code = run(config).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    code
}

/// HTTP clients for the news provider, article pages and the model.
fn build_clients(
    config: &Config,
) -> Result<(NewsApiClient, PageExtractor, OpenAiChat), reqwest::Error> {
    Ok((
        NewsApiClient::new(&config.news_api_key, &config.news_api_base_url)?,
        PageExtractor::new()?,
        OpenAiChat::new(&config.openai_api_key, &config.openai_base_url, &config.model)?,
    ))
}

/// Build the service objects and drive one pipeline run.
///
/// Every fatal failure is logged here.
async fn run(config: Config) -> ExitCode {
    let (source, extractor, chat) = match build_clients(&config) {
        Ok(clients) => clients,
        Err(e) => {
            error!(error = %e, "Failed to build HTTP clients");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = chat.check_credentials().await {
        error!(error = %e, model = %chat.model(), "Completion provider rejected startup check");
        return ExitCode::from(EXIT_FAILURE);
    }

    let delivery = SmtpDelivery::new(
        &config.smtp_host,
        &config.sender_email,
        &config.sender_password,
        &config.recipient_email,
    );
    let pipeline = Pipeline::new(
        source,
        extractor,
        Summarizer::new(chat),
        DigestComposer::new(&config.query.topic),
        delivery,
    )
    .dry_run(config.dry_run);

    let period = period_label(Local::now().date_naive());
    let result = pipeline.run(&config.query, &period).await;
    match &result {
        Ok(RunOutcome::NoArticles) => {
            info!(topic = %config.query.topic, "No articles found; no digest sent");
        }
        Ok(RunOutcome::NothingToSend { listed }) => {
            warn!(listed, "No article could be extracted; no digest sent");
        }
        Ok(RunOutcome::Delivered { articles }) => {
            info!(articles, to = %config.recipient_email, "Digest delivered");
        }
        Ok(RunOutcome::Composed { digest }) => {
            info!(subject = %digest.subject, "Dry run; digest follows");
            println!("Subject: {}\n\n{}", digest.subject, digest.plain_body);
        }
        Err(e) => error!(error = %e, "Run aborted"),
    }
    ExitCode::from(exit_status(&result))
}

/// Process exit status for a finished pipeline run.
fn exit_status(result: &Result<RunOutcome, RunError>) -> u8 {
    match result {
        Ok(_) => EXIT_OK,
        Err(_) => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeliveryError, ProviderError};
    use crate::models::Digest;

    #[test]
    fn test_finished_runs_exit_zero() {
        let digest = Digest {
            subject: "s".to_string(),
            plain_body: "p".to_string(),
            rich_body: "h".to_string(),
        };
        for outcome in [
            RunOutcome::NoArticles,
            RunOutcome::NothingToSend { listed: 3 },
            RunOutcome::Delivered { articles: 2 },
            RunOutcome::Composed { digest },
        ] {
            assert_eq!(exit_status(&Ok(outcome)), 0);
        }
    }

    #[test]
    fn test_aborted_runs_exit_one() {
        let provider = RunError::Provider(ProviderError::Rejected {
            code: "apiKeyInvalid".to_string(),
            message: "Your API key is invalid".to_string(),
        });
        assert_eq!(exit_status(&Err(provider)), 1);

        let delivery = RunError::Delivery(DeliveryError::InvalidAddress {
            address: "nobody".to_string(),
            source: "nobody".parse::<lettre::Address>().unwrap_err(),
        });
        assert_eq!(exit_status(&Err(delivery)), 1);
    }

    #[test]
    fn test_exit_statuses_are_distinct() {
        assert_eq!((EXIT_OK, EXIT_FAILURE, EXIT_CONFIG), (0, 1, 2));
    }
}
