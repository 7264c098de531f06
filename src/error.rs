//! Failure kinds for each pipeline stage.
//!
//! Every stage reports its own error type so the driver in
//! [`crate::pipeline`] can decide per stage whether a failure skips one
//! article or aborts the run:
//!
//! | Type | Stage | Effect |
//! |------|-------|--------|
//! | [`ConfigError`] | startup | fatal, before any network call |
//! | [`ProviderError`] | article source | fatal |
//! | [`ExtractionFailure`] | content extractor | article skipped |
//! | [`CompletionError`] | summarizer | placeholder summary |
//! | [`DeliveryError`] | delivery channel | fatal |

use thiserror::Error;

/// Missing or malformed configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// The news-search provider could not deliver a result set.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to news provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("news provider rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("news provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("news provider returned an undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a page yielded no usable article text.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("page request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("page returned HTTP {0}")]
    Status(u16),

    #[error("page has no paragraph content")]
    NoParagraphs,

    #[error("paragraph text too short ({chars} chars)")]
    TooShort { chars: usize },
}

/// A chat completion request did not produce text.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("completion provider returned no choices")]
    Empty,
}

/// The digest could not be handed to the mail submission server.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid mail address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP authentication failed: {0}")]
    Authentication(#[source] lettre::transport::smtp::Error),

    #[error("SMTP submission rejected: {0}")]
    Protocol(#[source] lettre::transport::smtp::Error),

    #[error("could not reach mail server: {0}")]
    Connection(#[source] lettre::transport::smtp::Error),
}

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
