//! One-paragraph article summaries.
//!
//! Wraps any [`AskAsync`] model client with the newsletter prompt and the
//! input-length cap. Summarization never fails outright: provider errors
//! become [`SUMMARY_UNAVAILABLE`].

use crate::api::AskAsync;
use crate::utils::truncate_chars;
use tracing::{info, instrument, warn};

/// Longest article text (in characters) forwarded to the model.
pub const MAX_INPUT_CHARS: usize = 12_000;

pub const SYSTEM_PROMPT: &str = "You are an editor for a news newsletter. \
     Summarize the following article concisely in one paragraph for a newsletter. \
     Respond with the paragraph only.";

/// Placeholder shown in the digest when the model could not summarize.
pub const SUMMARY_UNAVAILABLE: &str =
    "Summary unavailable: the language model could not process this article.";

#[derive(Debug)]
pub struct Summarizer<A> {
    model: A,
}

impl<A: AskAsync> Summarizer<A> {
    pub fn new(model: A) -> Self {
        Self { model }
    }

    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str) -> String {
        let input = truncate_chars(text, MAX_INPUT_CHARS);
        if input.len() < text.len() {
            info!(limit = MAX_INPUT_CHARS, "Truncated article text for the model");
        }

        match self.model.ask(SYSTEM_PROMPT, input).await {
            Ok(reply) => {
                let reply = reply.trim();
                if reply.is_empty() {
                    warn!("Model returned an empty summary; using placeholder");
                    SUMMARY_UNAVAILABLE.to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "Summarization failed; using placeholder");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}
