//! Digest rendering.
//!
//! Turns the run's summaries into a [`Digest`]: a subject line, a plain-text
//! body, and an HTML body. Both bodies list articles in source order.
//!
//! # Plain Layout
//!
//! ```text
//! Here are the latest technology stories for May 2025.
//!
//! ----------------------------------------
//! Title
//! https://example.com/article
//!
//! Summary paragraph.
//! ----------------------------------------
//! ...
//! ```
//!
//! The HTML body uses inline styles only, since most mail clients strip
//! `<style>` blocks.

use crate::models::{Digest, Summary};
use crate::utils::{html_escape, upcase};
use tracing::{info, instrument};

const RULE: &str = "----------------------------------------";

/// Builds digests for one topic.
#[derive(Debug, Clone)]
pub struct DigestComposer {
    topic: String,
}

impl DigestComposer {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    /// Render `summaries` for `period`.
    ///
    /// Returns `None` when there is nothing to send.
    #[instrument(level = "info", skip_all, fields(count = summaries.len(), %period))]
    pub fn compose(&self, summaries: &[Summary], period: &str) -> Option<Digest> {
        if summaries.is_empty() {
            info!("No summaries; nothing to send");
            return None;
        }

        let digest = Digest {
            subject: format!("Your {} news digest for {}", self.topic, period),
            plain_body: self.render_plain(summaries, period),
            rich_body: self.render_html(summaries, period),
        };
        info!(subject = %digest.subject, "Composed digest");
        Some(digest)
    }

    fn render_plain(&self, summaries: &[Summary], period: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Here are the latest {} stories for {}.\n\n",
            self.topic, period
        ));
        for summary in summaries {
            out.push_str(&format!(
                "{RULE}\n{title}\n{url}\n\n{body}\n",
                title = summary.article.title,
                url = summary.article.url,
                body = summary.body,
            ));
        }
        out.push_str(RULE);
        out.push('\n');
        out
    }

    fn render_html(&self, summaries: &[Summary], period: &str) -> String {
        let mut entries = String::new();
        for summary in summaries {
            entries.push_str(&format!(
                r#"
        <div style="margin: 0 0 20px 0; padding: 16px 20px; background: #f8fafc; border-left: 4px solid #2563eb; border-radius: 6px;">
            <h2 style="margin: 0 0 8px 0; font-size: 18px; color: #0f172a;">{title}</h2>
            <p style="margin: 0 0 12px 0; font-size: 15px; line-height: 1.6; color: #334155;">{body}</p>
            <a href="{url}" style="font-size: 14px; color: #2563eb; text-decoration: none;">Read more &rarr;</a>
        </div>
"#,
                title = html_escape(&summary.article.title),
                body = html_escape(&summary.body),
                url = html_escape(&summary.article.url),
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="margin: 0; padding: 20px; background: #e2e8f0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', sans-serif;">
    <div style="max-width: 680px; margin: 0 auto; background: #ffffff; border-radius: 12px; overflow: hidden;">
        <div style="background: #1e3a8a; color: #ffffff; padding: 28px;">
            <h1 style="margin: 0 0 6px 0; font-size: 26px;">{topic} News Digest</h1>
            <div style="font-size: 14px; opacity: 0.9;">{period}</div>
        </div>
        <div style="padding: 24px;">{entries}
        </div>
    </div>
</body>
</html>
"#,
            topic = html_escape(&upcase(&self.topic)),
            period = html_escape(period),
            entries = entries,
        )
    }
}
