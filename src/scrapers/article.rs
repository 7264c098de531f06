//! Article page text extraction.
//!
//! Fetches an article page with a browser-like identity and keeps the text
//! of its `<p>` elements. Pages that yield no paragraphs (script-rendered or
//! bot-protected) or too little text (paywall stubs, cookie banners) are
//! rejected.
//!
//! Failures here never abort a run: [`ContentExtractor::extract`] logs the
//! reason and returns `None`, and the pipeline skips the article.

use crate::error::ExtractionFailure;
use crate::models::ExtractedContent;
use crate::utils::normalize_whitespace;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Pages with less paragraph text than this are treated as non-articles.
pub const MIN_ARTICLE_CHARS: usize = 200;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Many publishers refuse obviously automated clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Anything that can turn an article URL into article text.
pub trait ContentExtractor {
    /// `None` means the page had no usable article text.
    async fn extract(&self, url: &str) -> Option<ExtractedContent>;
}

/// Extractor backed by a plain HTTP fetch.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    http: Client,
}

impl PageExtractor {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { http })
    }

    /// Fetch `url` and extract its paragraph text.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &str) -> Result<ExtractedContent, ExtractionFailure> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractionFailure::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        let text = extract_text(&body)?;
        info!(chars = text.chars().count(), "Parsed article");
        Ok(ExtractedContent {
            url: url.to_string(),
            text,
        })
    }
}

impl ContentExtractor for PageExtractor {
    async fn extract(&self, url: &str) -> Option<ExtractedContent> {
        match self.fetch(url).await {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(%url, error = %e, "Extraction failed; skipping article");
                None
            }
        }
    }
}

/// Join the text of every `<p>` in `html`, one paragraph per line.
pub fn extract_text(html: &str) -> Result<String, ExtractionFailure> {
    let document = Html::parse_document(html);
    let mut paragraphs = document.select(&PARAGRAPH).peekable();
    if paragraphs.peek().is_none() {
        return Err(ExtractionFailure::NoParagraphs);
    }

    let text = paragraphs
        .map(|p| normalize_whitespace(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let chars = text.chars().count();
    if chars < MIN_ARTICLE_CHARS {
        return Err(ExtractionFailure::TooShort { chars });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article_html(paragraphs: &[&str]) -> String {
        let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
        format!("<html><head><title>t</title></head><body><article>{body}</article></body></html>")
    }

    fn long_paragraph() -> String {
        "The quick brown fox jumps over the lazy dog. ".repeat(6)
    }

    #[test]
    fn test_extract_text_joins_paragraphs() {
        let first = long_paragraph();
        let html = article_html(&[&first, "Second   <b>bold</b>\n paragraph."]);
        let text = extract_text(&html).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], first.trim());
        assert_eq!(lines[1], "Second bold paragraph.");
    }

    #[test]
    fn test_extract_text_no_paragraphs() {
        let html = "<html><body><div id=\"root\"></div><script>render()</script></body></html>";
        assert!(matches!(
            extract_text(html),
            Err(ExtractionFailure::NoParagraphs)
        ));
    }

    #[test]
    fn test_extract_text_too_short() {
        let html = article_html(&["We use cookies.", "Subscribe to continue reading."]);
        match extract_text(&html) {
            Err(ExtractionFailure::TooShort { chars }) => assert!(chars < MIN_ARTICLE_CHARS),
            other => panic!("expected TooShort, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_text_threshold_boundary() {
        let exact = "a".repeat(MIN_ARTICLE_CHARS);
        assert_eq!(extract_text(&article_html(&[&exact])).unwrap(), exact);

        let short = "a".repeat(MIN_ARTICLE_CHARS - 1);
        assert!(extract_text(&article_html(&[&short])).is_err());
    }

    #[test]
    fn test_extract_text_empty_paragraphs_are_too_short() {
        let html = article_html(&["", "   "]);
        assert!(matches!(
            extract_text(&html),
            Err(ExtractionFailure::TooShort { chars: 0 })
        ));
    }

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(article_html(&[&long_paragraph()]), "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let extractor = PageExtractor::new().unwrap();
        let url = format!("{}/story", server.uri());
        let content = extractor.extract(&url).await.unwrap();
        assert_eq!(content.url, url);
        assert!(content.text.starts_with("The quick brown fox"));

        let requests = server.received_requests().await.unwrap();
        let agent = requests[0].headers.get("user-agent").unwrap();
        assert_eq!(agent.to_str().unwrap(), BROWSER_USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_raw(article_html(&[&long_paragraph()]), "text/html"),
            )
            .mount(&server)
            .await;

        let extractor = PageExtractor::new().unwrap();
        let url = format!("{}/paywalled", server.uri());
        assert!(matches!(
            extractor.fetch(&url).await,
            Err(ExtractionFailure::Status(403))
        ));
        assert!(extractor.extract(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_not_fatal() {
        let extractor = PageExtractor::new().unwrap();
        assert!(extractor.extract("http://127.0.0.1:1/gone").await.is_none());
    }
}
