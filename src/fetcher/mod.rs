
use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::{debug, warn};
use ureq::Agent;
use ureq::http::header::CONTENT_TYPE;
use url::Url;

use crate::config::PipelineConfig;
use crate::pipeline::progress::ProgressObserver;

/// Reasons a bookmarked page yields no usable text
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP error {0}")]
    Status(u16),
    #[error("Not an HTML document (content type: {0})")]
    NotHtml(String),
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Source of visible page text for a URL
pub trait PageSource {
    /// Fetch a page and return its visible text, or the reason it is unusable
    fn try_fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    #[inline]
    fn try_fetch_text(&self, url: &str) -> Result<String, FetchError> {
        (**self).try_fetch_text(url)
    }
}

/// Fetch page text, degrading any failure to an empty string.
///
/// Failures are reported to the observer and never returned.
#[inline]
pub fn fetch_or_empty<S, O>(source: &S, url: &str, observer: &mut O) -> String
where
    S: PageSource + ?Sized,
    O: ProgressObserver + ?Sized,
{
    match source.try_fetch_text(url) {
        Ok(text) => text,
        Err(e) => {
            warn!("No usable content from {}: {}", url, e);
            observer.fetch_failed(url);
            String::new()
        }
    }
}

/// Blocking HTTP fetcher for bookmarked pages
#[derive(Debug, Clone)]
pub struct PageTextFetcher {
    agent: Agent,
}

impl PageTextFetcher {
    #[inline]
    pub fn new(config: &PipelineConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(config.fetch_timeout()))
            .user_agent(&config.user_agent)
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }
}

impl Default for PageTextFetcher {
    #[inline]
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl PageSource for PageTextFetcher {
    fn try_fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::UnsupportedUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::UnsupportedUrl(url.to_string()));
        }

        debug!("Making HTTP GET request to: {}", url);

        let mut response = self
            .agent
            .get(parsed.as_str())
            .call()
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => FetchError::Timeout,
                other => FetchError::Transport(other.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_html_content_type(&content_type) {
            return Err(FetchError::NotHtml(content_type));
        }

        let html = response.body_mut().read_to_string().map_err(|e| match e {
            ureq::Error::Timeout(_) => FetchError::Timeout,
            other => FetchError::Body(other.to_string()),
        })?;
        debug!("Successfully read {} bytes from {}", html.len(), url);

        Ok(extract_visible_text(&html))
    }
}

/// Whether a Content-Type header value declares an HTML document
#[inline]
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "text/html" || essence == "application/xhtml+xml"
}

/// Strip markup and return the visible text with whitespace runs collapsed
#[inline]
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut content = String::new();
    extract_text_recursive(document.root_element(), &mut content);
    clean_text(&content)
}

fn extract_text_recursive(element: ElementRef, content: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            match child_element.value().name() {
                "script" | "style" | "noscript" | "template" | "svg" => {}
                _ => extract_text_recursive(child_element, content),
            }
        } else if let Some(text_node) = child.value().as_text() {
            content.push_str(text_node);
            content.push(' ');
        }
    }
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
