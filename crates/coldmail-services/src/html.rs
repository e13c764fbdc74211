//! Shared HTTP fetch and HTML text helpers for the scraping services.

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use url::Url;

use crate::error::{ServiceError, ServiceResult};

/// Desktop browser user agent; several sites refuse obvious bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Elements whose text never counts as page content.
const NON_CONTENT: &[&str] = &["nav", "footer", "header", "script", "style", "noscript"];

/// Failure modes of a single page fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Empty response body")]
    EmptyBody,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// GET a page and return its body. Non-2xx statuses and empty bodies fail.
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    if body.is_empty() {
        return Err(FetchError::EmptyBody);
    }
    Ok(body)
}

/// GET a URL and report only whether it answered with a success status.
pub async fn check_reachable(client: &Client, url: &str) -> Result<(), FetchError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::Status(status.as_u16()))
    }
}

/// Take one permit from a service's concurrency limiter.
///
/// A closed limiter means the owning registry has shut down.
pub async fn acquire<'a>(
    limiter: &'a Arc<Semaphore>,
    service: &str,
    operation: &str,
) -> ServiceResult<SemaphorePermit<'a>> {
    limiter
        .acquire()
        .await
        .map_err(|e| {
            ServiceError::new(service, operation, "Service has been shut down").with_cause(e)
        })
}

/// Parse a selector that is known to be valid at compile time.
///
/// Invalid selectors match nothing rather than panicking.
pub fn select_all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => root.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// First match of a selector under `root`.
pub fn select_first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    Selector::parse(css)
        .ok()
        .and_then(|selector| root.select(&selector).next())
}

/// Value of an attribute on the first element matching `css`, or empty.
pub fn attr_of_first(document: &Html, css: &str, attr: &str) -> String {
    select_first(document.root_element(), css)
        .and_then(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Whitespace-normalized text of an element and all its descendants.
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize(element.text())
}

/// Whitespace-normalized text of an element, skipping navigation chrome,
/// scripts and styles.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let parts = element.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| NON_CONTENT.contains(&a.value().name()));
        (!hidden).then_some(&**text)
    });
    normalize(parts)
}

fn normalize<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve an href against the page URL, like a browser's `abs:href`.
pub fn absolute_href(base: &str, href: &str) -> Option<String> {
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(String::from),
        Err(_) => Url::parse(href).ok().map(String::from),
    }
}

/// Truncate on a character boundary, appending `...` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_chrome() {
        let html = Html::parse_document(
            "<html><body><nav>Menu</nav><p>Hello   <b>world</b></p>\
             <script>var x = 1;</script><footer>Legal</footer></body></html>",
        );
        let body = select_first(html.root_element(), "body").unwrap();
        assert_eq!(visible_text(body), "Hello world");
        assert!(element_text(body).contains("Menu"));
    }

    #[test]
    fn test_absolute_href() {
        assert_eq!(
            absolute_href("https://acme.com/about/", "../pricing").as_deref(),
            Some("https://acme.com/pricing")
        );
        assert_eq!(
            absolute_href("https://acme.com", "https://news.example.com/a").as_deref(),
            Some("https://news.example.com/a")
        );
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let html = Html::parse_document("<p>x</p>");
        assert!(select_all(html.root_element(), "p[[").is_empty());
    }
}
