//! Recent news lookup by scraping a news search results page.

use reqwest::Client;
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{ServiceError, ServiceResult};
use crate::html::{
    absolute_href, acquire, element_text, fetch_html, select_all, select_first,
};

const SERVICE: &str = "NewsSearchService";

/// Search endpoint. Results are restricted to news from the past month.
pub const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search";

/// Most articles returned from one search.
pub const MAX_ARTICLES: usize = 5;

const NO_ARTICLES_NOTICE: &str = "News search completed successfully, but no recent articles were found. \
This may indicate limited recent news coverage for this company. \
Please proceed with information from other research sources.";

const DATE_UNITS: &[&str] = &["hour", "day", "week", "month"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
    pub date: String,
}

impl NewsArticle {
    pub fn to_summary(&self) -> String {
        let mut lines = vec![format!("TITLE: {}", self.title)];
        if !self.source.is_empty() {
            lines.push(format!("SOURCE: {}", self.source));
        }
        if !self.date.is_empty() {
            lines.push(format!("DATE: {}", self.date));
        }
        if !self.snippet.is_empty() {
            lines.push(format!("SUMMARY: {}", self.snippet));
        }
        lines.push(format!("URL: {}", self.url));
        lines.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct NewsSearch {
    client: Client,
    limiter: Arc<Semaphore>,
    search_url: String,
}

impl NewsSearch {
    pub fn new(client: Client, limiter: Arc<Semaphore>) -> Self {
        Self {
            client,
            limiter,
            search_url: GOOGLE_SEARCH_URL.to_string(),
        }
    }

    /// Use a different search endpoint.
    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    pub fn service_name(&self) -> &'static str {
        SERVICE
    }

    /// Search for news about a company from the past month.
    pub async fn search_recent_news(&self, company_name: &str) -> ServiceResult<Vec<NewsArticle>> {
        let _permit = acquire(&self.limiter, SERVICE, "searchRecentNews").await?;

        let query = urlencoding::encode(&format!("{} news", company_name)).into_owned();
        let url = format!("{}?q={}&tbm=nws&tbs=qdr:m", self.search_url, query);
        tracing::info!(company = %company_name, %url, "Searching for recent news");

        let html = fetch_html(&self.client, &url).await.map_err(|e| {
            tracing::warn!(error = %e, "News search failed");
            ServiceError::new(
                SERVICE,
                "searchRecentNews",
                format!(
                    "Failed to search news for: {}. Recommendation: Use NewsAPI.org, SerpAPI, or Google News API for production",
                    company_name
                ),
            )
            .with_cause(e)
        })?;

        let articles = extract_articles(&html, &url);
        tracing::debug!(count = articles.len(), "Parsed news results");
        Ok(articles)
    }

    /// Render articles as a numbered block for an analyzer agent.
    pub fn format_articles_for_analysis(&self, articles: &[NewsArticle]) -> String {
        format_articles(articles)
    }
}

pub fn format_articles(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return NO_ARTICLES_NOTICE.to_string();
    }

    let body = articles
        .iter()
        .enumerate()
        .map(|(i, article)| format!("Article {}:\n{}", i + 1, article.to_summary()))
        .collect::<Vec<_>>()
        .join("\n");

    format!("RECENT NEWS ARTICLES ({} found):\n\n{}", articles.len(), body)
}

fn extract_articles(html: &str, page_url: &str) -> Vec<NewsArticle> {
    let document = Html::parse_document(html);

    select_all(document.root_element(), "div[data-ved]")
        .into_iter()
        .filter_map(|block| parse_result_block(block, page_url))
        .take(MAX_ARTICLES)
        .collect()
}

fn parse_result_block(block: ElementRef<'_>, page_url: &str) -> Option<NewsArticle> {
    let title = element_text(select_first(block, "h3")?);
    let href = select_first(block, "a[href]")?.value().attr("href")?;
    let url = absolute_href(page_url, href).unwrap_or_default();
    if title.is_empty() || url.is_empty() {
        return None;
    }

    let snippet = select_first(block, "div[style*=\"-webkit-line-clamp\"]")
        .or_else(|| select_first(block, "span[style*=\"-webkit-line-clamp\"]"))
        .map(element_text)
        .unwrap_or_default();

    let spans = select_all(block, "span");
    let source = spans.first().map(|s| element_text(*s)).unwrap_or_default();
    let date = spans
        .iter()
        .map(|s| element_text(*s))
        .find(|text| {
            let lower = text.to_lowercase();
            DATE_UNITS.iter().any(|unit| lower.contains(unit))
        })
        .unwrap_or_default();

    Some(NewsArticle {
        title,
        url,
        snippet,
        source,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn result_block(i: usize) -> String {
        format!(
            r#"<div data-ved="x{i}"><a href="/url?q={i}"><span>Source {i}</span>
               <h3>Headline {i}</h3>
               <div style="-webkit-line-clamp:2">Snippet {i}</div>
               <span>{i} days ago</span></a></div>"#
        )
    }

    #[test]
    fn test_extract_articles_limits_and_parses() {
        let blocks: String = (1..=7).map(result_block).collect();
        let html = format!(
            "<html><body><div data-ved=\"empty\"><span>ad</span></div>{}</body></html>",
            blocks
        );

        let articles = extract_articles(&html, "https://www.google.com/search?q=x");
        assert_eq!(articles.len(), 5);

        let first = &articles[0];
        assert_eq!(first.title, "Headline 1");
        assert_eq!(first.url, "https://www.google.com/url?q=1");
        assert_eq!(first.snippet, "Snippet 1");
        assert_eq!(first.source, "Source 1");
        assert_eq!(first.date, "1 days ago");
    }

    #[test]
    fn test_format_no_articles() {
        assert!(format_articles(&[]).starts_with("News search completed successfully"));
    }

    #[test]
    fn test_format_articles() {
        let article = NewsArticle {
            title: "Acme raises Series B".to_string(),
            url: "https://news.example.com/acme".to_string(),
            snippet: String::new(),
            source: "TechDaily".to_string(),
            date: "2 weeks ago".to_string(),
        };
        assert_eq!(
            format_articles(&[article]),
            "RECENT NEWS ARTICLES (1 found):\n\nArticle 1:\nTITLE: Acme raises Series B\n\
             SOURCE: TechDaily\nDATE: 2 weeks ago\nURL: https://news.example.com/acme"
        );
    }

    #[tokio::test]
    async fn test_search_recent_news() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Acme Corp news"))
            .and(query_param("tbm", "nws"))
            .and(query_param("tbs", "qdr:m"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("<html><body>{}</body></html>", result_block(1))),
            )
            .mount(&server)
            .await;

        let news = NewsSearch::new(Client::new(), Arc::new(Semaphore::new(3)))
            .with_search_url(format!("{}/search", server.uri()));
        let articles = news.search_recent_news("Acme Corp").await.unwrap();

        assert_eq!(articles.len(), 1);
        assert!(articles[0].url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn test_search_failure_recommends_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let news = NewsSearch::new(Client::new(), Arc::new(Semaphore::new(3)))
            .with_search_url(server.uri());
        let err = news.search_recent_news("Acme").await.unwrap_err();

        assert_eq!(err.operation, "searchRecentNews");
        assert!(err.user_message().contains("NewsAPI.org"));
    }
}
