//! Company website discovery and content extraction.

use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{ServiceError, ServiceResult};
use crate::html::{
    absolute_href, acquire, attr_of_first, check_reachable, element_text, fetch_html,
    select_all, select_first, truncate_chars, visible_text,
};

const SERVICE: &str = "WebScraperService";

const MAX_HEADINGS: usize = 20;
const MAX_LINKS: usize = 10;
const MAX_MAIN_TEXT: usize = 2000;

const INDUSTRY_KEYWORDS: &[&str] = &[
    "technology",
    "software",
    "saas",
    "fintech",
    "healthcare",
    "manufacturing",
    "retail",
    "consulting",
    "finance",
];

/// Content pulled from a company's home page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebsiteContent {
    pub url: String,
    pub title: String,
    pub description: String,
    pub main_text: String,
    pub headings: Vec<String>,
    pub important_links: Vec<String>,
    pub company_size: String,
    pub industry: String,
}

impl WebsiteContent {
    /// Render as labeled sections for an analyzer agent.
    pub fn to_analysis_prompt(&self) -> String {
        let mut sections = vec![
            format!("WEBSITE: {}", self.url),
            format!("TITLE: {}", self.title),
            String::new(),
        ];

        let facts: Vec<String> = [
            ("DESCRIPTION", &self.description),
            ("COMPANY SIZE", &self.company_size),
            ("INDUSTRY", &self.industry),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(label, v)| format!("{}: {}", label, v))
        .collect();
        sections.push(facts.join("\n\n"));

        if !self.headings.is_empty() {
            let list: Vec<String> = self.headings.iter().map(|h| format!("- {}", h)).collect();
            sections.push(format!("KEY SECTIONS:\n{}", list.join("\n")));
        }

        sections.push(format!(
            "MAIN CONTENT (first {} chars):\n{}",
            MAX_MAIN_TEXT,
            truncate_chars(&self.main_text, MAX_MAIN_TEXT)
        ));

        sections.join("\n\n")
    }
}

/// Fetches real company websites.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    limiter: Arc<Semaphore>,
}

impl WebScraper {
    /// Create a scraper over a shared client and concurrency limiter.
    pub fn new(client: Client, limiter: Arc<Semaphore>) -> Self {
        Self { client, limiter }
    }

    /// Service name used in errors and logs.
    pub fn service_name(&self) -> &'static str {
        SERVICE
    }

    /// Fetch a page and extract its content.
    pub async fn fetch_website(&self, url: &str) -> ServiceResult<WebsiteContent> {
        let _permit = acquire(&self.limiter, SERVICE, "fetchWebsite").await?;
        tracing::info!(%url, "Fetching website");

        let html = fetch_html(&self.client, url).await.map_err(|e| {
            ServiceError::new(SERVICE, "fetchWebsite", format!("Failed to fetch website: {}", url))
                .with_cause(e)
        })?;

        Ok(extract_content(&html, url))
    }

    /// Guess a company's website from its name by probing common URL shapes.
    pub async fn find_company_website(&self, company_name: &str) -> ServiceResult<String> {
        let _permit = acquire(&self.limiter, SERVICE, "findCompanyWebsite").await?;

        for url in candidate_urls(company_name) {
            match check_reachable(&self.client, &url).await {
                Ok(()) => {
                    tracing::info!(%url, "Found company website");
                    return Ok(url);
                }
                Err(e) => tracing::debug!(%url, error = %e, "Website candidate rejected"),
            }
        }

        tracing::warn!(company = %company_name, "Could not auto-detect website");
        Err(ServiceError::new(
            SERVICE,
            "findCompanyWebsite",
            format!(
                "Could not auto-detect website for: {}. Tip: Use Google Custom Search API or SerpAPI",
                company_name
            ),
        ))
    }
}

/// Candidate home page URLs for a company name, most likely first.
pub fn candidate_urls(company_name: &str) -> Vec<String> {
    let lower = company_name.trim().to_lowercase();
    let squashed: String = lower.split_whitespace().collect();
    let dashed = lower.split_whitespace().collect::<Vec<_>>().join("-");

    vec![
        format!("https://www.{}.com", squashed),
        format!("https://{}.com", squashed),
        format!("https://www.{}.com", dashed),
    ]
}

/// Extract structured content from a fetched page.
pub fn extract_content(html: &str, url: &str) -> WebsiteContent {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = select_first(root, "title")
        .map(element_text)
        .unwrap_or_default();

    let mut description = attr_of_first(&document, "meta[name=description]", "content");
    if description.is_empty() {
        description = attr_of_first(&document, "meta[property=\"og:description\"]", "content");
    }

    let main_text = match select_first(root, "main, article, [role=main]") {
        Some(main) => element_text(main),
        None => select_first(root, "body").map(visible_text).unwrap_or_default(),
    };

    let headings: Vec<String> = select_all(root, "h1, h2, h3")
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .take(MAX_HEADINGS)
        .collect();

    let mut important_links: Vec<String> = Vec::new();
    for link in select_all(root, "a[href]") {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        if let Some(abs) = absolute_href(url, href) {
            if !important_links.contains(&abs) {
                important_links.push(abs);
            }
        }
        if important_links.len() == MAX_LINKS {
            break;
        }
    }

    let page_text = visible_text(root);

    let company_size = page_text
        .split(['.', '!', '?'])
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            lower.contains("employee") || lower.contains("team size")
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let mut industry = attr_of_first(&document, "meta[property=\"og:type\"]", "content");
    if industry.is_empty() {
        let lower = page_text.to_lowercase();
        industry = INDUSTRY_KEYWORDS
            .iter()
            .find(|kw| lower.contains(*kw))
            .map(|kw| capitalize(kw))
            .unwrap_or_default();
    }

    WebsiteContent {
        url: url.to_string(),
        title,
        description,
        main_text,
        headings,
        important_links,
        company_size,
        industry,
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"<html><head>
        <title>Acme | Compliance for startups</title>
        <meta property="og:description" content="Acme builds audit tooling">
        </head><body>
        <nav><a href="#top">Top</a><a href="/pricing">Pricing</a></nav>
        <h1>Ship faster</h1><h2></h2><h3>Trusted by teams</h3>
        <p>We are a SaaS company. Our team of 120 employees works remotely!</p>
        <a href="/pricing">Pricing again</a><a href="https://blog.acme.com/">Blog</a>
        <footer>Copyright</footer>
        </body></html>"##;

    #[test]
    fn test_candidate_urls() {
        assert_eq!(
            candidate_urls("Acme Corp"),
            vec![
                "https://www.acmecorp.com",
                "https://acmecorp.com",
                "https://www.acme-corp.com",
            ]
        );
    }

    #[test]
    fn test_extract_content() {
        let content = extract_content(PAGE, "https://acme.com/");

        assert_eq!(content.title, "Acme | Compliance for startups");
        assert_eq!(content.description, "Acme builds audit tooling");
        assert_eq!(content.headings, vec!["Ship faster", "Trusted by teams"]);
        assert_eq!(
            content.important_links,
            vec!["https://acme.com/pricing", "https://blog.acme.com/"]
        );
        assert_eq!(content.company_size, "Our team of 120 employees works remotely");
        assert_eq!(content.industry, "Saas");
        assert!(content.main_text.contains("SaaS company"));
        assert!(!content.main_text.contains("Copyright"));
    }

    #[test]
    fn test_analysis_prompt_layout() {
        let content = WebsiteContent {
            url: "https://acme.com".to_string(),
            title: "Acme".to_string(),
            description: "Audit tooling".to_string(),
            main_text: "x".repeat(2500),
            headings: vec!["Ship faster".to_string()],
            important_links: vec![],
            company_size: String::new(),
            industry: "Software".to_string(),
        };

        let prompt = content.to_analysis_prompt();
        assert!(prompt.starts_with("WEBSITE: https://acme.com\n\nTITLE: Acme\n\n\n\nDESCRIPTION"));
        assert!(prompt.contains("DESCRIPTION: Audit tooling\n\nINDUSTRY: Software"));
        assert!(!prompt.contains("COMPANY SIZE"));
        assert!(prompt.contains("KEY SECTIONS:\n- Ship faster"));
        assert!(prompt.ends_with(&format!("{}...", "x".repeat(2000))));
    }

    #[tokio::test]
    async fn test_fetch_website() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let scraper = WebScraper::new(Client::new(), Arc::new(Semaphore::new(5)));
        let content = scraper.fetch_website(&server.uri()).await.unwrap();
        assert_eq!(content.title, "Acme | Compliance for startups");
    }

    #[tokio::test]
    async fn test_fetch_website_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let scraper = WebScraper::new(Client::new(), Arc::new(Semaphore::new(5)));
        let err = scraper.fetch_website(&server.uri()).await.unwrap_err();
        assert_eq!(err.service, "WebScraperService");
        assert_eq!(err.operation, "fetchWebsite");
        assert!(err.format().contains("Unexpected HTTP status 503"));
    }

    #[tokio::test]
    async fn test_closed_limiter_fails_fast() {
        let limiter = Arc::new(Semaphore::new(1));
        limiter.close();
        let scraper = WebScraper::new(Client::new(), limiter);
        let err = scraper.fetch_website("http://127.0.0.1:9").await.unwrap_err();
        assert_eq!(err.user_message(), "Service has been shut down");
    }
}
