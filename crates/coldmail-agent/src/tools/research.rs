//! The research agent's tools.

use async_trait::async_trait;
use coldmail_services::{LinkedInScraper, NewsSearch, WebScraper};
use std::sync::Arc;

use super::prompt::ToolPromptBuilder;
use crate::agent::Agent;
use crate::gateway::Gateway;
use crate::tool::{AgentTool, PromptAugmenter, ServiceBackedTool};

pub const WEBSITE_TOOL: &str = "analyze_company_website";
pub const LINKEDIN_TOOL: &str = "analyze_linkedin_profile";
pub const NEWS_TOOL: &str = "analyze_recent_news";
pub const COMPETITIVE_TOOL: &str = "analyze_competitive_position";

const WEBSITE_DESCRIPTION: &str = "Analyze the company's website to extract business information, \
products/services, technology stack, and company culture. Uses REAL web scraping to fetch actual website data.";

const LINKEDIN_DESCRIPTION: &str = "Analyze the company's LinkedIn page for employee count, growth \
trends, recent posts, key executives, and company culture. Attempts REAL LinkedIn scraping (may fallback due to ToS restrictions).";

const NEWS_DESCRIPTION: &str = "Search for and analyze recent news about the company including \
funding, product launches, expansions, or challenges. Uses REAL web search to find actual news articles.";

const COMPETITIVE_DESCRIPTION: &str = "Analyze the company's competitive landscape and market \
position. Use this to understand how SOC2 compliance affects their competitive strategy.";

const NEWS_TEMPLATE: &str = "Analyze these recent news articles about {companyName}:\n\n{data}";

// ─────────────────────────────────────────────────────────────────────────────
// Augmenters
// ─────────────────────────────────────────────────────────────────────────────

/// Finds the company's website and feeds its content to the analyzer.
pub struct WebsiteAugmenter {
    scraper: WebScraper,
}

impl WebsiteAugmenter {
    pub fn new(scraper: WebScraper) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl PromptAugmenter for WebsiteAugmenter {
    async fn augment(&self, prompt: &str) -> String {
        let builder = ToolPromptBuilder::from_prompt(prompt);

        let url = match self.scraper.find_company_website(builder.company_name()).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e.format(), "Website lookup failed");
                return builder.fallback(&e.user_message());
            }
        };

        match self.scraper.fetch_website(&url).await {
            Ok(content) => builder.analysis("company website data", &content.to_analysis_prompt()),
            Err(e) => {
                tracing::warn!(error = %e.format(), "Website fetch failed");
                builder.fallback(&e.user_message())
            }
        }
    }
}

/// Feeds the company's LinkedIn page to the analyzer.
pub struct LinkedInAugmenter {
    scraper: LinkedInScraper,
}

impl LinkedInAugmenter {
    pub fn new(scraper: LinkedInScraper) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl PromptAugmenter for LinkedInAugmenter {
    async fn augment(&self, prompt: &str) -> String {
        let builder = ToolPromptBuilder::from_prompt(prompt);
        let result = self.scraper.scrape_company_page(builder.company_name()).await;
        builder.analysis_of(result, |data| data.to_analysis_prompt(), "LinkedIn company data")
    }
}

/// Feeds recent news articles about the company to the analyzer.
pub struct NewsAugmenter {
    news: NewsSearch,
}

impl NewsAugmenter {
    pub fn new(news: NewsSearch) -> Self {
        Self { news }
    }
}

#[async_trait]
impl PromptAugmenter for NewsAugmenter {
    async fn augment(&self, prompt: &str) -> String {
        let builder = ToolPromptBuilder::from_prompt(prompt);
        let result = self.news.search_recent_news(builder.company_name()).await;
        builder.custom_of(
            result,
            |articles| self.news.format_articles_for_analysis(articles),
            NEWS_TEMPLATE,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Constructors
// ─────────────────────────────────────────────────────────────────────────────

pub fn website_tool(
    analyzer: Arc<Agent>,
    gateway: Gateway,
    scraper: WebScraper,
) -> ServiceBackedTool {
    ServiceBackedTool::new(
        AgentTool::new(WEBSITE_TOOL, WEBSITE_DESCRIPTION, analyzer, gateway),
        Arc::new(WebsiteAugmenter::new(scraper)),
    )
}

pub fn linkedin_tool(
    analyzer: Arc<Agent>,
    gateway: Gateway,
    scraper: LinkedInScraper,
) -> ServiceBackedTool {
    ServiceBackedTool::new(
        AgentTool::new(LINKEDIN_TOOL, LINKEDIN_DESCRIPTION, analyzer, gateway),
        Arc::new(LinkedInAugmenter::new(scraper)),
    )
}

pub fn news_tool(analyzer: Arc<Agent>, gateway: Gateway, news: NewsSearch) -> ServiceBackedTool {
    ServiceBackedTool::new(
        AgentTool::new(NEWS_TOOL, NEWS_DESCRIPTION, analyzer, gateway),
        Arc::new(NewsAugmenter::new(news)),
    )
}

pub fn competitive_tool(analyzer: Arc<Agent>, gateway: Gateway) -> AgentTool {
    AgentTool::new(COMPETITIVE_TOOL, COMPETITIVE_DESCRIPTION, analyzer, gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;
    use tokio::sync::Semaphore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn limiter() -> Arc<Semaphore> {
        Arc::new(Semaphore::new(2))
    }

    #[tokio::test]
    async fn test_linkedin_augmenter_wraps_page_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme-corp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><meta name="description" content="Acme builds rockets."></head>
                   <body>Acme has 1,200 employees</body></html>"#,
            ))
            .mount(&server)
            .await;

        let scraper = LinkedInScraper::new(Client::new(), limiter()).with_base_url(server.uri());
        let prompt = LinkedInAugmenter::new(scraper)
            .augment("Research Acme Corp for SOC2 outreach")
            .await;

        assert!(prompt.starts_with("Analyze this LinkedIn company data:\n\n"));
        assert!(prompt.contains("Acme builds rockets."));
    }

    #[tokio::test]
    async fn test_linkedin_augmenter_reports_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let scraper = LinkedInScraper::new(Client::new(), limiter()).with_base_url(server.uri());
        let prompt = LinkedInAugmenter::new(scraper).augment("Acme").await;

        assert!(prompt.starts_with("Analyze this LinkedIn company data:\n\nData unavailable: "));
        assert!(prompt.contains("LinkedIn blocks scrapers"));
    }

    #[tokio::test]
    async fn test_news_augmenter_uses_company_template() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let news = NewsSearch::new(Client::new(), limiter()).with_search_url(server.uri());
        let prompt = NewsAugmenter::new(news)
            .augment("Research Acme for the CTO")
            .await;

        assert!(prompt.starts_with("Analyze these recent news articles about Acme:\n\n"));
        assert!(prompt.contains("no recent articles were found"));
    }

    #[tokio::test]
    async fn test_website_augmenter_falls_back_when_service_closed() {
        let closed = limiter();
        closed.close();
        let prompt = WebsiteAugmenter::new(WebScraper::new(Client::new(), closed))
            .augment("Research Acme for the CTO")
            .await;

        assert_eq!(
            prompt,
            "Could not retrieve data for: Acme. Service has been shut down"
        );
    }

    #[test]
    fn test_tool_names_and_schemas() {
        use crate::tool::Tool;
        use coldmail_llm::MockBackend;

        let analyzer = Arc::new(
            Agent::builder()
                .with_name("Competitor Analyzer")
                .with_instructions("Analyze")
                .with_model("gpt-4o-mini")
                .build()
                .unwrap(),
        );
        let tool = competitive_tool(analyzer, Gateway::new(Arc::new(MockBackend::failing())));
        assert_eq!(tool.name(), "analyze_competitive_position");
        assert!(tool.description().contains("SOC2 compliance"));
        assert!(tool.definition().is_some());
    }
}
