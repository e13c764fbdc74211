//! LinkedIn company page lookup.
//!
//! LinkedIn actively blocks scrapers, so a failure here is the common case.
//! Callers should treat the data as a bonus and keep going without it.

use reqwest::Client;
use scraper::Html;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{ServiceError, ServiceResult};
use crate::html::{acquire, attr_of_first, element_text, fetch_html};

const SERVICE: &str = "LinkedInScraperService";

/// Public company page prefix.
pub const LINKEDIN_COMPANY_BASE: &str = "https://www.linkedin.com/company";

/// What could be read from a company page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedInCompanyData {
    pub company_name: String,
    pub linkedin_url: String,
    pub description: String,
    pub employee_count: String,
    pub industry: String,
    pub location: String,
}

impl LinkedInCompanyData {
    pub fn to_analysis_prompt(&self) -> String {
        let known = |v: &str| !v.is_empty() && v != "Unknown";

        let mut facts = Vec::new();
        if !self.description.is_empty() {
            facts.push(format!("DESCRIPTION: {}", self.description));
        }
        if known(&self.employee_count) {
            facts.push(format!("EMPLOYEE COUNT: {}", self.employee_count));
        }
        if known(&self.industry) {
            facts.push(format!("INDUSTRY: {}", self.industry));
        }
        if known(&self.location) {
            facts.push(format!("LOCATION: {}", self.location));
        }

        [
            format!("LINKEDIN COMPANY: {}", self.company_name),
            format!("URL: {}", self.linkedin_url),
            String::new(),
            facts.join("\n\n"),
        ]
        .join("\n\n")
    }
}

#[derive(Debug, Clone)]
pub struct LinkedInScraper {
    client: Client,
    limiter: Arc<Semaphore>,
    base_url: String,
}

impl LinkedInScraper {
    pub fn new(client: Client, limiter: Arc<Semaphore>) -> Self {
        Self {
            client,
            limiter,
            base_url: LINKEDIN_COMPANY_BASE.to_string(),
        }
    }

    /// Point the scraper at a different company page prefix.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn service_name(&self) -> &'static str {
        SERVICE
    }

    /// Build the company page URL from the name. Never contacts the network.
    pub fn find_linkedin_url(&self, company_name: &str) -> String {
        format!("{}/{}", self.base_url, company_slug(company_name))
    }

    /// Fetch and parse the company page.
    pub async fn scrape_company_page(
        &self,
        company_name: &str,
    ) -> ServiceResult<LinkedInCompanyData> {
        let _permit = acquire(&self.limiter, SERVICE, "scrapeCompanyPage").await?;

        let url = self.find_linkedin_url(company_name);
        tracing::info!(%url, "Fetching LinkedIn page");

        match fetch_html(&self.client, &url).await {
            Ok(html) => Ok(extract_company_data(&html, company_name, &url)),
            Err(e) => {
                tracing::warn!(
                    company = %company_name,
                    error = %e,
                    "LinkedIn scraping failed, LinkedIn blocks most scrapers"
                );
                Err(ServiceError::new(
                    SERVICE,
                    "scrapeCompanyPage",
                    format!(
                        "LinkedIn scraping failed for: {}. LinkedIn blocks scrapers. Use LinkedIn Official API or services like Apify/ScraperAPI.",
                        company_name
                    ),
                )
                .with_cause(e))
            }
        }
    }
}

/// Lowercase, collapse non-alphanumeric runs to `-`, trim dashes.
pub fn company_slug(company_name: &str) -> String {
    let mut slug = String::with_capacity(company_name.len());
    let mut pending_dash = false;
    for c in company_name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn extract_company_data(html: &str, company_name: &str, url: &str) -> LinkedInCompanyData {
    let document = Html::parse_document(html);

    let mut description = attr_of_first(&document, "meta[property=\"og:description\"]", "content");
    if description.is_empty() {
        description = attr_of_first(&document, "meta[name=description]", "content");
    }

    let page_text = element_text(document.root_element());

    LinkedInCompanyData {
        company_name: company_name.to_string(),
        linkedin_url: url.to_string(),
        description,
        employee_count: employee_count(&page_text),
        industry: String::new(),
        location: String::new(),
    }
}

/// First `<digits> employees|followers` word pair in the page text.
fn employee_count(page_text: &str) -> String {
    let words: Vec<&str> = page_text.split_whitespace().collect();
    words
        .windows(2)
        .find(|pair| {
            let unit = pair[1].to_lowercase();
            pair[0].chars().all(|c| c.is_ascii_digit())
                && (unit.contains("employee") || unit.contains("follower"))
        })
        .map(|pair| format!("{} {}", pair[0], pair[1]))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_company_slug() {
        assert_eq!(company_slug("Acme Corp"), "acme-corp");
        assert_eq!(company_slug("  AT&T Inc. "), "at-t-inc");
        assert_eq!(company_slug("--Stripe--"), "stripe");
    }

    #[test]
    fn test_find_linkedin_url() {
        let scraper = LinkedInScraper::new(Client::new(), Arc::new(Semaphore::new(3)));
        assert_eq!(
            scraper.find_linkedin_url("Acme Corp"),
            "https://www.linkedin.com/company/acme-corp"
        );
    }

    #[test]
    fn test_employee_count() {
        assert_eq!(employee_count("Acme has 5000 followers and more"), "5000 followers");
        assert_eq!(employee_count("about 1,200 employees"), "");
        assert_eq!(employee_count("no numbers"), "");
    }

    #[test]
    fn test_analysis_prompt_skips_unknown() {
        let data = LinkedInCompanyData {
            company_name: "Acme".to_string(),
            linkedin_url: "https://www.linkedin.com/company/acme".to_string(),
            description: "Audit tooling".to_string(),
            employee_count: "Unknown".to_string(),
            industry: "Software".to_string(),
            location: String::new(),
        };
        assert_eq!(
            data.to_analysis_prompt(),
            "LINKEDIN COMPANY: Acme\n\nURL: https://www.linkedin.com/company/acme\n\n\n\n\
             DESCRIPTION: Audit tooling\n\nINDUSTRY: Software"
        );
    }

    #[tokio::test]
    async fn test_scrape_company_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/company/acme-corp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><meta name="description" content="Acme on LinkedIn"></head>
                   <body><p>Acme Corp 250 employees worldwide</p></body></html>"#,
            ))
            .mount(&server)
            .await;

        let scraper = LinkedInScraper::new(Client::new(), Arc::new(Semaphore::new(3)))
            .with_base_url(format!("{}/company/", server.uri()));
        let data = scraper.scrape_company_page("Acme Corp").await.unwrap();

        assert_eq!(data.description, "Acme on LinkedIn");
        assert_eq!(data.employee_count, "250 employees");
        assert!(data.linkedin_url.ends_with("/company/acme-corp"));
    }

    #[tokio::test]
    async fn test_blocked_page_carries_advice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(999))
            .mount(&server)
            .await;

        let scraper = LinkedInScraper::new(Client::new(), Arc::new(Semaphore::new(3)))
            .with_base_url(server.uri());
        let err = scraper.scrape_company_page("Acme").await.unwrap_err();

        assert!(err.user_message().starts_with("LinkedIn scraping failed for: Acme."));
        assert!(err.user_message().contains("Apify/ScraperAPI"));
        assert_eq!(err.cause.as_deref(), Some("Unexpected HTTP status 999"));
    }
}
