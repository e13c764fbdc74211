//! Shared construction and lifecycle for the deterministic services.

use coldmail_config::Settings;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::email::{EmailTransport, SmtpTransport};
use crate::error::{ServiceError, ServiceResult};
use crate::linkedin::LinkedInScraper;
use crate::news::NewsSearch;
use crate::web::WebScraper;

const SERVICE: &str = "ServicesRegistry";

/// Concurrent website fetches allowed by an owned limiter.
pub const WEB_PERMITS: usize = 5;
/// Concurrent LinkedIn fetches allowed by an owned limiter.
pub const LINKEDIN_PERMITS: usize = 3;
/// Concurrent news searches allowed by an owned limiter.
pub const NEWS_PERMITS: usize = 3;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Owns (or borrows) the HTTP client, the per-service concurrency limiters
/// and the services built on them.
///
/// Resources passed in through the builder belong to the caller and are left
/// untouched by [`shutdown`](Self::shutdown).
pub struct ServicesRegistry {
    email: Arc<dyn EmailTransport>,
    web: WebScraper,
    linkedin: LinkedInScraper,
    news: NewsSearch,

    web_limiter: Arc<Semaphore>,
    linkedin_limiter: Arc<Semaphore>,
    news_limiter: Arc<Semaphore>,
    http_client: Client,

    owns_web_limiter: bool,
    owns_linkedin_limiter: bool,
    owns_news_limiter: bool,
    owns_http_client: bool,

    shut_down: AtomicBool,
}

impl std::fmt::Debug for ServicesRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicesRegistry")
            .field("email", &self.email.name())
            .field("owns_web_limiter", &self.owns_web_limiter)
            .field("owns_linkedin_limiter", &self.owns_linkedin_limiter)
            .field("owns_news_limiter", &self.owns_news_limiter)
            .field("owns_http_client", &self.owns_http_client)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl ServicesRegistry {
    pub fn builder() -> ServicesRegistryBuilder {
        ServicesRegistryBuilder::default()
    }

    /// Registry with every resource owned and SMTP delivery from `settings`.
    pub fn from_settings(settings: Settings) -> ServiceResult<Self> {
        Self::builder().settings(settings).build()
    }

    pub fn email(&self) -> &Arc<dyn EmailTransport> {
        &self.email
    }

    pub fn web_scraper(&self) -> &WebScraper {
        &self.web
    }

    pub fn linkedin_scraper(&self) -> &LinkedInScraper {
        &self.linkedin
    }

    pub fn news_search(&self) -> &NewsSearch {
        &self.news
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Release owned resources. Safe to call more than once; also runs on drop.
    ///
    /// Closing a limiter makes every later call on its service fail with
    /// "Service has been shut down". Calls already holding a permit finish.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Shutting down ServicesRegistry");

        for (name, limiter, owned) in [
            ("web", &self.web_limiter, self.owns_web_limiter),
            ("linkedin", &self.linkedin_limiter, self.owns_linkedin_limiter),
            ("news", &self.news_limiter, self.owns_news_limiter),
        ] {
            if owned {
                limiter.close();
                tracing::debug!(limiter = name, "Closed concurrency limiter");
            }
        }

        if self.owns_http_client {
            // Pooled connections close when the last client clone drops.
            tracing::debug!("Releasing HTTP client connection pool");
        }

        tracing::info!("ServicesRegistry shutdown complete");
    }
}

impl Drop for ServicesRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ServicesRegistryBuilder {
    settings: Option<Settings>,
    email: Option<Arc<dyn EmailTransport>>,
    web: Option<WebScraper>,
    linkedin: Option<LinkedInScraper>,
    news: Option<NewsSearch>,
    web_limiter: Option<Arc<Semaphore>>,
    linkedin_limiter: Option<Arc<Semaphore>>,
    news_limiter: Option<Arc<Semaphore>>,
    http_client: Option<Client>,
}

impl ServicesRegistryBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn email_transport(mut self, transport: Arc<dyn EmailTransport>) -> Self {
        self.email = Some(transport);
        self
    }

    pub fn web_scraper(mut self, scraper: WebScraper) -> Self {
        self.web = Some(scraper);
        self
    }

    pub fn linkedin_scraper(mut self, scraper: LinkedInScraper) -> Self {
        self.linkedin = Some(scraper);
        self
    }

    pub fn news_search(mut self, news: NewsSearch) -> Self {
        self.news = Some(news);
        self
    }

    pub fn web_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.web_limiter = Some(limiter);
        self
    }

    pub fn linkedin_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.linkedin_limiter = Some(limiter);
        self
    }

    pub fn news_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.news_limiter = Some(limiter);
        self
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> ServiceResult<ServicesRegistry> {
        tracing::info!("Initializing ServicesRegistry");

        let owns_web_limiter = self.web_limiter.is_none();
        let owns_linkedin_limiter = self.linkedin_limiter.is_none();
        let owns_news_limiter = self.news_limiter.is_none();
        let owns_http_client = self.http_client.is_none();

        let web_limiter = self
            .web_limiter
            .unwrap_or_else(|| Arc::new(Semaphore::new(WEB_PERMITS)));
        let linkedin_limiter = self
            .linkedin_limiter
            .unwrap_or_else(|| Arc::new(Semaphore::new(LINKEDIN_PERMITS)));
        let news_limiter = self
            .news_limiter
            .unwrap_or_else(|| Arc::new(Semaphore::new(NEWS_PERMITS)));

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                tracing::debug!("Creating shared HTTP client with connection pooling");
                Client::builder()
                    .timeout(HTTP_TIMEOUT)
                    .pool_idle_timeout(POOL_IDLE_TIMEOUT)
                    .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
                    .build()
                    .map_err(|e| {
                        ServiceError::new(SERVICE, "build", "Failed to create HTTP client")
                            .with_cause(e)
                    })?
            }
        };

        let email: Arc<dyn EmailTransport> = match (self.email, &self.settings) {
            (Some(transport), _) => transport,
            (None, Some(settings)) => Arc::new(SmtpTransport::from_settings(settings).map_err(
                |e| ServiceError::new(SERVICE, "build", "Failed to configure SMTP").with_cause(e),
            )?),
            (None, None) => {
                return Err(ServiceError::new(
                    SERVICE,
                    "build",
                    "Settings must be provided when no email transport is supplied",
                ));
            }
        };

        let web = self
            .web
            .unwrap_or_else(|| WebScraper::new(http_client.clone(), web_limiter.clone()));
        let linkedin = self
            .linkedin
            .unwrap_or_else(|| LinkedInScraper::new(http_client.clone(), linkedin_limiter.clone()));
        let news = self
            .news
            .unwrap_or_else(|| NewsSearch::new(http_client.clone(), news_limiter.clone()));

        tracing::info!(email = %email.name(), "ServicesRegistry initialized");

        Ok(ServicesRegistry {
            email,
            web,
            linkedin,
            news,
            web_limiter,
            linkedin_limiter,
            news_limiter,
            http_client,
            owns_web_limiter,
            owns_linkedin_limiter,
            owns_news_limiter,
            owns_http_client,
            shut_down: AtomicBool::new(false),
        })
    }
}
