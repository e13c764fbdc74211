//! Deterministic (non-LLM) collaborators used by coldmail's research tools
//! and email pipeline.
//!
//! - [`WebScraper`], [`LinkedInScraper`] and [`NewsSearch`] gather public data
//!   about a prospect company. Each returns a [`ServiceResult`].
//! - [`EmailTransport`] delivers the final email; [`SmtpTransport`] speaks
//!   SMTP directly, [`DryRunTransport`] only records.
//! - [`ServicesRegistry`] builds all of the above over one pooled HTTP client
//!   and per-service concurrency limiters, and owns their shutdown.

pub mod email;
pub mod error;
pub mod html;
pub mod linkedin;
pub mod news;
pub mod registry;
pub mod smtp;
pub mod web;

pub use email::{
    CapturedEmail, DryRunTransport, EmailTransport, SendReport, SendStatus, SmtpTransport,
};
pub use error::{ServiceError, ServiceResult};
pub use linkedin::{LinkedInCompanyData, LinkedInScraper};
pub use news::{NewsArticle, NewsSearch};
pub use registry::{ServicesRegistry, ServicesRegistryBuilder};
pub use smtp::SmtpError;
pub use web::{WebScraper, WebsiteContent};
