//! Typed error carried by every service operation.

use chrono::{DateTime, Utc};
use std::fmt;

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// A failure inside a deterministic service, tagged with where it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    /// Service that failed (e.g. `WebScraperService`).
    pub service: String,
    /// Operation within the service (e.g. `fetchWebsite`).
    pub operation: String,
    /// Human-readable message. May be empty.
    pub message: String,
    /// Underlying cause, rendered.
    pub cause: Option<String>,
    /// When the error was created.
    pub timestamp: DateTime<Utc>,
}

impl ServiceError {
    /// Create an error with no underlying cause.
    pub fn new(
        service: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            message: message.into(),
            cause: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    /// One-line rendering for logs: `[service] operation: message (cause: ...)`.
    pub fn format(&self) -> String {
        let mut out = format!("[{}] {}", self.service, self.operation);
        if !self.message.trim().is_empty() {
            out.push_str(": ");
            out.push_str(&self.message);
        }
        if let Some(cause) = &self.cause {
            out.push_str(&format!(" (cause: {})", cause));
        }
        out
    }

    /// Message suitable for showing to a user or feeding to a model.
    pub fn user_message(&self) -> String {
        if self.message.trim().is_empty() {
            format!("{} operation failed in {}", self.operation, self.service)
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::error::Error for ServiceError {}
