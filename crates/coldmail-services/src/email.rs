//! Email delivery behind the [`EmailTransport`] trait.

use async_trait::async_trait;
use coldmail_config::{Settings, SmtpSettings};
use parking_lot::Mutex;
use rustls::ClientConfig;
use serde::Serialize;
use std::sync::Arc;

use crate::smtp::{self, Mail, SmtpError};

/// Outcome of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Success,
    Error,
}

/// Status/message pair reported by every transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub status: SendStatus,
    pub message: String,
}

impl SendReport {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: SendStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SendStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SendStatus::Success
    }
}

/// Something that can deliver the final email.
///
/// Sending never fails at the type level: delivery problems come back as an
/// error [`SendReport`] so the pipeline can surface them in its result.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, body: &str, subject: &str, is_html: bool) -> SendReport;

    fn name(&self) -> &str;

    async fn send_text(&self, body: &str, subject: &str) -> SendReport {
        self.send(body, subject, false).await
    }

    async fn send_html(&self, body: &str, subject: &str) -> SendReport {
        self.send(body, subject, true).await
    }

    /// Send a fixed message to check the configuration end to end.
    async fn send_test(&self) -> SendReport {
        self.send_text(
            "This is a test email from the Cold Sales Agent System.",
            "Test Email - Cold Sales Agent",
        )
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SMTP
// ─────────────────────────────────────────────────────────────────────────────

/// Sends through an SMTP relay configured from [`Settings`].
pub struct SmtpTransport {
    smtp: SmtpSettings,
    from: String,
    to: String,
    tls: Arc<ClientConfig>,
}

impl SmtpTransport {
    pub fn from_settings(settings: &Settings) -> Result<Self, SmtpError> {
        let tls = smtp::tls_client_config(settings.ssl_cert_file.as_deref())?;
        Ok(Self {
            smtp: settings.smtp.clone(),
            from: settings.from_email.clone(),
            to: settings.to_email.clone(),
            tls,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send(&self, body: &str, subject: &str, is_html: bool) -> SendReport {
        let mail = Mail {
            from: &self.from,
            to: &self.to,
            subject,
            body,
            is_html,
        };

        tracing::info!(
            server = %self.smtp.server,
            port = self.smtp.port,
            to = %self.to,
            is_html,
            "Sending email"
        );

        match smtp::send(&self.smtp, self.tls.clone(), &mail).await {
            Ok(()) => {
                let prefix = if is_html { "HTML " } else { "" };
                SendReport::success(format!("{prefix}Email sent successfully via SMTP"))
            }
            Err(e) => {
                tracing::error!(error = %e, "SMTP delivery failed");
                SendReport::error(format!("SMTP error: {e}"))
            }
        }
    }

    fn name(&self) -> &str {
        "EmailService(smtp)"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dry run
// ─────────────────────────────────────────────────────────────────────────────

/// A message captured by [`DryRunTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEmail {
    pub body: String,
    pub subject: String,
    pub is_html: bool,
}

/// Logs and records messages instead of delivering them.
#[derive(Debug, Default)]
pub struct DryRunTransport {
    sent: Mutex<Vec<CapturedEmail>>,
}

impl DryRunTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything "sent" so far, oldest first.
    pub fn sent(&self) -> Vec<CapturedEmail> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl EmailTransport for DryRunTransport {
    async fn send(&self, body: &str, subject: &str, is_html: bool) -> SendReport {
        tracing::info!(%subject, is_html, chars = body.chars().count(), "Dry run: email not sent");
        self.sent.lock().push(CapturedEmail {
            body: body.to_string(),
            subject: subject.to_string(),
            is_html,
        });
        let prefix = if is_html { "HTML " } else { "" };
        SendReport::success(format!("{prefix}Email captured (dry run, not sent)"))
    }

    fn name(&self) -> &str {
        "EmailService(dry-run)"
    }
}
