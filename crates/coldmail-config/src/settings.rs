//! Application settings read from environment-style key/value pairs.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConfigError, Result};

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default SMTP relay.
pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";

/// Default SMTP submission port.
pub const DEFAULT_SMTP_PORT: u16 = 587;

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// SMTP connection settings.
#[derive(Clone, Serialize)]
pub struct SmtpSettings {
    /// Relay host name.
    pub server: String,
    /// Relay port. 465 means implicit TLS, anything else STARTTLS.
    pub port: u16,
    /// Login user name.
    pub username: String,
    /// Login password (app password for Gmail). May be empty.
    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

/// Fully resolved application settings.
#[derive(Clone, Serialize)]
pub struct Settings {
    /// Provider API key.
    #[serde(skip_serializing)]
    pub openai_api_key: String,
    /// Override for the provider base URL (OpenAI-compatible services).
    pub openai_base_url: Option<String>,
    /// Model used by every agent.
    pub model: String,
    /// Sender address.
    pub from_email: String,
    /// Recipient address.
    pub to_email: String,
    /// SMTP transport settings.
    pub smtp: SmtpSettings,
    /// Alternate provider keys. Accepted, not used by the pipelines.
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub deepseek_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub groq_api_key: Option<String>,
    /// Extra CA bundle for the SMTP TLS handshake.
    pub ssl_cert_file: Option<PathBuf>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("from_email", &self.from_email)
            .field("to_email", &self.to_email)
            .field("smtp", &self.smtp)
            .field("ssl_cert_file", &self.ssl_cert_file)
            .finish_non_exhaustive()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl Settings {
    /// Load settings from the process environment, after applying a `.env`
    /// file from the working directory if one exists.
    pub fn load() -> Result<Self> {
        tracing::info!("Loading configuration");
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Applied .env file"),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => return Err(e.into()),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from a specific env file; keys missing from the file are
    /// looked up in the process environment. The process environment is not
    /// modified.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut values = HashMap::new();
        for item in dotenvy::from_path_iter(path.as_ref())? {
            let (key, value) = item?;
            values.insert(key, value);
        }
        Self::from_lookup(|key| values.get(key).cloned().or_else(|| std::env::var(key).ok()))
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key).and_then(|v| {
                let trimmed = v.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));

        let openai_api_key = require("OPENAI_API_KEY")?;
        let from_email = require("FROM_EMAIL")?;
        let to_email = require("TO_EMAIL")?;

        let port = match get("SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                key: "SMTP_PORT".to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let password = get("SMTP_PASSWORD").unwrap_or_default();
        if password.is_empty() {
            tracing::warn!("SMTP_PASSWORD not set. Gmail requires an app password.");
        }

        let smtp = SmtpSettings {
            server: get("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            port,
            username: get("SMTP_USERNAME").unwrap_or_else(|| from_email.clone()),
            password,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            from_email,
            to_email,
            smtp,
            google_api_key: get("GOOGLE_API_KEY"),
            deepseek_api_key: get("DEEPSEEK_API_KEY"),
            groq_api_key: get("GROQ_API_KEY"),
            ssl_cert_file: get("SSL_CERT_FILE").map(PathBuf::from),
        })
    }
}
