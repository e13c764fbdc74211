//! Settings for the coldmail pipelines.
//!
//! Everything comes from environment-style key/value pairs:
//! - a `.env` file in the working directory, if present
//! - the process environment
//! - or any injected lookup, which is how tests build settings
//!
//! Required keys are `OPENAI_API_KEY`, `FROM_EMAIL` and `TO_EMAIL`; the rest
//! have defaults (see [`Settings::from_lookup`]).

pub mod error;
pub mod settings;

pub use error::{ConfigError, Result};
pub use settings::{
    DEFAULT_MODEL, DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER, Settings, SmtpSettings,
};
