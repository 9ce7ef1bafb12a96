//! Billing configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Mode selection
//! - `RELEASE_MODE` - Any non-empty value selects live mode; otherwise the
//!   `*_TEST_*` variables are read
//!
//! ## Required
//! - `STRIPE_SECRET_KEY` / `STRIPE_TEST_SECRET_KEY` - Stripe secret API key
//!
//! ## Optional
//! - `STRIPE_DEFAULT_TAXID` / `STRIPE_TEST_DEFAULT_TAXID` - Tax rate applied to
//!   checkout line items that do not name one
//! - `STRIPE_MASTER_PASSWORD_HASH1` - Password hash accepted for every account
//! - `STRIPE_API_BASE` - API base URL (default: `https://api.stripe.com/v1`)
//! - `SENDMAIL_COMMAND` - Shell pipeline reading an RFC 822 message on stdin
//!   (default: `msmtp -t`)
//! - `MAIL_FROM` - Sender of validation mails (default: `noreply@localhost`)
//! - `VALIDATION_MAIL_SUBJECT` - Subject of validation mails
//! - `VALIDATION_URL` - Page the validation link points to
//!   (default: `https://efferox.com/wellcome`)

use secrecy::{ExposeSecret, SecretString};
use subkit_core::TaxRateId;
use thiserror::Error;

/// Default Stripe REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";
/// Default mail submission pipeline.
pub const DEFAULT_SENDMAIL_COMMAND: &str = "msmtp -t";
const DEFAULT_MAIL_FROM: &str = "noreply@localhost";
const DEFAULT_MAIL_SUBJECT: &str = "Confirm your email address";
const DEFAULT_VALIDATION_URL: &str = "https://efferox.com/wellcome";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please set {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which Stripe account keys are in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Live keys (`RELEASE_MODE` set).
    Live,
    /// Test keys.
    Test,
}

impl Mode {
    /// Whether this is live mode.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    const fn secret_key_var(self) -> &'static str {
        match self {
            Self::Live => "STRIPE_SECRET_KEY",
            Self::Test => "STRIPE_TEST_SECRET_KEY",
        }
    }

    const fn default_tax_var(self) -> &'static str {
        match self {
            Self::Live => "STRIPE_DEFAULT_TAXID",
            Self::Test => "STRIPE_TEST_DEFAULT_TAXID",
        }
    }
}

/// Validation mail settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Shell pipeline that submits the message.
    pub sendmail_command: String,
    /// `From` mailbox.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Base URL of the validation link.
    pub validation_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sendmail_command: DEFAULT_SENDMAIL_COMMAND.to_owned(),
            from: DEFAULT_MAIL_FROM.to_owned(),
            subject: DEFAULT_MAIL_SUBJECT.to_owned(),
            validation_url: DEFAULT_VALIDATION_URL.to_owned(),
        }
    }
}

/// Process-wide billing configuration.
///
/// Built once at startup and passed by reference to every operation.
/// Implements `Debug` manually to redact the secret key and master hash.
#[derive(Clone)]
pub struct BillingConfig {
    /// Live or test account.
    pub mode: Mode,
    /// Stripe secret API key.
    pub secret_key: SecretString,
    /// Stripe REST endpoint.
    pub api_base: String,
    /// Tax rate used for line items without an explicit one.
    pub default_tax_rate: Option<TaxRateId>,
    /// Password hash that authenticates any account.
    pub master_password_hash: Option<SecretString>,
    /// Validation mail settings.
    pub mail: MailConfig,
}

impl std::fmt::Debug for BillingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingConfig")
            .field("mode", &self.mode)
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("default_tax_rate", &self.default_tax_rate)
            .field(
                "master_password_hash",
                &self.master_password_hash.as_ref().map(|_| "[REDACTED]"),
            )
            .field("mail", &self.mail)
            .finish()
    }
}

impl BillingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret key for the selected mode is
    /// missing or a URL variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`BillingConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mode = if get("RELEASE_MODE").is_some() {
            Mode::Live
        } else {
            Mode::Test
        };

        let key_var = mode.secret_key_var();
        let secret_key = get(key_var)
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_owned()))?;

        let api_base = get("STRIPE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_owned());
        validate_url("STRIPE_API_BASE", &api_base)?;

        let defaults = MailConfig::default();
        let mail = MailConfig {
            sendmail_command: get("SENDMAIL_COMMAND").unwrap_or(defaults.sendmail_command),
            from: get("MAIL_FROM").unwrap_or(defaults.from),
            subject: get("VALIDATION_MAIL_SUBJECT").unwrap_or(defaults.subject),
            validation_url: get("VALIDATION_URL").unwrap_or(defaults.validation_url),
        };
        validate_url("VALIDATION_URL", &mail.validation_url)?;

        Ok(Self {
            mode,
            secret_key,
            api_base: api_base.trim_end_matches('/').to_owned(),
            default_tax_rate: get(mode.default_tax_var()).map(TaxRateId::from),
            // A one-character hash is treated as unset.
            master_password_hash: get("STRIPE_MASTER_PASSWORD_HASH1")
                .filter(|hash| hash.len() > 1)
                .map(SecretString::from),
            mail,
        })
    }

    /// Whether `hash` equals the configured master password hash.
    #[must_use]
    pub fn is_master_hash(&self, hash: &str) -> bool {
        self.master_password_hash
            .as_ref()
            .is_some_and(|master| crate::local::hashes_match(master.expose_secret(), hash))
    }
}

fn validate_url(var: &str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_owned(), e.to_string()))
}
