//! subkit billing library.
//!
//! Customer accounts, catalog lookups and subscription checkout on top of the
//! Stripe REST API.
//!
//! # Architecture
//!
//! - [`stripe`] - Hand-written Stripe client behind the [`PaymentApi`] trait
//! - [`local`] - Password, mail and browser collaborators backed by system tools
//! - [`Billing`] - The operations, generic over the payment API and holding
//!   the collaborators and the immutable [`BillingConfig`]
//!
//! Remote listings are lazy [`futures::Stream`]s (see [`listing`]).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod listing;
pub mod local;
pub mod stripe;
pub mod subscribe;
pub mod users;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{BillingConfig, ConfigError, MailConfig, Mode};
pub use error::BillingError;
pub use stripe::{PaymentApi, StripeClient, StripeError};
pub use subscribe::{CheckoutItem, CheckoutRequest, CustomerRef};
pub use users::{NewUser, UserChanges};

use local::{
    CommandMailer, CracklibChecker, LinkOpener, MailSender, OpensslHasher, PasswordHasher,
    PasswordStrengthChecker, XdgOpen,
};

/// Billing operations over a payment API.
pub struct Billing<A> {
    api: A,
    config: BillingConfig,
    hasher: Box<dyn PasswordHasher>,
    checker: Box<dyn PasswordStrengthChecker>,
    mailer: Box<dyn MailSender>,
    opener: Box<dyn LinkOpener>,
}

impl Billing<StripeClient> {
    /// Connect to Stripe with the system collaborators.
    ///
    /// # Errors
    ///
    /// Returns `StripeError` if the HTTP client cannot be built.
    pub fn connect(config: BillingConfig) -> Result<Self, StripeError> {
        let api = StripeClient::new(&config)?;
        Ok(Self::new(api, config))
    }
}

impl<A: PaymentApi> Billing<A> {
    /// Create the operations with the system collaborators: `openssl`,
    /// `cracklib-check`, the configured sendmail pipeline and `xdg-open`.
    #[must_use]
    pub fn new(api: A, config: BillingConfig) -> Self {
        let mailer = CommandMailer::new(config.mail.sendmail_command.clone());
        Self {
            api,
            config,
            hasher: Box::new(OpensslHasher),
            checker: Box::new(CracklibChecker),
            mailer: Box::new(mailer),
            opener: Box::new(XdgOpen),
        }
    }

    /// Replace the password hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: impl PasswordHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    /// Replace the password strength checker.
    #[must_use]
    pub fn with_strength_checker(mut self, checker: impl PasswordStrengthChecker + 'static) -> Self {
        self.checker = Box::new(checker);
        self
    }

    /// Replace the mail sender.
    #[must_use]
    pub fn with_mailer(mut self, mailer: impl MailSender + 'static) -> Self {
        self.mailer = Box::new(mailer);
        self
    }

    /// Replace the link opener.
    #[must_use]
    pub fn with_opener(mut self, opener: impl LinkOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    /// The payment API.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The configuration.
    pub const fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Hash a password the way it is stored.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Password` if the hasher fails.
    pub fn hash_password(&self, password: &str) -> Result<String, BillingError> {
        Ok(self.hasher.hash(password.trim())?)
    }

    /// Open a link in the operator's browser.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::Open` if the opener fails.
    pub fn open_link(&self, url: &str) -> Result<(), BillingError> {
        Ok(self.opener.open(url)?)
    }
}

impl<A> std::fmt::Debug for Billing<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Billing")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
