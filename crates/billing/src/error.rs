//! Billing operation errors.

use subkit_core::{CustomerId, EmailError, ProductId};
use thiserror::Error;

use crate::local::{MailError, OpenError, PasswordError};
use crate::stripe::StripeError;

/// Errors that can occur during billing operations.
///
/// The messages are shown to the operator as-is.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Stripe API call failed.
    #[error(transparent)]
    Stripe(#[from] StripeError),

    /// Password hashing or strength check failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Validation mail could not be built or sent.
    #[error(transparent)]
    Mail(#[from] MailError),

    /// Link could not be opened.
    #[error(transparent)]
    Open(#[from] OpenError),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No customer is registered with the email.
    #[error("user not found")]
    UserNotFound,

    /// A verified customer already uses the email.
    #[error("the user already exists")]
    UserExists,

    /// An unverified customer already uses the email.
    #[error("email address not verified")]
    EmailNotVerified,

    /// The customer has no stored password hash.
    #[error("the user has no password")]
    MissingPasswordHash,

    /// Password hash mismatch.
    #[error("invalid password")]
    InvalidPassword,

    /// No validation code is pending for the customer.
    #[error("invalid verification code: none pending")]
    MissingValidationCode,

    /// Validation code mismatch.
    #[error("invalid verification code")]
    InvalidValidationCode,

    /// A required argument is absent.
    #[error("missing {0}")]
    MissingParameter(&'static str),

    /// Neither a customer id nor an email was given.
    #[error("missing email/customer")]
    MissingCustomer,

    /// No `@PRODUCT=QTY` entries were given.
    #[error("missing product list")]
    MissingProducts,

    /// A line item names no tax rate and none is configured.
    #[error("tax rate not specified")]
    MissingDefaultTaxRate,

    /// A line item quantity is not a positive integer.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// The product has no default price to subscribe to.
    #[error("product {0} has no default price")]
    NoDefaultPrice(ProductId),

    /// The customer has no email to send to.
    #[error("customer {0} has no email address")]
    MissingEmail(CustomerId),
}
