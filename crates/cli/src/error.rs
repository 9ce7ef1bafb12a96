//! Command errors.

use std::io;

use subkit_billing::{BillingError, ConfigError, StripeError};
use thiserror::Error;

use crate::args::ArgsError;

/// Errors that end a command with a nonzero exit status.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Stripe(#[from] StripeError),

    /// Writing results to standard output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),

    /// Unknown `www` target.
    #[error("Invalid argument: {0}")]
    InvalidTarget(String),

    /// Some `user-del` deletions failed; each was logged.
    #[error("{failed} user(s) could not be deleted")]
    UserDeletion { failed: usize },
}
