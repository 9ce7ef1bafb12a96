//! Collaborators backed by local system tools.
//!
//! Each concern sits behind a small object-safe trait so operations can be
//! exercised with doubles:
//!
//! - [`PasswordHasher`] / [`PasswordStrengthChecker`] - `openssl`, `cracklib-check`
//! - [`MailSender`] - the configured sendmail pipeline
//! - [`LinkOpener`] - `xdg-open`

mod browser;
mod mail;
mod password;
mod process;

pub use browser::{LinkOpener, OpenError, XdgOpen};
pub use mail::{CommandMailer, MailError, MailSender, compose_validation_mail, validation_url};
pub use password::{
    CracklibChecker, HASH_SALT, OpensslHasher, PasswordError, PasswordHasher,
    PasswordStrengthChecker, hashes_match,
};
