//! Core types for subkit.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod locale;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use locale::Language;
pub use price::Money;
pub use status::VerificationStatus;
