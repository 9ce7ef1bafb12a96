//! Subcommand implementations.
//!
//! Each command parses its own tokens, runs against a [`Billing`] and writes
//! its results to the given writer. Logs never go to that writer.
//!
//! [`Billing`]: subkit_billing::Billing

pub mod account;
pub mod catalog;
pub mod checkout;
pub mod users;
pub mod www;
