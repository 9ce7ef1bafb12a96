//! subkit Core - Shared types library.
//!
//! This crate provides common types used across all subkit components:
//! - `billing` - Stripe client, local collaborators and subscription operations
//! - `cli` - The `subkit` command-line tool
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no process
//! spawning, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for Stripe ids, emails, money, languages and
//!   verification statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
