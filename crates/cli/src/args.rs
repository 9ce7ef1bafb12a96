//! `key=value` argument tokens.
//!
//! Every subcommand takes free-form tokens: `key=value` pairs (split at the
//! first `=`) and bare positional words. Short aliases are expanded to their
//! canonical key and a later duplicate overwrites an earlier one.

use std::collections::BTreeMap;

use thiserror::Error;

/// Argument errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    /// Required keys absent, in the order they were requested.
    #[error("Missing parameters: {}", .0.join(" "))]
    Missing(Vec<String>),
}

/// Canonical name of an argument key.
#[must_use]
pub fn canonical(key: &str) -> &str {
    match key {
        "e" => "email",
        "p" | "pass" => "password",
        "l" | "lang" => "language",
        "us" => "url_success",
        "uc" => "url_cancel",
        "c" => "customer",
        "t" => "tax_rate",
        "r" => "reference",
        "v" => "verified",
        other => other,
    }
}

/// Parsed tokens.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Args {
    pairs: BTreeMap<String, String>,
    positional: Vec<String>,
}

impl Args {
    /// Parse `tokens`, failing if any key in `required` is absent.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError::Missing` naming every absent required key.
    pub fn parse<S: AsRef<str>>(tokens: &[S], required: &[&str]) -> Result<Self, ArgsError> {
        let mut args = Self::default();
        for token in tokens {
            let token = token.as_ref();
            match token.split_once('=') {
                Some((key, value)) => {
                    args.pairs.insert(canonical(key).to_owned(), value.to_owned());
                }
                None => args.positional.push(token.to_owned()),
            }
        }

        let missing: Vec<String> = required
            .iter()
            .filter(|key| !args.pairs.contains_key(**key))
            .map(|key| (*key).to_owned())
            .collect();
        if !missing.is_empty() {
            return Err(ArgsError::Missing(missing));
        }
        Ok(args)
    }

    /// Value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// Value of a key checked by [`Args::parse`]; empty if absent.
    #[must_use]
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// All `key=value` pairs with canonical keys.
    #[must_use]
    pub const fn pairs(&self) -> &BTreeMap<String, String> {
        &self.pairs
    }

    /// Tokens without `=`, in order.
    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.positional
    }
}
