//! Money amounts as Stripe reports them.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount in the currency's smallest unit plus its ISO 4217 code.
///
/// Stripe reports prices as integer minor units (`unit_amount: 999`) with a
/// lowercase currency (`"eur"`). Displayed as `9.99eur`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (cents).
    pub cents: i64,
    /// Lowercase ISO 4217 currency code.
    pub currency: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub fn new(cents: i64, currency: impl Into<String>) -> Self {
        Self {
            cents,
            currency: currency.into(),
        }
    }

    /// The amount in major units.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.cents, 2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount(), self.currency)
    }
}
