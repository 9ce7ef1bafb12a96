//! Stripe resource types.
//!
//! Only the fields this tool reads are typed. [`Customer`] additionally keeps
//! every other field it was sent so `user-get-json` can dump the resource as
//! Stripe returned it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use subkit_core::{
    CheckoutSessionId, CustomerId, Language, Money, PriceId, ProductId, SubscriptionId, TaxIdId,
    TaxRateId, VerificationStatus,
};

/// Metadata key holding the password hash.
pub const HASH_METADATA_KEY: &str = "hash1";
/// Metadata key holding the one-time email validation code.
pub const ECODE_METADATA_KEY: &str = "ecode";

/// A list envelope (`{"object": "list", "data": [...]}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
        }
    }
}

/// A field that is either an object id or, when expanded, the object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T: StripeObject> Expandable<T> {
    /// The referenced object's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(object) => object.object_id(),
        }
    }

    /// The expanded object, if it was expanded.
    #[must_use]
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Object(object) => Some(object),
        }
    }
}

/// Objects that carry a Stripe id.
pub trait StripeObject {
    fn object_id(&self) -> &str;
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub country: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
}

/// A customer tax identifier (`es_cif`, `eu_vat`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxId {
    pub id: TaxIdId,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// A Stripe customer, the "user" of this tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub preferred_locales: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_ids: Option<List<TaxId>>,
    /// Remaining fields, kept verbatim.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl Customer {
    /// Email verification status from metadata.
    #[must_use]
    pub fn status(&self) -> VerificationStatus {
        VerificationStatus::from_metadata(self.metadata_value(VerificationStatus::METADATA_KEY))
    }

    /// First preferred locale, or `auto`.
    #[must_use]
    pub fn language(&self) -> &str {
        self.preferred_locales
            .as_deref()
            .and_then(<[String]>::first)
            .map_or(Language::AUTO, String::as_str)
    }

    /// Stored password hash.
    #[must_use]
    pub fn hash1(&self) -> Option<&str> {
        self.metadata_value(HASH_METADATA_KEY)
    }

    /// Stored validation code.
    #[must_use]
    pub fn ecode(&self) -> Option<&str> {
        self.metadata_value(ECODE_METADATA_KEY)
    }

    /// Email address or the empty string.
    #[must_use]
    pub fn email_str(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// Tax ids, when they were expanded.
    #[must_use]
    pub fn tax_id_list(&self) -> &[TaxId] {
        self.tax_ids
            .as_ref()
            .map(|list| list.data.as_slice())
            .unwrap_or_default()
    }

    fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

impl StripeObject for Customer {
    fn object_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Recurring billing interval of a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurring {
    pub interval: String,
    pub interval_count: u32,
}

/// A catalog price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub recurring: Option<Recurring>,
    #[serde(default)]
    pub product: Option<Expandable<Product>>,
}

impl Price {
    /// Unit amount with its currency, when the price has a fixed amount.
    #[must_use]
    pub fn money(&self) -> Option<Money> {
        self.unit_amount
            .map(|cents| Money::new(cents, self.currency.clone()))
    }
}

impl StripeObject for Price {
    fn object_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A catalog product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub default_price: Option<Expandable<Price>>,
}

impl Product {
    /// Id of the product's default price.
    #[must_use]
    pub fn default_price_id(&self) -> Option<PriceId> {
        self.default_price
            .as_ref()
            .map(|price| PriceId::from(price.id()))
    }
}

impl StripeObject for Product {
    fn object_id(&self) -> &str {
        self.id.as_str()
    }
}

/// A tax rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: TaxRateId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub active: bool,
}

/// One price line of a subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionItem {
    pub id: String,
    #[serde(default)]
    pub price: Option<Price>,
}

/// A customer subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub items: List<SubscriptionItem>,
}

/// A checkout session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: CheckoutSessionId,
    #[serde(default)]
    pub url: Option<String>,
}

/// Response of a delete call.
#[derive(Debug, Clone, Deserialize)]
pub struct Deleted {
    #[serde(default)]
    pub deleted: bool,
}
