//! Request parameters and their form encoding.
//!
//! Stripe takes `application/x-www-form-urlencoded` bodies and query strings
//! with bracket notation for nested values: `metadata[hash1]=...`,
//! `expand[]=data.tax_ids`, `line_items[0][tax_rates][0]=txr_...`.

use std::collections::BTreeMap;

use subkit_core::{CustomerId, PriceId, TaxRateId};

/// Fixed page size for list calls.
pub const PAGE_SIZE: u32 = 100;

/// Ordered `key=value` pairs, encoded by reqwest as a form or query string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Form(Vec<(String, String)>);

impl Form {
    /// An empty form.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Append a pair when the value is present.
    pub fn push_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// The encoded pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the form is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Filters for listing customers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerQuery {
    pub email: Option<String>,
    pub limit: u32,
    pub expand: Vec<&'static str>,
}

impl CustomerQuery {
    /// Every customer, one page.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            email: None,
            limit: PAGE_SIZE,
            expand: Vec::new(),
        }
    }

    /// The first customer registered with `email`.
    #[must_use]
    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(email.to_owned()),
            limit: 1,
            expand: Vec::new(),
        }
    }

    /// Also expand subscriptions and tax ids.
    #[must_use]
    pub fn expanded(mut self) -> Self {
        self.expand = vec!["data.subscriptions", "data.tax_ids"];
        self
    }

    /// Encode as query pairs.
    #[must_use]
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        form.push("limit", self.limit.to_string());
        form.push_opt("email", self.email.as_deref());
        for field in &self.expand {
            form.push("expand[]", *field);
        }
        form
    }
}

/// Address fields to set on a customer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddressParams {
    pub city: Option<String>,
    pub country: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
}

impl AddressParams {
    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.country.is_none()
            && self.line1.is_none()
            && self.line2.is_none()
            && self.postal_code.is_none()
            && self.state.is_none()
    }
}

/// Fields for creating or updating a customer. Unset fields are left alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CustomerParams {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub preferred_locales: Option<Vec<String>>,
    pub address: AddressParams,
    pub metadata: BTreeMap<String, String>,
}

impl CustomerParams {
    /// Set a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Encode as form pairs.
    #[must_use]
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        form.push_opt("email", self.email.as_deref());
        form.push_opt("name", self.name.as_deref());
        form.push_opt("phone", self.phone.as_deref());
        form.push_opt("description", self.description.as_deref());
        if let Some(locales) = &self.preferred_locales {
            for (i, locale) in locales.iter().enumerate() {
                form.push(format!("preferred_locales[{i}]"), locale.as_str());
            }
        }
        let address = &self.address;
        form.push_opt("address[city]", address.city.as_deref());
        form.push_opt("address[country]", address.country.as_deref());
        form.push_opt("address[line1]", address.line1.as_deref());
        form.push_opt("address[line2]", address.line2.as_deref());
        form.push_opt("address[postal_code]", address.postal_code.as_deref());
        form.push_opt("address[state]", address.state.as_deref());
        for (key, value) in &self.metadata {
            form.push(format!("metadata[{key}]"), value.as_str());
        }
        form
    }
}

/// A customer tax identifier to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxIdParams {
    pub kind: String,
    pub value: String,
}

impl TaxIdParams {
    /// Spanish company identifier (`es_cif`).
    #[must_use]
    pub fn es_cif(value: impl Into<String>) -> Self {
        Self {
            kind: "es_cif".to_owned(),
            value: value.into(),
        }
    }

    /// Encode as form pairs.
    #[must_use]
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        form.push("type", self.kind.as_str());
        form.push("value", self.value.as_str());
        form
    }
}

/// One line of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub price: PriceId,
    pub quantity: u64,
    pub tax_rates: Vec<TaxRateId>,
}

/// A subscription-mode checkout session to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    pub success_url: String,
    pub cancel_url: String,
    pub customer: CustomerId,
    pub client_reference_id: Option<String>,
    pub line_items: Vec<LineItem>,
}

impl CheckoutSessionParams {
    /// Encode as form pairs.
    #[must_use]
    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        form.push("mode", "subscription");
        form.push("success_url", self.success_url.as_str());
        form.push("cancel_url", self.cancel_url.as_str());
        form.push("customer", self.customer.as_str());
        form.push_opt("client_reference_id", self.client_reference_id.as_deref());
        for (i, item) in self.line_items.iter().enumerate() {
            form.push(format!("line_items[{i}][price]"), item.price.as_str());
            form.push(format!("line_items[{i}][quantity]"), item.quantity.to_string());
            for (j, rate) in item.tax_rates.iter().enumerate() {
                form.push(format!("line_items[{i}][tax_rates][{j}]"), rate.as_str());
            }
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_query_encoding() {
        let form = CustomerQuery::by_email("a@example.com").expanded().to_form();
        assert_eq!(form.get("limit"), Some("1"));
        assert_eq!(form.get("email"), Some("a@example.com"));
        let expands: Vec<_> = form
            .pairs()
            .iter()
            .filter(|(k, _)| k == "expand[]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(expands, ["data.subscriptions", "data.tax_ids"]);

        assert_eq!(CustomerQuery::all().to_form().get("limit"), Some("100"));
    }

    #[test]
    fn test_customer_params_skip_unset_fields() {
        let params = CustomerParams {
            phone: Some("+34 600".to_owned()),
            address: AddressParams {
                city: Some("Bilbao".to_owned()),
                ..AddressParams::default()
            },
            ..CustomerParams::default()
        }
        .with_metadata("status", "verified");

        let form = params.to_form();
        assert_eq!(form.pairs().len(), 3);
        assert_eq!(form.get("phone"), Some("+34 600"));
        assert_eq!(form.get("address[city]"), Some("Bilbao"));
        assert_eq!(form.get("metadata[status]"), Some("verified"));
        assert_eq!(form.get("name"), None);
    }

    #[test]
    fn test_checkout_session_encoding() {
        let params = CheckoutSessionParams {
            success_url: "https://example.com/ok".to_owned(),
            cancel_url: "https://example.com/ko".to_owned(),
            customer: CustomerId::from("cus_1"),
            client_reference_id: None,
            line_items: vec![LineItem {
                price: PriceId::from("price_1"),
                quantity: 2,
                tax_rates: vec![TaxRateId::from("txr_1")],
            }],
        };
        let form = params.to_form();
        assert_eq!(form.get("mode"), Some("subscription"));
        assert_eq!(form.get("line_items[0][price]"), Some("price_1"));
        assert_eq!(form.get("line_items[0][quantity]"), Some("2"));
        assert_eq!(form.get("line_items[0][tax_rates][0]"), Some("txr_1"));
        assert_eq!(form.get("client_reference_id"), None);
    }
}
