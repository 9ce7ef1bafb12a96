//! Subscription checkout.
//!
//! A [`CheckoutRequest`] is validated locally from parsed arguments before any
//! request is made; [`Billing::subscribe`] then resolves the customer and the
//! product prices and opens a subscription-mode checkout session.

use std::collections::BTreeMap;

use subkit_core::{CustomerId, ProductId, TaxRateId};
use tracing::instrument;

use crate::Billing;
use crate::error::BillingError;
use crate::stripe::{CheckoutSession, CheckoutSessionParams, LineItem, PaymentApi};

/// Who the checkout is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    /// A known customer id.
    Id(CustomerId),
    /// An email to resolve to a customer.
    Email(String),
}

/// One `@PRODUCT=QTY[,TAX]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutItem {
    pub product: ProductId,
    pub quantity: u64,
    pub tax_rate: TaxRateId,
}

/// A validated checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub success_url: String,
    pub cancel_url: String,
    pub customer: CustomerRef,
    pub reference: Option<String>,
    pub items: Vec<CheckoutItem>,
}

impl CheckoutRequest {
    /// Build a request from parsed arguments.
    ///
    /// Reads `url_success`, `url_cancel`, `customer` or `email`, optional
    /// `reference` and `tax_rate`, and every `@PRODUCT=QTY[,TAX]` entry. An
    /// entry without a tax uses `tax_rate`, then `default_tax`.
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` for a missing URL, `MissingCustomer`,
    /// `InvalidQuantity`, `MissingDefaultTaxRate` or `MissingProducts`.
    pub fn from_pairs(
        pairs: &BTreeMap<String, String>,
        default_tax: Option<&TaxRateId>,
    ) -> Result<Self, BillingError> {
        let get = |key: &str| pairs.get(key).filter(|value| !value.is_empty());

        let success_url = get("url_success").ok_or(BillingError::MissingParameter("url_success"))?;
        let cancel_url = get("url_cancel").ok_or(BillingError::MissingParameter("url_cancel"))?;

        let customer = match (get("customer"), get("email")) {
            (Some(id), _) => CustomerRef::Id(CustomerId::from(id.as_str())),
            (None, Some(email)) => CustomerRef::Email(email.clone()),
            (None, None) => return Err(BillingError::MissingCustomer),
        };

        let fallback_tax = get("tax_rate")
            .map(|rate| TaxRateId::from(rate.as_str()))
            .or_else(|| default_tax.cloned());

        let items = pairs
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix('@')
                    .filter(|product| !product.is_empty())
                    .map(|product| parse_item(product, value, fallback_tax.as_ref()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if items.is_empty() {
            return Err(BillingError::MissingProducts);
        }

        Ok(Self {
            success_url: success_url.clone(),
            cancel_url: cancel_url.clone(),
            customer,
            reference: get("reference").cloned(),
            items,
        })
    }
}

/// Parse `QTY[,TAX]` for `product`.
fn parse_item(
    product: &str,
    value: &str,
    fallback_tax: Option<&TaxRateId>,
) -> Result<CheckoutItem, BillingError> {
    let (quantity, tax) = value.split_once(',').unwrap_or((value, ""));

    let quantity = quantity
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|quantity| *quantity > 0)
        .ok_or_else(|| BillingError::InvalidQuantity(format!("{product}={value}")))?;

    let tax_rate = match tax.trim() {
        "" => fallback_tax
            .cloned()
            .ok_or(BillingError::MissingDefaultTaxRate)?,
        tax => TaxRateId::from(tax),
    };

    Ok(CheckoutItem {
        product: ProductId::from(product),
        quantity,
        tax_rate,
    })
}

impl<A: PaymentApi> Billing<A> {
    /// Open a checkout session for `request`.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the email is unknown, `NoDefaultPrice` if a
    /// product cannot be subscribed to, or `Stripe` if a request fails.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn subscribe(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let customer = match &request.customer {
            CustomerRef::Id(id) => id.clone(),
            CustomerRef::Email(email) => self
                .user_id(email)
                .await?
                .ok_or(BillingError::UserNotFound)?,
        };

        let mut line_items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            line_items.push(LineItem {
                price: self.product_price(&item.product).await?,
                quantity: item.quantity,
                tax_rates: vec![item.tax_rate.clone()],
            });
        }

        let params = CheckoutSessionParams {
            success_url: request.success_url.clone(),
            cancel_url: request.cancel_url.clone(),
            customer,
            client_reference_id: request.reference.clone(),
            line_items,
        };
        Ok(self.api.create_checkout_session(&params).await?)
    }
}
