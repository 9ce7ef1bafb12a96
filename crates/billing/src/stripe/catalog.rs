//! Product, tax rate and checkout endpoints.

use subkit_core::ProductId;
use tracing::instrument;

use super::{
    CheckoutSession, CheckoutSessionParams, Form, List, PAGE_SIZE, Product, StripeClient,
    StripeError, TaxRate,
};

impl StripeClient {
    /// List products with their default price expanded.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, StripeError> {
        let mut query = Form::new();
        query.push("limit", PAGE_SIZE.to_string());
        query.push("expand[]", "data.default_price");

        let list: List<Product> = self.get(&["products"], &query).await?;
        Ok(list.data)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::NotFound` for unknown ids.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, StripeError> {
        self.get(&["products", id.as_str()], &Form::new()).await
    }

    /// List tax rates.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn tax_rates(&self) -> Result<Vec<TaxRate>, StripeError> {
        let mut query = Form::new();
        query.push("limit", PAGE_SIZE.to_string());

        let list: List<TaxRate> = self.get(&["tax_rates"], &query).await?;
        Ok(list.data)
    }

    /// Create a subscription-mode checkout session.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, params), fields(customer = %params.customer, items = params.line_items.len()))]
    pub async fn new_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        let session: CheckoutSession = self
            .post(&["checkout", "sessions"], &params.to_form())
            .await?;
        tracing::info!(id = %session.id, "Created checkout session");
        Ok(session)
    }
}
