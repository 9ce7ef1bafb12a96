//! Products, prices and tax rates.

use futures::Stream;
use subkit_core::{PriceId, ProductId};
use tracing::instrument;

use crate::Billing;
use crate::error::BillingError;
use crate::listing;
use crate::stripe::{PaymentApi, Product, TaxRate};

impl<A: PaymentApi> Billing<A> {
    /// Every product with its default price expanded.
    pub fn products(&self) -> impl Stream<Item = Result<Product, BillingError>> + '_ {
        listing::lazy(move || async move { self.api.list_products().await })
    }

    /// Every tax rate.
    pub fn tax_rates(&self) -> impl Stream<Item = Result<TaxRate, BillingError>> + '_ {
        listing::lazy(move || async move { self.api.list_tax_rates().await })
    }

    /// Default price of a product.
    ///
    /// # Errors
    ///
    /// Returns `Stripe` if the product cannot be fetched and `NoDefaultPrice`
    /// if it has no default price.
    #[instrument(skip(self), fields(product = %product))]
    pub async fn product_price(&self, product: &ProductId) -> Result<PriceId, BillingError> {
        self.api
            .get_product(product)
            .await?
            .default_price_id()
            .ok_or_else(|| BillingError::NoDefaultPrice(product.clone()))
    }
}
