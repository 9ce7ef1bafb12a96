//! Customer, tax id and subscription endpoints.

use subkit_core::{CustomerId, TaxIdId};
use tracing::instrument;

use super::{
    Customer, CustomerParams, CustomerQuery, Deleted, Form, List, PAGE_SIZE, StripeClient,
    StripeError, Subscription, TaxId, TaxIdParams,
};

impl StripeClient {
    /// List customers matching a query.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, query), fields(limit = query.limit))]
    pub async fn customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>, StripeError> {
        let list: List<Customer> = self.get(&["customers"], &query.to_form()).await?;
        Ok(list.data)
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, params))]
    pub async fn new_customer(&self, params: &CustomerParams) -> Result<Customer, StripeError> {
        let customer: Customer = self.post(&["customers"], &params.to_form()).await?;
        tracing::info!(id = %customer.id, "Created customer");
        Ok(customer)
    }

    /// Update a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, params), fields(id = %id))]
    pub async fn modify_customer(
        &self,
        id: &CustomerId,
        params: &CustomerParams,
    ) -> Result<Customer, StripeError> {
        let customer = self
            .post(&["customers", id.as_str()], &params.to_form())
            .await?;
        tracing::info!("Updated customer");
        Ok(customer)
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove_customer(&self, id: &CustomerId) -> Result<bool, StripeError> {
        let deleted: Deleted = self.delete(&["customers", id.as_str()]).await?;
        tracing::info!(deleted = deleted.deleted, "Deleted customer");
        Ok(deleted.deleted)
    }

    /// List the active subscriptions of a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn active_subscriptions(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Subscription>, StripeError> {
        let mut query = Form::new();
        query.push("limit", PAGE_SIZE.to_string());
        query.push("customer", customer.as_str());
        query.push("status", "active");

        let list: List<Subscription> = self.get(&["subscriptions"], &query).await?;
        Ok(list.data)
    }

    /// List the tax ids of a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn tax_ids(&self, customer: &CustomerId) -> Result<Vec<TaxId>, StripeError> {
        let mut query = Form::new();
        query.push("limit", PAGE_SIZE.to_string());

        let list: List<TaxId> = self
            .get(&["customers", customer.as_str(), "tax_ids"], &query)
            .await?;
        Ok(list.data)
    }

    /// Attach a tax id to a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, params), fields(customer = %customer, kind = %params.kind))]
    pub async fn new_tax_id(
        &self,
        customer: &CustomerId,
        params: &TaxIdParams,
    ) -> Result<TaxId, StripeError> {
        let tax_id: TaxId = self
            .post(&["customers", customer.as_str(), "tax_ids"], &params.to_form())
            .await?;
        tracing::info!(id = %tax_id.id, "Created tax id");
        Ok(tax_id)
    }

    /// Remove a tax id from a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(customer = %customer, id = %id))]
    pub async fn remove_tax_id(
        &self,
        customer: &CustomerId,
        id: &TaxIdId,
    ) -> Result<(), StripeError> {
        let _: Deleted = self
            .delete(&["customers", customer.as_str(), "tax_ids", id.as_str()])
            .await?;
        tracing::info!("Deleted tax id");
        Ok(())
    }
}
