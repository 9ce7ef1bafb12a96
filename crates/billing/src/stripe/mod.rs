//! Stripe REST API client.
//!
//! A small hand-written client covering the customer, catalog and checkout
//! endpoints this tool uses.
//!
//! # API Reference
//!
//! - Base URL: `https://api.stripe.com/v1` (overridable for tests)
//! - Authentication: secret key via `Authorization: Bearer <key>`
//! - API Version: `2022-11-15` (specified via `Stripe-Version` header)
//! - Request bodies are `application/x-www-form-urlencoded`

mod catalog;
mod customers;
mod params;
mod types;

pub use params::*;
pub use types::*;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use subkit_core::{CustomerId, ProductId, TaxIdId};
use thiserror::Error;

use crate::config::BillingConfig;

/// Stripe API version (`Stripe-Version` header).
const API_VERSION: &str = "2022-11-15";

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("Stripe error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unauthorized (invalid or revoked secret key).
    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Secret key cannot be sent as a header.
    #[error("Invalid API key format: {0}")]
    InvalidKey(String),
}

/// Remote operations the billing layer needs from a payment provider.
///
/// [`StripeClient`] talks to Stripe; tests use an in-memory implementation.
#[allow(async_fn_in_trait)]
pub trait PaymentApi {
    /// Customers matching `query`.
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>, StripeError>;

    /// Create a customer.
    async fn create_customer(&self, params: &CustomerParams) -> Result<Customer, StripeError>;

    /// Update a customer, leaving unset fields untouched.
    async fn update_customer(
        &self,
        id: &CustomerId,
        params: &CustomerParams,
    ) -> Result<Customer, StripeError>;

    /// Delete a customer. Returns whether it was deleted.
    async fn delete_customer(&self, id: &CustomerId) -> Result<bool, StripeError>;

    /// Products with their default price expanded.
    async fn list_products(&self) -> Result<Vec<Product>, StripeError>;

    /// A single product.
    async fn get_product(&self, id: &ProductId) -> Result<Product, StripeError>;

    /// Tax rates.
    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, StripeError>;

    /// Active subscriptions of a customer.
    async fn list_subscriptions(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Subscription>, StripeError>;

    /// Tax ids of a customer.
    async fn list_tax_ids(&self, customer: &CustomerId) -> Result<Vec<TaxId>, StripeError>;

    /// Attach a tax id to a customer.
    async fn create_tax_id(
        &self,
        customer: &CustomerId,
        params: &TaxIdParams,
    ) -> Result<TaxId, StripeError>;

    /// Remove a tax id from a customer.
    async fn delete_tax_id(&self, customer: &CustomerId, id: &TaxIdId) -> Result<(), StripeError>;

    /// Create a checkout session.
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError>;
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    base_url: String,
}

/// Error body returned by Stripe (`{"error": {"message": ...}}`).
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns error if the secret key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &BillingConfig) -> Result<Self, StripeError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_value =
            HeaderValue::from_str(&auth_value).map_err(|e| StripeError::InvalidKey(e.to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        headers.insert("Stripe-Version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                base_url: config.api_base.clone(),
            }),
        })
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// URL of an endpoint below the base URL.
    ///
    /// Each segment is percent-encoded on its own, so an id can never add
    /// path segments, a query or a fragment.
    fn endpoint(&self, segments: &[&str]) -> Result<url::Url, StripeError> {
        let base = &self.inner.base_url;
        let mut url =
            url::Url::parse(base).map_err(|e| StripeError::InvalidUrl(format!("{base}: {e}")))?;
        if let Some(bad) = segments
            .iter()
            .find(|s| matches!(**s, "" | "." | ".."))
        {
            return Err(StripeError::InvalidUrl(format!("bad path segment {bad:?}")));
        }
        url.path_segments_mut()
            .map_err(|()| StripeError::InvalidUrl(format!("{base}: cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Execute a GET request with query parameters.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &[&str],
        query: &Form,
    ) -> Result<T, StripeError> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        tracing::debug!(%url, "GET");
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a form-encoded POST request.
    pub(crate) async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &[&str],
        form: &Form,
    ) -> Result<T, StripeError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, fields = form.pairs().len(), "POST");
        let response = self.inner.client.post(url).form(form.pairs()).send().await?;
        Self::handle_response(response).await
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete<T: serde::de::DeserializeOwned>(
        &self,
        path: &[&str],
    ) -> Result<T, StripeError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "DELETE");
        let response = self.inner.client.delete(url).send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| StripeError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse error response from the Stripe API.
    async fn parse_error(response: reqwest::Response) -> StripeError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return StripeError::Unauthorized;
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        if status == 404 {
            return StripeError::NotFound(message);
        }

        StripeError::Api { status, message }
    }
}

/// Human readable message of a Stripe error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message: Some(message),
                ..
            },
        }) => message,
        Ok(ErrorEnvelope {
            error: ErrorBody {
                kind: Some(kind), ..
            },
        }) => kind,
        _ if body.trim().is_empty() => "Unknown error".to_owned(),
        _ => body.trim().to_owned(),
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl PaymentApi for StripeClient {
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>, StripeError> {
        self.customers(query).await
    }

    async fn create_customer(&self, params: &CustomerParams) -> Result<Customer, StripeError> {
        self.new_customer(params).await
    }

    async fn update_customer(
        &self,
        id: &CustomerId,
        params: &CustomerParams,
    ) -> Result<Customer, StripeError> {
        self.modify_customer(id, params).await
    }

    async fn delete_customer(&self, id: &CustomerId) -> Result<bool, StripeError> {
        self.remove_customer(id).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StripeError> {
        self.products().await
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, StripeError> {
        self.product(id).await
    }

    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, StripeError> {
        self.tax_rates().await
    }

    async fn list_subscriptions(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Subscription>, StripeError> {
        self.active_subscriptions(customer).await
    }

    async fn list_tax_ids(&self, customer: &CustomerId) -> Result<Vec<TaxId>, StripeError> {
        self.tax_ids(customer).await
    }

    async fn create_tax_id(
        &self,
        customer: &CustomerId,
        params: &TaxIdParams,
    ) -> Result<TaxId, StripeError> {
        self.new_tax_id(customer, params).await
    }

    async fn delete_tax_id(&self, customer: &CustomerId, id: &TaxIdId) -> Result<(), StripeError> {
        self.remove_tax_id(customer, id).await
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        self.new_checkout_session(params).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::{MailConfig, Mode};

    fn config(key: &str) -> BillingConfig {
        BillingConfig {
            mode: Mode::Test,
            secret_key: SecretString::from(key.to_owned()),
            api_base: "http://127.0.0.1:9/v1".to_owned(),
            default_tax_rate: None,
            master_password_hash: None,
            mail: MailConfig::default(),
        }
    }

    #[test]
    fn test_api_constants() {
        assert_eq!(API_VERSION, "2022-11-15");
    }

    #[test]
    fn test_client_keeps_base_url() {
        let client = StripeClient::new(&config("sk_test_123")).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9/v1");
        assert!(!format!("{client:?}").contains("sk_test_123"));
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let err = StripeClient::new(&config("sk_test\n123")).unwrap_err();
        assert!(matches!(err, StripeError::InvalidKey(_)));
    }

    #[test]
    fn test_endpoint_encodes_ids_as_one_segment() {
        let client = StripeClient::new(&config("sk_test_123")).unwrap();

        let url = client.endpoint(&["customers", "cus_1"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/v1/customers/cus_1");

        let url = client.endpoint(&["customers", "cus_1/../x?y=1#z"]).unwrap();
        assert_eq!(url.path(), "/v1/customers/cus_1%2F..%2Fx%3Fy=1%23z");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = client
            .endpoint(&["customers", "cus_1", "tax_ids", "txi_1"])
            .unwrap();
        assert_eq!(url.path(), "/v1/customers/cus_1/tax_ids/txi_1");
    }

    #[test]
    fn test_endpoint_rejects_dot_and_empty_segments() {
        let client = StripeClient::new(&config("sk_test_123")).unwrap();
        for bad in ["", ".", ".."] {
            let err = client.endpoint(&["customers", bad]).unwrap_err();
            assert!(matches!(err, StripeError::InvalidUrl(_)), "{bad:?}");
        }
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_in_base() {
        let mut cfg = config("sk_test_123");
        cfg.api_base = "http://127.0.0.1:9/v1/".to_owned();
        let client = StripeClient::new(&cfg).unwrap();
        let url = client.endpoint(&["products"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/v1/products");
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"message": "No such customer: 'cus_x'", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "No such customer: 'cus_x'");

        let body = r#"{"error": {"type": "api_error"}}"#;
        assert_eq!(error_message(body), "api_error");

        assert_eq!(error_message("bad gateway\n"), "bad gateway");
        assert_eq!(error_message(""), "Unknown error");
    }
}
