//! Integration tests for subkit.
//!
//! Each test starts a `mockito` server standing in for the Stripe REST API
//! and points a real [`StripeClient`] at it, so request encoding, response
//! decoding and error mapping are exercised over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p subkit-integration-tests
//! ```

use mockito::ServerGuard;
use secrecy::SecretString;
use subkit_billing::{Billing, BillingConfig, StripeClient, testing};

/// Secret key sent by every test client.
pub const SECRET_KEY: &str = "sk_test_integration";

/// A mock Stripe server with a client pointed at it.
pub struct MockStripe {
    pub server: ServerGuard,
    pub client: StripeClient,
}

impl MockStripe {
    /// Start a server with no mocks registered.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    pub async fn new() -> Self {
        let server = mockito::Server::new_async().await;
        let client = StripeClient::new(&config(&server)).expect("Failed to build Stripe client");
        Self { server, client }
    }

    /// Billing operations over the mock server with test collaborators.
    #[must_use]
    pub fn billing(&self) -> Billing<StripeClient> {
        testing::billing_with_config(self.client.clone(), config(&self.server))
    }

    /// `Authorization` header value the client must send.
    #[must_use]
    pub fn bearer() -> String {
        format!("Bearer {SECRET_KEY}")
    }
}

/// Test-mode configuration whose API base is the mock server.
#[must_use]
pub fn config(server: &ServerGuard) -> BillingConfig {
    BillingConfig {
        secret_key: SecretString::from(SECRET_KEY.to_owned()),
        api_base: format!("{}/v1", server.url()),
        ..testing::config()
    }
}

/// A Stripe list envelope around `data`.
#[must_use]
pub fn list(data: serde_json::Value) -> String {
    serde_json::json!({
        "object": "list",
        "url": "/v1/list",
        "has_more": false,
        "data": data,
    })
    .to_string()
}
