//! Test doubles: an in-memory payment API and scripted collaborators.
//!
//! Available to this crate's tests and, with the `test-utils` feature, to
//! dependent crates.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use lettre::Message;
use secrecy::SecretString;
use subkit_core::{CheckoutSessionId, CustomerId, PriceId, ProductId, TaxIdId, TaxRateId, VerificationStatus};

use crate::Billing;
use crate::config::{BillingConfig, MailConfig, Mode};
use crate::local::{
    LinkOpener, MailError, MailSender, OpenError, PasswordError, PasswordHasher,
    PasswordStrengthChecker,
};
use crate::stripe::{
    Address, CheckoutSession, CheckoutSessionParams, Customer, CustomerParams, CustomerQuery,
    Expandable, HASH_METADATA_KEY, List, PaymentApi, Price, Product, Recurring, StripeError,
    Subscription, TaxId, TaxIdParams, TaxRate,
};

#[derive(Default)]
struct State {
    customers: Vec<Customer>,
    products: Vec<Product>,
    tax_rates: Vec<TaxRate>,
    subscriptions: Vec<(CustomerId, Subscription)>,
    tax_ids: BTreeMap<CustomerId, Vec<TaxId>>,
    sessions: Vec<CheckoutSessionParams>,
    next_id: u32,
    unavailable: bool,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{:04}", self.next_id)
    }

    fn check(&self) -> Result<(), StripeError> {
        if self.unavailable {
            return Err(StripeError::Api {
                status: 500,
                message: "service unavailable".to_owned(),
            });
        }
        Ok(())
    }

    fn customer_mut(&mut self, id: &CustomerId) -> Result<&mut Customer, StripeError> {
        self.customers
            .iter_mut()
            .find(|customer| &customer.id == id)
            .ok_or_else(|| StripeError::NotFound(format!("No such customer: '{id}'")))
    }
}

/// In-memory [`PaymentApi`] with Stripe-like semantics.
#[derive(Default)]
pub struct MemoryApi {
    state: Mutex<State>,
}

impl MemoryApi {
    /// An empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Store a customer, assigning an id when it has none.
    pub fn insert_customer(&self, mut customer: Customer) -> CustomerId {
        let mut state = self.state();
        if customer.id.as_str().is_empty() {
            customer.id = CustomerId::from(state.next_id("cus"));
        }
        let id = customer.id.clone();
        state.customers.push(customer);
        id
    }

    /// Store a product.
    pub fn insert_product(&self, product: Product) {
        self.state().products.push(product);
    }

    /// Store a tax rate.
    pub fn insert_tax_rate(&self, rate: TaxRate) {
        self.state().tax_rates.push(rate);
    }

    /// Attach a tax id to a customer.
    pub fn insert_tax_id(&self, customer: &CustomerId, kind: &str, value: &str) -> TaxIdId {
        let mut state = self.state();
        let id = TaxIdId::from(state.next_id("txi"));
        state.tax_ids.entry(customer.clone()).or_default().push(TaxId {
            id: id.clone(),
            kind: kind.to_owned(),
            value: value.to_owned(),
        });
        id
    }

    /// Subscribe a customer to product prices (`(product, price)` pairs).
    pub fn insert_subscription(&self, customer: &CustomerId, status: &str, items: &[(&str, &str)]) {
        let mut state = self.state();
        let id = state.next_id("sub");
        let items = items
            .iter()
            .map(|(product, price)| crate::stripe::SubscriptionItem {
                id: format!("si_{price}"),
                price: Some(Price {
                    id: PriceId::from(*price),
                    product: Some(Expandable::Id((*product).to_owned())),
                    ..Price::default()
                }),
            })
            .collect();
        state.subscriptions.push((
            customer.clone(),
            Subscription {
                id: id.into(),
                status: status.to_owned(),
                items: List {
                    data: items,
                    has_more: false,
                },
            },
        ));
    }

    /// Make every call fail with a 500 error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Number of stored customers.
    #[must_use]
    pub fn customer_count(&self) -> usize {
        self.state().customers.len()
    }

    /// Stored customer by email.
    #[must_use]
    pub fn customer_by_email(&self, email: &str) -> Option<Customer> {
        self.state()
            .customers
            .iter()
            .find(|customer| customer.email.as_deref() == Some(email))
            .cloned()
    }

    /// Checkout sessions created so far.
    #[must_use]
    pub fn checkout_sessions(&self) -> Vec<CheckoutSessionParams> {
        self.state().sessions.clone()
    }
}

/// Apply create/update parameters the way Stripe does: unset fields are
/// kept and an empty metadata value removes the key.
fn apply(customer: &mut Customer, params: &CustomerParams) {
    let set = |field: &mut Option<String>, value: &Option<String>| {
        if value.is_some() {
            field.clone_from(value);
        }
    };
    set(&mut customer.email, &params.email);
    set(&mut customer.name, &params.name);
    set(&mut customer.phone, &params.phone);
    set(&mut customer.description, &params.description);
    if params.preferred_locales.is_some() {
        customer.preferred_locales.clone_from(&params.preferred_locales);
    }
    if !params.address.is_empty() {
        let address = customer.address.get_or_insert_with(Address::default);
        set(&mut address.city, &params.address.city);
        set(&mut address.country, &params.address.country);
        set(&mut address.line1, &params.address.line1);
        set(&mut address.line2, &params.address.line2);
        set(&mut address.postal_code, &params.address.postal_code);
        set(&mut address.state, &params.address.state);
    }
    for (key, value) in &params.metadata {
        if value.is_empty() {
            customer.metadata.remove(key);
        } else {
            customer.metadata.insert(key.clone(), value.clone());
        }
    }
}

impl PaymentApi for MemoryApi {
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<Customer>, StripeError> {
        let state = self.state();
        state.check()?;
        let expand_tax_ids = query.expand.contains(&"data.tax_ids");
        Ok(state
            .customers
            .iter()
            .filter(|customer| {
                query
                    .email
                    .as_deref()
                    .is_none_or(|email| customer.email.as_deref() == Some(email))
            })
            .take(query.limit as usize)
            .map(|customer| {
                let mut customer = customer.clone();
                if expand_tax_ids {
                    customer.tax_ids = Some(List {
                        data: state.tax_ids.get(&customer.id).cloned().unwrap_or_default(),
                        has_more: false,
                    });
                }
                customer
            })
            .collect())
    }

    async fn create_customer(&self, params: &CustomerParams) -> Result<Customer, StripeError> {
        let mut state = self.state();
        state.check()?;
        let mut customer = Customer {
            id: CustomerId::from(state.next_id("cus")),
            ..Customer::default()
        };
        apply(&mut customer, params);
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: &CustomerId,
        params: &CustomerParams,
    ) -> Result<Customer, StripeError> {
        let mut state = self.state();
        state.check()?;
        let customer = state.customer_mut(id)?;
        apply(customer, params);
        Ok(customer.clone())
    }

    async fn delete_customer(&self, id: &CustomerId) -> Result<bool, StripeError> {
        let mut state = self.state();
        state.check()?;
        state.customer_mut(id)?;
        state.customers.retain(|customer| &customer.id != id);
        state.tax_ids.remove(id);
        Ok(true)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StripeError> {
        let state = self.state();
        state.check()?;
        Ok(state.products.clone())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, StripeError> {
        let state = self.state();
        state.check()?;
        state
            .products
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| StripeError::NotFound(format!("No such product: '{id}'")))
    }

    async fn list_tax_rates(&self) -> Result<Vec<TaxRate>, StripeError> {
        let state = self.state();
        state.check()?;
        Ok(state.tax_rates.clone())
    }

    async fn list_subscriptions(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Subscription>, StripeError> {
        let state = self.state();
        state.check()?;
        Ok(state
            .subscriptions
            .iter()
            .filter(|(owner, subscription)| owner == customer && subscription.status == "active")
            .map(|(_, subscription)| subscription.clone())
            .collect())
    }

    async fn list_tax_ids(&self, customer: &CustomerId) -> Result<Vec<TaxId>, StripeError> {
        let state = self.state();
        state.check()?;
        Ok(state.tax_ids.get(customer).cloned().unwrap_or_default())
    }

    async fn create_tax_id(
        &self,
        customer: &CustomerId,
        params: &TaxIdParams,
    ) -> Result<TaxId, StripeError> {
        let mut state = self.state();
        state.check()?;
        state.customer_mut(customer)?;
        let tax_id = TaxId {
            id: TaxIdId::from(state.next_id("txi")),
            kind: params.kind.clone(),
            value: params.value.clone(),
        };
        state
            .tax_ids
            .entry(customer.clone())
            .or_default()
            .push(tax_id.clone());
        Ok(tax_id)
    }

    async fn delete_tax_id(&self, customer: &CustomerId, id: &TaxIdId) -> Result<(), StripeError> {
        let mut state = self.state();
        state.check()?;
        let tax_ids = state.tax_ids.entry(customer.clone()).or_default();
        let before = tax_ids.len();
        tax_ids.retain(|tax_id| &tax_id.id != id);
        if tax_ids.len() == before {
            return Err(StripeError::NotFound(format!("No such tax id: '{id}'")));
        }
        Ok(())
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        let mut state = self.state();
        state.check()?;
        let id = CheckoutSessionId::from(state.next_id("cs_test"));
        state.sessions.push(params.clone());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.stripe.com/c/pay/{id}")),
            id,
        })
    }
}

/// The hash [`FakeHasher`] produces for `password`.
#[must_use]
pub fn test_hash(password: &str) -> String {
    format!("$1$pstripe${}", password.chars().rev().collect::<String>())
}

/// Deterministic hasher that needs no `openssl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(test_hash(password))
    }
}

/// Strength checker that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptingChecker;

impl PasswordStrengthChecker for AcceptingChecker {
    fn check(&self, _password: &str) -> Result<(), PasswordError> {
        Ok(())
    }
}

/// Strength checker that rejects everything with a fixed verdict.
#[derive(Debug, Clone)]
pub struct RejectingChecker(String);

impl RejectingChecker {
    #[must_use]
    pub fn new(verdict: &str) -> Self {
        Self(verdict.to_owned())
    }
}

impl PasswordStrengthChecker for RejectingChecker {
    fn check(&self, _password: &str) -> Result<(), PasswordError> {
        Err(PasswordError::Weak(self.0.clone()))
    }
}

/// Mailer that keeps the formatted messages.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingMailer {
    /// Messages sent so far, as RFC 822 text.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailSender for RecordingMailer {
    fn send(&self, message: &Message) -> Result<(), MailError> {
        let raw = String::from_utf8_lossy(&message.formatted()).into_owned();
        self.sent.lock().unwrap().push(raw);
        Ok(())
    }
}

/// Opener that keeps the URLs instead of launching a browser.
#[derive(Debug, Clone, Default)]
pub struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingOpener {
    /// URLs opened so far.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), OpenError> {
        self.opened.lock().unwrap().push(url.to_owned());
        Ok(())
    }
}

/// Test-mode configuration pointing nowhere.
#[must_use]
pub fn config() -> BillingConfig {
    BillingConfig {
        mode: Mode::Test,
        secret_key: SecretString::from("sk_test_123".to_owned()),
        api_base: "http://127.0.0.1:9/v1".to_owned(),
        default_tax_rate: None,
        master_password_hash: None,
        mail: MailConfig::default(),
    }
}

/// Operations over `api` with every collaborator replaced by a double.
#[must_use]
pub fn billing<A: PaymentApi>(api: A) -> Billing<A> {
    billing_with_config(api, config())
}

/// Like [`billing`] with a custom configuration.
#[must_use]
pub fn billing_with_config<A: PaymentApi>(api: A, config: BillingConfig) -> Billing<A> {
    Billing::new(api, config)
        .with_hasher(FakeHasher)
        .with_strength_checker(AcceptingChecker)
        .with_mailer(RecordingMailer::default())
        .with_opener(RecordingOpener::default())
}

/// A customer without id, ready for [`MemoryApi::insert_customer`].
#[must_use]
pub fn customer(email: &str, status: VerificationStatus) -> Customer {
    let mut customer = Customer {
        email: Some(email.to_owned()),
        ..Customer::default()
    };
    customer.metadata.insert(
        VerificationStatus::METADATA_KEY.to_owned(),
        status.as_str().to_owned(),
    );
    customer
}

/// A verified customer with a stored password hash.
#[must_use]
pub fn customer_with_hash(email: &str, hash: &str) -> Customer {
    let mut customer = customer(email, VerificationStatus::Verified);
    customer
        .metadata
        .insert(HASH_METADATA_KEY.to_owned(), hash.to_owned());
    customer
}

/// A product, optionally with an expanded monthly default price
/// (`(price id, cents)` in eur).
#[must_use]
pub fn product(id: &str, name: &str, price: Option<(&str, i64)>) -> Product {
    Product {
        id: ProductId::from(id),
        name: name.to_owned(),
        active: true,
        default_price: price.map(|(price, cents)| {
            Expandable::Object(Box::new(Price {
                id: PriceId::from(price),
                currency: "eur".to_owned(),
                unit_amount: Some(cents),
                recurring: Some(Recurring {
                    interval: "month".to_owned(),
                    interval_count: 1,
                }),
                product: None,
            }))
        }),
    }
}

/// An active tax rate.
#[must_use]
pub fn tax_rate(id: &str, display_name: &str, percentage: f64) -> TaxRate {
    TaxRate {
        id: TaxRateId::from(id),
        display_name: display_name.to_owned(),
        jurisdiction: Some("ES".to_owned()),
        percentage,
        active: true,
    }
}
