//! Customer accounts: registration, lookup, editing, passwords and email
//! validation.
//!
//! A "user" is a Stripe customer whose metadata carries the password hash
//! (`hash1`), the verification status (`status`) and a pending validation
//! code (`ecode`).

use std::collections::BTreeMap;

use futures::Stream;
use subkit_core::{CustomerId, Email, Language, PriceId, ProductId, VerificationStatus};
use tracing::instrument;
use uuid::Uuid;

use crate::error::BillingError;
use crate::listing;
use crate::local::{compose_validation_mail, hashes_match, validation_url};
use crate::stripe::{
    AddressParams, Customer, CustomerParams, CustomerQuery, ECODE_METADATA_KEY,
    HASH_METADATA_KEY, PaymentApi, Subscription, TaxIdParams,
};
use crate::Billing;

/// Options for registering a user.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Initial verification status.
    pub status: VerificationStatus,
    /// Preferred language; omitted when it normalizes to `auto`.
    pub language: Option<Language>,
    /// Extra metadata entries.
    pub metadata: BTreeMap<String, String>,
}

impl NewUser {
    /// Read `verified`, `language` and `@key=value` entries from parsed
    /// arguments.
    #[must_use]
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Self {
        Self {
            status: pairs
                .get("verified")
                .map_or(VerificationStatus::Unverified, |flag| {
                    VerificationStatus::from_flag(flag)
                }),
            language: pairs.get("language").map(|l| Language::normalize(l)),
            metadata: metadata_entries(pairs),
        }
    }
}

/// Changes to apply to an existing user. `None` fields are left untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub status: Option<VerificationStatus>,
    pub language: Option<Language>,
    pub metadata: BTreeMap<String, String>,
    pub address: AddressParams,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    /// Spanish company tax id (`es_cif`) the user should carry.
    pub cif: Option<String>,
}

impl UserChanges {
    /// Map parsed arguments onto customer fields.
    ///
    /// `city country addr1 addr2 zipcode state` go to the address,
    /// `name phone description` to the customer, `@key` to metadata and
    /// `cif` to the tax ids. Unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Self {
        let mut changes = Self {
            status: pairs
                .get("verified")
                .map(|flag| VerificationStatus::from_flag(flag)),
            language: pairs.get("language").map(|l| Language::normalize(l)),
            metadata: metadata_entries(pairs),
            ..Self::default()
        };

        for (key, value) in pairs {
            let value = Some(value.clone());
            match key.as_str() {
                "city" => changes.address.city = value,
                "country" => changes.address.country = value,
                "addr1" => changes.address.line1 = value,
                "addr2" => changes.address.line2 = value,
                "zipcode" => changes.address.postal_code = value,
                "state" => changes.address.state = value,
                "description" => changes.description = value,
                "phone" => changes.phone = value,
                "name" => changes.name = value,
                "cif" => changes.cif = value,
                _ => {}
            }
        }
        changes
    }

    fn to_params(&self) -> CustomerParams {
        let mut params = CustomerParams {
            name: self.name.clone(),
            phone: self.phone.clone(),
            description: self.description.clone(),
            preferred_locales: preferred_locales(self.language.as_ref()),
            address: self.address.clone(),
            metadata: self.metadata.clone(),
            ..CustomerParams::default()
        };
        if let Some(status) = self.status {
            params
                .metadata
                .insert(VerificationStatus::METADATA_KEY.to_owned(), status.as_str().to_owned());
        }
        params
    }
}

/// `@key=value` entries with the `@` stripped.
fn metadata_entries(pairs: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    pairs
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix('@')
                .filter(|key| !key.is_empty())
                .map(|key| (key.to_owned(), value.clone()))
        })
        .collect()
}

fn preferred_locales(language: Option<&Language>) -> Option<Vec<String>> {
    language
        .filter(|language| !language.is_auto())
        .map(|language| vec![language.as_str().to_owned()])
}

impl<A: PaymentApi> Billing<A> {
    /// Every customer, one page of at most 100.
    pub fn user_list(&self) -> impl Stream<Item = Result<Customer, BillingError>> + '_ {
        listing::lazy(move || async move {
            let query = CustomerQuery::all();
            self.api.list_customers(&query).await
        })
    }

    /// First customer registered with `email`, with subscriptions and tax ids
    /// expanded.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn user_search(&self, email: &str) -> Result<Option<Customer>, BillingError> {
        let query = CustomerQuery::by_email(email).expanded();
        let customers = self.api.list_customers(&query).await?;
        Ok(customers.into_iter().next())
    }

    /// Like [`Billing::user_search`] but absence is an error.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::UserNotFound` if no customer has the email.
    pub async fn user_lookup(&self, email: &str) -> Result<Customer, BillingError> {
        self.user_search(email)
            .await?
            .ok_or(BillingError::UserNotFound)
    }

    /// Id of the first customer registered with `email`.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn user_id(&self, email: &str) -> Result<Option<CustomerId>, BillingError> {
        let query = CustomerQuery::by_email(email);
        let customers = self.api.list_customers(&query).await?;
        Ok(customers.into_iter().next().map(|customer| customer.id))
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Fails with `UserExists` / `EmailNotVerified` if the email is taken, with
    /// `Password` if the password is too weak or cannot be hashed, and with
    /// `Stripe` if the API request fails.
    #[instrument(skip(self, password, user))]
    pub async fn user_add(
        &self,
        email: &str,
        password: &str,
        user: &NewUser,
    ) -> Result<Customer, BillingError> {
        let email = Email::parse(email)?;

        if let Some(existing) = self.user_search(email.as_str()).await? {
            return Err(if existing.status().is_verified() {
                BillingError::UserExists
            } else {
                BillingError::EmailNotVerified
            });
        }

        let password = password.trim();
        self.checker.check(password)?;
        let hash = self.hash_password(password)?;

        let mut metadata = user.metadata.clone();
        metadata.insert(HASH_METADATA_KEY.to_owned(), hash);
        metadata.insert(
            VerificationStatus::METADATA_KEY.to_owned(),
            user.status.as_str().to_owned(),
        );
        let params = CustomerParams {
            email: Some(email.into_inner()),
            preferred_locales: preferred_locales(user.language.as_ref()),
            metadata,
            ..CustomerParams::default()
        };

        let customer = self.api.create_customer(&params).await?;
        tracing::info!(id = %customer.id, "User added");
        Ok(customer)
    }

    /// Apply `changes` to the user registered with `email` and return the
    /// refreshed record.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no customer has the email, or `Stripe` if an
    /// API request fails.
    #[instrument(skip(self, changes))]
    pub async fn user_edit(
        &self,
        email: &str,
        changes: &UserChanges,
    ) -> Result<Customer, BillingError> {
        let user = self.user_lookup(email).await?;

        if let Some(cif) = &changes.cif {
            self.reconcile_tax_id(&user.id, TaxIdParams::es_cif(cif.as_str()))
                .await?;
        }

        self.api.update_customer(&user.id, &changes.to_params()).await?;
        tracing::info!(id = %user.id, "User edited");

        self.user_lookup(user.email_str()).await
    }

    /// Make `wanted` the only tax id of the customer.
    async fn reconcile_tax_id(
        &self,
        customer: &CustomerId,
        wanted: TaxIdParams,
    ) -> Result<(), BillingError> {
        let mut present = false;
        for tax_id in self.api.list_tax_ids(customer).await? {
            if tax_id.kind == wanted.kind && tax_id.value == wanted.value {
                present = true;
            } else {
                self.api.delete_tax_id(customer, &tax_id.id).await?;
            }
        }
        if !present {
            self.api.create_tax_id(customer, &wanted).await?;
        }
        Ok(())
    }

    /// Delete the user registered with `email`.
    ///
    /// An unknown email counts as already deleted.
    ///
    /// # Errors
    ///
    /// Returns error if an API request fails.
    #[instrument(skip(self))]
    pub async fn user_del(&self, email: &str) -> Result<bool, BillingError> {
        let Some(id) = self.user_id(email).await? else {
            tracing::debug!("No such user, nothing to delete");
            return Ok(true);
        };
        Ok(self.api.delete_customer(&id).await?)
    }

    /// Authenticate a user.
    ///
    /// The password matches when its hash equals the stored `hash1` or the
    /// configured master hash. A user without a stored hash never matches.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `MissingPasswordHash` or `InvalidPassword`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Customer, BillingError> {
        let user = self.user_lookup(email).await?;
        let hash = self.hash_password(password)?;
        let stored = user.hash1().ok_or(BillingError::MissingPasswordHash)?;

        if self.config.is_master_hash(&hash) {
            tracing::warn!(id = %user.id, "Login with the master password");
            return Ok(user);
        }
        if hashes_match(stored, &hash) {
            return Ok(user);
        }
        Err(BillingError::InvalidPassword)
    }

    /// Store a new password for the user. No strength check is made.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `Password` or `Stripe`.
    #[instrument(skip(self, password))]
    pub async fn change_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CustomerId, BillingError> {
        let user = self.user_lookup(email).await?;
        let hash = self.hash_password(password)?;

        let params = CustomerParams::default().with_metadata(HASH_METADATA_KEY, hash);
        self.api.update_customer(&user.id, &params).await?;
        tracing::info!(id = %user.id, "Password changed");
        Ok(user.id)
    }

    /// Issue a fresh validation code, mark the user unverified and mail them
    /// the validation link.
    ///
    /// # Errors
    ///
    /// Returns `Stripe` if the update fails, `MissingEmail` if the customer
    /// has no address and `Mail` if the mail cannot be built or sent.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn send_validation_mail(&self, id: &CustomerId) -> Result<(), BillingError> {
        let ecode = Uuid::new_v4().to_string();
        let params = CustomerParams::default()
            .with_metadata(ECODE_METADATA_KEY, ecode.as_str())
            .with_metadata(
                VerificationStatus::METADATA_KEY,
                VerificationStatus::Unverified.as_str(),
            );
        let user = self.api.update_customer(id, &params).await?;

        let email = user
            .email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| BillingError::MissingEmail(id.clone()))?;
        let mail = &self.config.mail;
        let url = validation_url(&mail.validation_url, &ecode, email)?;
        let message = compose_validation_mail(mail, email, &url)?;
        self.mailer.send(&message)?;

        tracing::info!(to = %email, "Validation mail sent");
        Ok(())
    }

    /// Confirm the user's address with the code from the validation mail.
    ///
    /// On success the user becomes verified and the code is rotated so it
    /// cannot be reused.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `MissingValidationCode`,
    /// `InvalidValidationCode` or `Stripe`.
    #[instrument(skip(self, ecode))]
    pub async fn validate(&self, email: &str, ecode: &str) -> Result<CustomerId, BillingError> {
        let user = self.user_lookup(email).await?;
        let stored = user.ecode().ok_or(BillingError::MissingValidationCode)?;
        if !hashes_match(stored, ecode) {
            return Err(BillingError::InvalidValidationCode);
        }

        let params = CustomerParams::default()
            .with_metadata(ECODE_METADATA_KEY, Uuid::new_v4().to_string())
            .with_metadata(
                VerificationStatus::METADATA_KEY,
                VerificationStatus::Verified.as_str(),
            );
        self.api.update_customer(&user.id, &params).await?;
        tracing::info!(id = %user.id, "Email validated");
        Ok(user.id)
    }

    /// Active subscriptions of a customer.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn paid_subscriptions(
        &self,
        customer: &CustomerId,
    ) -> Result<Vec<Subscription>, BillingError> {
        Ok(self.api.list_subscriptions(customer).await?)
    }
}

/// Products of the given subscriptions mapped to the subscribed price.
#[must_use]
pub fn subscribed_products(subscriptions: &[Subscription]) -> BTreeMap<ProductId, PriceId> {
    subscriptions
        .iter()
        .flat_map(|subscription| &subscription.items.data)
        .filter_map(|item| {
            let price = item.price.as_ref()?;
            let product = price.product.as_ref()?;
            Some((ProductId::from(product.id()), price.id.clone()))
        })
        .collect()
}
