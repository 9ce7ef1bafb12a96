//! Newtype IDs for type-safe Stripe object references.
//!
//! Stripe identifies every object with an opaque, prefixed string
//! (`cus_...`, `prod_...`, `price_...`). Use the `define_id!` macro to create
//! wrappers that prevent accidentally passing a price id where a customer id
//! is expected.

/// Macro to define a type-safe Stripe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Default`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use subkit_core::define_id;
/// define_id!(InvoiceId);
/// define_id!(CouponId);
///
/// let invoice = InvoiceId::new("in_123");
/// assert_eq!(invoice.as_str(), "in_123");
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = invoice;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a Stripe object id.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying id string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.pad(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(CustomerId);
define_id!(ProductId);
define_id!(PriceId);
define_id!(TaxRateId);
define_id!(TaxIdId);
define_id!(SubscriptionId);
define_id!(CheckoutSessionId);
