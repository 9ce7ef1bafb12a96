//! Catalog commands: `tax-list`, `prod-list` and `prod-price`.

use std::io::Write;

use futures::{TryStreamExt, pin_mut};
use subkit_billing::{Billing, PaymentApi};
use subkit_core::ProductId;

use crate::error::CommandError;
use crate::render;

/// `tax-list`: one line per tax rate.
pub async fn tax_list<A: PaymentApi>(
    billing: &Billing<A>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let rates = billing.tax_rates();
    pin_mut!(rates);
    while let Some(rate) = rates.try_next().await? {
        render::tax_line(out, &rate)?;
    }
    Ok(())
}

/// `prod-list`: one line per product with its default price.
pub async fn prod_list<A: PaymentApi>(
    billing: &Billing<A>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let products = billing.products();
    pin_mut!(products);
    while let Some(product) = products.try_next().await? {
        render::product_line(out, &product)?;
    }
    Ok(())
}

/// `prod-price PRODUCT...`: the default price of each product, in order.
///
/// Stops at the first product that cannot be resolved.
pub async fn prod_price<A: PaymentApi>(
    billing: &Billing<A>,
    products: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    for product in products {
        let price = billing.product_price(&ProductId::from(product.as_str())).await?;
        writeln!(out, "{price}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use subkit_billing::BillingError;
    use subkit_billing::testing::{self, MemoryApi};

    use super::*;

    fn catalog() -> Billing<MemoryApi> {
        let api = MemoryApi::new();
        api.insert_product(testing::product("prod_a", "Pro", Some(("price_a", 1500))));
        api.insert_product(testing::product("prod_b", "Free", None));
        api.insert_tax_rate(testing::tax_rate("txr_1", "IVA", 21.0));
        testing::billing(api)
    }

    #[tokio::test]
    async fn test_tax_list() {
        let mut out = Vec::new();
        tax_list(&catalog(), &mut out).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "txr_1 ES IVA 21.000000 active=true\n"
        );
    }

    #[tokio::test]
    async fn test_prod_list() {
        let mut out = Vec::new();
        prod_list(&catalog(), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("n=Pro"));
        assert!(text.contains("n=Free"));
    }

    #[tokio::test]
    async fn test_prod_price() {
        let billing = catalog();
        let mut out = Vec::new();
        prod_price(&billing, &["prod_a".to_owned()], &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "price_a\n");

        let mut out = Vec::new();
        let err = prod_price(&billing, &["prod_a".to_owned(), "prod_b".to_owned()], &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Billing(BillingError::NoDefaultPrice(_))));
        assert_eq!(String::from_utf8(out).unwrap(), "price_a\n");
    }

    #[tokio::test]
    async fn test_listing_failure() {
        let billing = catalog();
        billing.api().set_unavailable(true);
        let err = tax_list(&billing, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, CommandError::Billing(BillingError::Stripe(_))));
    }
}
