//! `subscribe`: open a subscription checkout session.

use std::io::Write;

use subkit_billing::{Billing, CheckoutRequest, PaymentApi};

use crate::args::Args;
use crate::error::CommandError;
use crate::render;

/// `subscribe us=URL uc=URL (c=CUSTOMER | e=EMAIL) [r=REF] [t=TAX] [browse=y]
/// @PRODUCT=QTY[,TAX]...`.
///
/// Prints the session, or opens its URL when `browse=y`.
pub async fn subscribe<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &[])?;
    let request =
        CheckoutRequest::from_pairs(args.pairs(), billing.config().default_tax_rate.as_ref())?;
    let session = billing.subscribe(&request).await?;

    match (args.get("browse"), session.url.as_deref()) {
        (Some("y"), Some(url)) => billing.open_link(url)?,
        _ => render::session_record(out, &session)?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use subkit_billing::testing::{self, MemoryApi, RecordingOpener};
    use subkit_core::{TaxRateId, VerificationStatus};

    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| (*t).to_owned()).collect()
    }

    fn shop() -> MemoryApi {
        let api = MemoryApi::new();
        api.insert_customer(testing::customer("a@example.com", VerificationStatus::Verified));
        api.insert_product(testing::product("prod_a", "Pro", Some(("price_a", 900))));
        api
    }

    const BASE: [&str; 3] = ["us=https://example.com/ok", "uc=https://example.com/ko", "e=a@example.com"];

    #[tokio::test]
    async fn test_prints_session() {
        let billing = testing::billing(shop());
        let mut args = tokens(&BASE);
        args.push("@prod_a=2,txr_1".to_owned());

        let mut out = Vec::new();
        subscribe(&billing, &args, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ID: cs_"));
        assert!(text.contains("\nURL: "));
    }

    #[tokio::test]
    async fn test_browse_opens_url() {
        let opener = RecordingOpener::default();
        let billing = testing::billing(shop()).with_opener(opener.clone());
        let mut args = tokens(&BASE);
        args.push("@prod_a=1,txr_1".to_owned());
        args.push("browse=y".to_owned());

        let mut out = Vec::new();
        subscribe(&billing, &args, &mut out).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(opener.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_uses_configured_default_tax() {
        let mut config = testing::config();
        config.default_tax_rate = Some(TaxRateId::from("txr_default"));
        let billing = testing::billing_with_config(shop(), config);
        let mut args = tokens(&BASE);
        args.push("@prod_a=1".to_owned());

        subscribe(&billing, &args, &mut Vec::new()).await.unwrap();
        let sessions = billing.api().checkout_sessions();
        let item = sessions.first().unwrap().line_items.first().unwrap();
        assert_eq!(item.tax_rates, [TaxRateId::from("txr_default")]);
    }

    #[tokio::test]
    async fn test_missing_products() {
        let billing = testing::billing(shop());
        let err = subscribe(&billing, &tokens(&BASE), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "missing product list");
    }
}
