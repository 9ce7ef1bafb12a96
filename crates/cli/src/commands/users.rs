//! User commands.

use std::io::Write;

use futures::{TryStreamExt, pin_mut};
use subkit_billing::users::subscribed_products;
use subkit_billing::{Billing, BillingError, NewUser, PaymentApi, UserChanges};
use subkit_core::ProductId;

use crate::args::Args;
use crate::error::CommandError;
use crate::render;

/// `user-list`: one line per customer.
pub async fn user_list<A: PaymentApi>(
    billing: &Billing<A>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let users = billing.user_list();
    pin_mut!(users);
    while let Some(user) = users.try_next().await? {
        render::user_line(out, &user)?;
    }
    Ok(())
}

/// `user-get-json e=EMAIL`: the customer resource as JSON.
pub async fn user_get_json<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email"])?;
    let user = billing.user_lookup(args.value("email")).await?;
    render::user_json(out, &user)?;
    Ok(())
}

/// `user-get-subs e=EMAIL [PRODUCT...]`: subscribed products.
///
/// With product arguments only the first one the user is subscribed to is
/// printed, so the output answers "which of these does the user have".
pub async fn user_get_subs<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email"])?;
    let user = billing.user_lookup(args.value("email")).await?;
    let products = subscribed_products(&billing.paid_subscriptions(&user.id).await?);

    if args.positional().is_empty() {
        for product in products.keys() {
            writeln!(out, "{product}")?;
        }
    } else if let Some(product) = args
        .positional()
        .iter()
        .find(|product| products.contains_key(&ProductId::from(product.as_str())))
    {
        writeln!(out, "{product}")?;
    }
    Ok(())
}

/// `user-info e=EMAIL`: the user record.
pub async fn user_info<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email"])?;
    let user = billing.user_lookup(args.value("email")).await?;
    render::user_record(out, &user)?;
    Ok(())
}

/// `user-add e=EMAIL p=PASSWORD [l=LANG] [v=yes] [@KEY=VALUE...]`.
pub async fn user_add<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email", "password"])?;
    let user = billing
        .user_add(
            args.value("email"),
            args.value("password"),
            &NewUser::from_pairs(args.pairs()),
        )
        .await?;
    render::user_line(out, &user)?;
    Ok(())
}

/// `user-del EMAIL...`: delete every listed user.
///
/// A failure is logged and the remaining users are still deleted; the
/// command fails at the end if any deletion did.
pub async fn user_del<A: PaymentApi>(
    billing: &Billing<A>,
    emails: &[String],
) -> Result<(), CommandError> {
    let mut failed = 0;
    for email in emails {
        if let Err(e) = billing.user_del(email).await {
            tracing::warn!(email = %email, error = %e, "Failed to delete user");
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(CommandError::UserDeletion { failed });
    }
    Ok(())
}

/// `user-edit e=EMAIL FIELD=VALUE...`: apply the changes and print the
/// refreshed record.
pub async fn user_edit<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email"])?;
    let user = billing
        .user_edit(args.value("email"), &UserChanges::from_pairs(args.pairs()))
        .await?;
    render::user_record(out, &user)?;
    Ok(())
}

/// `user-mail-v e=EMAIL`: send a fresh validation mail.
pub async fn user_mail_v<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email"])?;
    let id = billing
        .user_id(args.value("email"))
        .await?
        .ok_or(BillingError::UserNotFound)?;
    billing.send_validation_mail(&id).await?;
    Ok(())
}

/// `user-validate e=EMAIL ecode=CODE`: confirm the address and echo it.
pub async fn user_validate<A: PaymentApi>(
    billing: &Billing<A>,
    tokens: &[String],
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let args = Args::parse(tokens, &["email", "ecode"])?;
    billing
        .validate(args.value("email"), args.value("ecode"))
        .await?;
    writeln!(out, "{}", args.value("email"))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use subkit_billing::testing::{self, MemoryApi, RecordingMailer};
    use subkit_core::{CustomerId, VerificationStatus};

    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| (*t).to_owned()).collect()
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    fn with_user(email: &str) -> (Billing<MemoryApi>, CustomerId) {
        let api = MemoryApi::new();
        let id = api.insert_customer(testing::customer(email, VerificationStatus::Verified));
        (testing::billing(api), id)
    }

    #[tokio::test]
    async fn test_user_list() {
        let api = MemoryApi::new();
        api.insert_customer(testing::customer("a@example.com", VerificationStatus::Verified));
        api.insert_customer(testing::customer("b@example.com", VerificationStatus::Unverified));
        let billing = testing::billing(api);

        let mut out = Vec::new();
        user_list(&billing, &mut out).await.unwrap();
        let text = output(out);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("a@example.com"));
        assert!(text.contains("unverified"));
    }

    #[tokio::test]
    async fn test_lookups_of_unknown_email_fail() {
        let (billing, _) = with_user("a@example.com");
        let args = tokens(&["e=nobody@example.com"]);

        let err = user_get_json(&billing, &args, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "user not found");
        let err = user_info(&billing, &args, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "user not found");
        let err = user_get_subs(&billing, &args, &mut Vec::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "user not found");
        let err = user_mail_v(&billing, &args).await.unwrap_err();
        assert_eq!(err.to_string(), "user not found");
    }

    #[tokio::test]
    async fn test_user_get_json() {
        let (billing, id) = with_user("a@example.com");
        let mut out = Vec::new();
        user_get_json(&billing, &tokens(&["e=a@example.com"]), &mut out)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(value["id"], id.as_str());
        assert_eq!(value["email"], "a@example.com");
    }

    #[tokio::test]
    async fn test_user_get_subs() {
        let (billing, id) = with_user("a@example.com");
        billing
            .api()
            .insert_subscription(&id, "active", &[("prod_a", "price_a"), ("prod_b", "price_b")]);
        billing
            .api()
            .insert_subscription(&id, "canceled", &[("prod_c", "price_c")]);
        let email = "e=a@example.com";

        let mut out = Vec::new();
        user_get_subs(&billing, &tokens(&[email]), &mut out).await.unwrap();
        assert_eq!(output(out), "prod_a\nprod_b\n");

        let mut out = Vec::new();
        user_get_subs(&billing, &tokens(&[email, "prod_c", "prod_b", "prod_a"]), &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "prod_b\n");

        let mut out = Vec::new();
        user_get_subs(&billing, &tokens(&[email, "prod_c"]), &mut out)
            .await
            .unwrap();
        assert_eq!(output(out), "");
    }

    #[tokio::test]
    async fn test_user_add_and_info() {
        let billing = testing::billing(MemoryApi::new());
        let mut out = Vec::new();
        user_add(
            &billing,
            &tokens(&["e=new@example.com", "p=pw", "l=es", "@plan=gold"]),
            &mut out,
        )
        .await
        .unwrap();
        let line = output(out);
        assert!(line.contains("new@example.com"));
        assert!(line.contains("lang=es"));

        let mut out = Vec::new();
        user_info(&billing, &tokens(&["e=new@example.com"]), &mut out)
            .await
            .unwrap();
        let record = output(out);
        assert!(record.contains("Verified: unverified\n"));
        assert!(record.contains("Email: new@example.com\n"));
        assert!(record.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_user_add_requires_password() {
        let billing = testing::billing(MemoryApi::new());
        let err = user_add(&billing, &tokens(&["e=new@example.com"]), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing parameters: password");
        assert_eq!(billing.api().customer_count(), 0);
    }

    #[tokio::test]
    async fn test_user_del_continues_after_failure() {
        let api = MemoryApi::new();
        api.insert_customer(testing::customer("a@example.com", VerificationStatus::Verified));
        api.insert_customer(testing::customer("b@example.com", VerificationStatus::Verified));
        let billing = testing::billing(api);

        user_del(&billing, &tokens(&["a@example.com", "ghost@example.com"]))
            .await
            .unwrap();
        assert_eq!(billing.api().customer_count(), 1);

        billing.api().set_unavailable(true);
        let err = user_del(&billing, &tokens(&["b@example.com", "c@example.com"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::UserDeletion { failed: 2 }));
    }

    #[tokio::test]
    async fn test_user_edit_prints_record() {
        let (billing, _) = with_user("a@example.com");
        let mut out = Vec::new();
        user_edit(
            &billing,
            &tokens(&["e=a@example.com", "name=Ana", "city=Bilbao", "cif=B12345678"]),
            &mut out,
        )
        .await
        .unwrap();
        let record = output(out);
        assert!(record.contains("Name: Ana\n"));
        assert!(record.contains("City: Bilbao\n"));
        assert!(record.contains("TaxID: B12345678\n"));
    }

    #[tokio::test]
    async fn test_mail_then_validate() {
        let mailer = RecordingMailer::default();
        let api = MemoryApi::new();
        api.insert_customer(testing::customer("a@example.com", VerificationStatus::Verified));
        let billing = testing::billing(api).with_mailer(mailer.clone());

        user_mail_v(&billing, &tokens(&["e=a@example.com"])).await.unwrap();
        assert_eq!(mailer.messages().len(), 1);

        let user = billing.api().customer_by_email("a@example.com").unwrap();
        assert!(!user.status().is_verified());
        let ecode = user.ecode().unwrap().to_owned();

        let err = user_validate(
            &billing,
            &tokens(&["e=a@example.com", "ecode=wrong"]),
            &mut Vec::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid verification code");

        let mut out = Vec::new();
        user_validate(
            &billing,
            &tokens(&["e=a@example.com", &format!("ecode={ecode}")]),
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(output(out), "a@example.com\n");
        let user = billing.api().customer_by_email("a@example.com").unwrap();
        assert!(user.status().is_verified());
    }
}
