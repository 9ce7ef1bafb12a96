//! Billing operations end to end over HTTP.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use futures::TryStreamExt;
use mockito::Matcher;
use serde_json::json;
use subkit_billing::stripe::Customer;
use subkit_billing::testing::test_hash;
use subkit_billing::{BillingError, CheckoutRequest, NewUser, StripeError};
use subkit_core::CustomerId;
use subkit_integration_tests::{MockStripe, list};

fn customer_json(email: &str, hash1: &str) -> serde_json::Value {
    json!({
        "id": "cus_1",
        "object": "customer",
        "email": email,
        "metadata": {"hash1": hash1, "status": "verified"},
        "preferred_locales": ["eu"],
        "tax_ids": {"object": "list", "data": [], "has_more": false}
    })
}

async fn mock_search(stripe: &mut MockStripe, email: &str, found: &[serde_json::Value]) {
    stripe
        .server
        .mock("GET", "/v1/customers")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("email".into(), email.into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(list(json!(found)))
        .create_async()
        .await;
}

#[tokio::test]
async fn test_login() {
    let mut stripe = MockStripe::new().await;
    let email = "ana@example.com";
    mock_search(&mut stripe, email, &[customer_json(email, &test_hash("pw"))]).await;
    let billing = stripe.billing();

    let user = billing.login(email, "pw").await.unwrap();
    assert_eq!(user.id, CustomerId::from("cus_1"));
    assert_eq!(user.language(), "eu");

    let err = billing.login(email, "wrong").await.unwrap_err();
    assert!(matches!(err, BillingError::InvalidPassword));
}

#[tokio::test]
async fn test_login_unknown_user() {
    let mut stripe = MockStripe::new().await;
    mock_search(&mut stripe, "ghost@example.com", &[]).await;
    let billing = stripe.billing();

    let err = billing.login("ghost@example.com", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), "user not found");
}

#[tokio::test]
async fn test_user_add_posts_hash_and_status() {
    let mut stripe = MockStripe::new().await;
    let email = "new@example.com";
    mock_search(&mut stripe, email, &[]).await;
    let create = stripe
        .server
        .mock("POST", "/v1/customers")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("email".into(), email.into()),
            Matcher::UrlEncoded("metadata[hash1]".into(), test_hash("pw")),
            Matcher::UrlEncoded("metadata[status]".into(), "unverified".into()),
            Matcher::UrlEncoded("metadata[plan]".into(), "gold".into()),
            Matcher::UrlEncoded("preferred_locales[0]".into(), "es".into()),
        ]))
        .with_status(200)
        .with_body(json!({"id": "cus_9", "email": email}).to_string())
        .create_async()
        .await;

    let pairs = BTreeMap::from([
        ("language".to_owned(), "es".to_owned()),
        ("@plan".to_owned(), "gold".to_owned()),
    ]);
    let user = stripe
        .billing()
        .user_add(email, " pw ", &NewUser::from_pairs(&pairs))
        .await
        .unwrap();
    create.assert_async().await;
    assert_eq!(user.id, CustomerId::from("cus_9"));
}

#[tokio::test]
async fn test_user_list_streams_customers() {
    let mut stripe = MockStripe::new().await;
    stripe
        .server
        .mock("GET", "/v1/customers")
        .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
        .with_status(200)
        .with_body(list(json!([
            customer_json("a@example.com", "x"),
            {"id": "cus_2", "email": "b@example.com"}
        ])))
        .create_async()
        .await;

    let billing = stripe.billing();
    let users: Vec<Customer> = billing.user_list().try_collect().await.unwrap();
    let emails: Vec<_> = users.iter().map(Customer::email_str).collect();
    assert_eq!(emails, ["a@example.com", "b@example.com"]);
}

#[tokio::test]
async fn test_subscribe() {
    let mut stripe = MockStripe::new().await;
    let email = "ana@example.com";
    mock_search(&mut stripe, email, &[customer_json(email, "x")]).await;
    stripe
        .server
        .mock("GET", "/v1/products/prod_a")
        .with_status(200)
        .with_body(json!({"id": "prod_a", "name": "Pro", "default_price": "price_a"}).to_string())
        .create_async()
        .await;
    let session = stripe
        .server
        .mock("POST", "/v1/checkout/sessions")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("customer".into(), "cus_1".into()),
            Matcher::UrlEncoded("line_items[0][price]".into(), "price_a".into()),
            Matcher::UrlEncoded("line_items[0][quantity]".into(), "3".into()),
            Matcher::UrlEncoded("line_items[0][tax_rates][0]".into(), "txr_1".into()),
        ]))
        .with_status(200)
        .with_body(json!({"id": "cs_1", "url": "https://checkout.stripe.com/c/pay/cs_1"}).to_string())
        .create_async()
        .await;

    let pairs = BTreeMap::from([
        ("url_success".to_owned(), "https://example.com/ok".to_owned()),
        ("url_cancel".to_owned(), "https://example.com/ko".to_owned()),
        ("email".to_owned(), email.to_owned()),
        ("@prod_a".to_owned(), "3,txr_1".to_owned()),
    ]);
    let request = CheckoutRequest::from_pairs(&pairs, None).unwrap();
    let created = stripe.billing().subscribe(&request).await.unwrap();

    session.assert_async().await;
    assert_eq!(created.id.as_str(), "cs_1");
}

#[tokio::test]
async fn test_remote_failure_surfaces() {
    let mut stripe = MockStripe::new().await;
    stripe
        .server
        .mock("GET", "/v1/customers")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(json!({"error": {"message": "Something went wrong"}}).to_string())
        .create_async()
        .await;

    let err = stripe
        .billing()
        .user_search("ana@example.com")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Stripe(StripeError::Api { status: 500, .. })
    ));
}
