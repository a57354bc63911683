//! Checkout against the stub payment endpoint.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use shopaholic_core::{Coupon, PaymentMethod, ProductId};
use shopaholic_integration_tests::{StubBackend, StubServer, product};
use shopaholic_storefront::api::AccountDetails;
use shopaholic_storefront::storage::{MemoryStorage, Storage};
use shopaholic_storefront::{SessionError, StorefrontSession};

async fn server() -> StubServer {
    StubServer::start(StubBackend::with_products(Vec::new()))
        .await
        .expect("Failed to start stub backend")
}

fn session_with_items(storage: &MemoryStorage) -> StorefrontSession {
    let mut session = StorefrontSession::open(Arc::new(storage.clone()));
    let coke = product("2", "Cool Drinks", "Coca Cola", 5000);
    session.add_or_increment(&coke).expect("save failed");
    session.add_or_increment(&coke).expect("save failed");
    session
        .add_or_increment(&product("1", "Cool Drinks", "Pepsi", 100))
        .expect("save failed");
    session
}

fn card() -> AccountDetails {
    AccountDetails::Card {
        card_number: SecretString::from("4111111111111111".to_string()),
        expiry: "12/30".to_string(),
        cvv: SecretString::from("123".to_string()),
        card_holder: "Asha Rao".to_string(),
    }
}

#[tokio::test]
async fn test_successful_checkout_clears_cart() {
    let server = server().await;
    let storage = MemoryStorage::new();
    let mut session = session_with_items(&storage);

    let receipt = session
        .checkout(
            &server.client(),
            PaymentMethod::Card,
            Some(card()),
            Coupon::apply("save10"),
        )
        .await
        .expect("checkout failed");

    assert!(receipt.is_accepted());
    assert!(session.cart().is_empty());
    assert_eq!(
        storage.get("cart").expect("read failed").as_deref(),
        Some("[]")
    );

    let payments = server.backend.payments();
    assert_eq!(payments.len(), 1);
    assert_eq!(
        payments.first(),
        Some(&json!({
            "method": "card",
            "coupon": "SAVE10",
            "discount": 10,
            "items": [
                { "name": "Coca Cola", "price": 5000, "quantity": 2 },
                { "name": "Pepsi", "price": 100, "quantity": 1 },
            ],
            "accountDetails": {
                "cardNumber": "4111111111111111",
                "expiry": "12/30",
                "cvv": "123",
                "cardHolder": "Asha Rao",
            },
        }))
    );
}

#[tokio::test]
async fn test_declined_payment_keeps_cart() {
    let server = server().await;
    server.backend.decline_payments(true);
    let storage = MemoryStorage::new();
    let mut session = session_with_items(&storage);
    let before = session.cart().clone();

    let result = session
        .checkout(&server.client(), PaymentMethod::Card, Some(card()), None)
        .await;

    match result {
        Err(SessionError::Payment(message)) => assert_eq!(message, "Card declined"),
        other => panic!("expected Payment error, got {other:?}"),
    }
    assert_eq!(session.cart(), &before);
    assert_eq!(session.cart().quantity_of(&ProductId::new("2")), 2);

    // The cart is still there for a retry.
    server.backend.decline_payments(false);
    session
        .checkout(&server.client(), PaymentMethod::Card, Some(card()), None)
        .await
        .expect("retry failed");
    assert!(session.cart().is_empty());
}

#[tokio::test]
async fn test_empty_cart_is_not_sent() {
    let server = server().await;
    let mut session = StorefrontSession::open(Arc::new(MemoryStorage::new()));

    let result = session
        .checkout(&server.client(), PaymentMethod::Cod, None, None)
        .await;

    assert!(matches!(result, Err(SessionError::EmptyCart)));
    assert!(server.backend.payments().is_empty());
}

#[tokio::test]
async fn test_cash_on_delivery_sends_no_account_details() {
    let server = server().await;
    let storage = MemoryStorage::new();
    let mut session = session_with_items(&storage);

    // Card details supplied alongside COD are dropped.
    session
        .checkout(&server.client(), PaymentMethod::Cod, Some(card()), None)
        .await
        .expect("checkout failed");

    let payments = server.backend.payments();
    let payment = payments.first().expect("payment recorded");
    assert_eq!(payment["method"], "cod");
    assert_eq!(payment["discount"], 0);
    assert!(payment["coupon"].is_null());
    assert!(payment.get("accountDetails").is_none());
}

#[tokio::test]
async fn test_upi_checkout_sends_upi_id() {
    let server = server().await;
    let storage = MemoryStorage::new();
    let mut session = session_with_items(&storage);

    session
        .checkout(
            &server.client(),
            PaymentMethod::Upi,
            Some(AccountDetails::Upi {
                upi_id: "asha@okbank".to_string(),
            }),
            None,
        )
        .await
        .expect("checkout failed");

    let payments = server.backend.payments();
    let payment = payments.first().expect("payment recorded");
    assert_eq!(payment["accountDetails"], json!({ "upiId": "asha@okbank" }));
}
