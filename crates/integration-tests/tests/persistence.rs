//! Integration tests for saving and restoring carts.

#![allow(clippy::unwrap_used)]

use bitebox_cart::{
    CartRepository, CartStore, JsonFileCartRepository, PersistenceError, STORED_CART_VERSION,
    StandardPricing, StoredCart,
};
use bitebox_core::CurrencyCode;
use bitebox_integration_tests::{standard_cart, usd_cents};

#[tokio::test]
async fn test_restored_cart_prices_identically() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileCartRepository::new(dir.path().join("cart.json"));

    let cart = standard_cart();
    cart.add_item("tacos", "Fish tacos", usd_cents(1150), 2).unwrap();
    cart.add_item("salsa", "Salsa verde", usd_cents(150), 3).unwrap();
    repo.save(&StoredCart::from_store(&cart)).await.unwrap();

    let restored = standard_cart();
    repo.load()
        .await
        .unwrap()
        .unwrap()
        .restore_into(&restored)
        .unwrap();

    assert_eq!(restored.items(), cart.items());
    assert_eq!(restored.totals(), cart.totals());
}

#[tokio::test]
async fn test_saved_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cart.json");
    let repo = JsonFileCartRepository::new(&path);

    let cart = standard_cart();
    cart.add_item("tacos", "Fish tacos", usd_cents(1150), 2).unwrap();
    repo.save(&StoredCart::from_store(&cart)).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
    assert_eq!(json["version"], STORED_CART_VERSION);
    assert_eq!(json["currency"], "USD");
    assert_eq!(json["items"][0]["product_id"], "tacos");
    assert_eq!(json["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_restore_into_other_currency_fails() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileCartRepository::new(dir.path().join("cart.json"));

    let cart = standard_cart();
    cart.add_item("tacos", "Fish tacos", usd_cents(1150), 1).unwrap();
    repo.save(&StoredCart::from_store(&cart)).await.unwrap();

    let euro_cart = CartStore::new(CurrencyCode::EUR, StandardPricing::default());
    let stored = repo.load().await.unwrap().unwrap();

    assert!(matches!(
        stored.restore_into(&euro_cart),
        Err(PersistenceError::CurrencyMismatch { .. })
    ));
    assert!(euro_cart.is_empty());
}

#[tokio::test]
async fn test_restore_replaces_existing_contents() {
    let cart = standard_cart();
    cart.add_item("old", "Yesterday's soup", usd_cents(400), 1).unwrap();

    let source = standard_cart();
    source.add_item("new", "Fresh salad", usd_cents(700), 1).unwrap();
    StoredCart::from_store(&source).restore_into(&cart).unwrap();

    assert!(cart.item("old").is_none());
    assert_eq!(cart.item("new").unwrap().quantity(), 1);
}
