//! BiteBox cart library.
//!
//! Holds the line items a customer intends to purchase, derives pricing
//! totals from them and drives checkout against an injected order backend.
//!
//! # Architecture
//!
//! - [`CartStore`] is created once per customer session and passed to every
//!   screen that needs it. It is a cheap `Arc` handle, not a global.
//! - Delivery fee and tax come from an injected [`PricingPolicy`].
//! - [`CheckoutService`] snapshots the cart, hands the snapshot to an
//!   [`OrderSubmitter`] and clears the cart only on success.
//! - [`CartRepository`] persists the line items between process restarts.
//!
//! # Example
//!
//! ```rust
//! use bitebox_cart::{CartStore, DeliveryFee, StandardPricing, TaxRate};
//! use bitebox_core::{CurrencyCode, Money};
//! use rust_decimal::Decimal;
//!
//! let pricing = StandardPricing::new(
//!     DeliveryFee::flat(Decimal::new(299, 2)).unwrap(),
//!     TaxRate::new(Decimal::new(8, 2)).unwrap(),
//! );
//! let cart = CartStore::new(CurrencyCode::USD, pricing);
//!
//! let price = Money::parse("5.00", CurrencyCode::USD).unwrap();
//! cart.add_item("A", "Spring rolls", price, 2).unwrap();
//! cart.add_item("A", "Spring rolls", price, 1).unwrap();
//!
//! assert_eq!(cart.subtotal().to_string(), "$15.00");
//! assert_eq!(cart.tax().to_string(), "$1.20");
//! assert_eq!(cart.total().to_string(), "$19.19");
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod error;
pub mod line_item;
pub mod persistence;
pub mod pricing;
pub mod snapshot;
pub mod store;

pub use checkout::{CheckoutError, CheckoutService, OrderConfirmation, OrderSubmitter, SubmissionError};
pub use error::CartError;
pub use line_item::LineItem;
pub use persistence::{
    CartRepository, JsonFileCartRepository, PersistenceError, STORED_CART_VERSION, StoredCart,
};
pub use pricing::{DeliveryFee, FeeTier, PricingError, PricingPolicy, StandardPricing, TaxRate};
pub use snapshot::{CartSnapshot, CartTotals};
pub use store::{CartStore, CheckoutGuard};
