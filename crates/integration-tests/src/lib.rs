//! Integration tests for BiteBox.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bitebox-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_properties` - Property tests over random cart edit sequences
//! - `checkout_flow` - Checkout against scripted order backends
//! - `persistence` - Saving and restoring carts through the JSON repository
//!
//! This library holds the fixtures those tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use bitebox_cart::{
    CartSnapshot, CartStore, DeliveryFee, OrderConfirmation, OrderSubmitter, StandardPricing,
    SubmissionError, TaxRate,
};
use bitebox_core::{CurrencyCode, Money, OrderStatus};
use rust_decimal::Decimal;

/// Flat delivery fee used by [`standard_cart`].
pub const DELIVERY_FEE_CENTS: i64 = 299;

/// Tax rate used by [`standard_cart`], in percent.
pub const TAX_PERCENT: i64 = 8;

/// USD amount from a count of cents.
#[must_use]
pub fn usd_cents(cents: i64) -> Money {
    Money::from_minor_units(cents, CurrencyCode::USD)
}

/// Flat 2.99 delivery and 8% tax.
///
/// # Panics
///
/// Panics if the fixture constants stop being a valid policy.
#[must_use]
pub fn standard_pricing() -> StandardPricing {
    StandardPricing::new(
        DeliveryFee::flat(Decimal::new(DELIVERY_FEE_CENTS, 2))
            .expect("fixture delivery fee is valid"),
        TaxRate::new(Decimal::new(TAX_PERCENT, 2)).expect("fixture tax rate is valid"),
    )
}

/// Empty USD cart priced with [`standard_pricing`].
#[must_use]
pub fn standard_cart() -> CartStore {
    CartStore::new(CurrencyCode::USD, standard_pricing())
}

/// Outcome a [`ScriptedSubmitter`] reports for every submission.
#[derive(Debug, Clone)]
pub enum Script {
    Accept,
    Fail(SubmissionError),
}

/// Order backend that records every snapshot it receives.
#[derive(Debug, Clone)]
pub struct ScriptedSubmitter {
    script: Script,
    received: Arc<Mutex<Vec<CartSnapshot>>>,
}

impl ScriptedSubmitter {
    #[must_use]
    pub fn accepting() -> Self {
        Self::new(Script::Accept)
    }

    #[must_use]
    pub fn failing(error: SubmissionError) -> Self {
        Self::new(Script::Fail(error))
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshots submitted so far, oldest first.
    #[must_use]
    pub fn received(&self) -> Vec<CartSnapshot> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl OrderSubmitter for ScriptedSubmitter {
    async fn submit(&self, snapshot: &CartSnapshot) -> Result<OrderConfirmation, SubmissionError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());

        match &self.script {
            Script::Accept => Ok(OrderConfirmation::for_snapshot(
                snapshot,
                OrderStatus::Accepted,
            )),
            Script::Fail(error) => Err(error.clone()),
        }
    }
}
