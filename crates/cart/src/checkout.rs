//! Checkout: snapshot the cart, submit it, clear on success.
//!
//! The flow is:
//! 1. Lock the cart against mutation and snapshot items and totals
//! 2. Hand the snapshot to the [`OrderSubmitter`]
//! 3. On success, clear the cart exactly once and return the confirmation
//! 4. On failure, release the lock with the cart untouched and surface the
//!    submitter's error unchanged

use async_trait::async_trait;
use bitebox_core::{Money, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::error::CartError;
use crate::snapshot::CartSnapshot;
use crate::store::CartStore;

/// Errors reported by an [`OrderSubmitter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The backend refused the order (e.g., restaurant closed, item sold out).
    #[error("Order rejected: {0}")]
    Rejected(String),

    /// Payment was declined.
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    /// The backend could not be reached; safe to retry.
    #[error("Order service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from [`CheckoutService::checkout`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requires at least one item.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// Another checkout already holds the cart.
    #[error("A checkout is already in progress")]
    InProgress,

    /// The pricing policy cannot price the cart; nothing was submitted.
    #[error("Cannot price the cart: {0}")]
    Pricing(CartError),

    /// The submitter failed; the cart is unchanged and may be retried.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Receipt for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub status: OrderStatus,
    /// Amount charged, as taken from the submitted snapshot.
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

impl OrderConfirmation {
    /// Confirmation for `snapshot` with a freshly generated order ID.
    #[must_use]
    pub fn for_snapshot(snapshot: &CartSnapshot, status: OrderStatus) -> Self {
        Self {
            order_id: OrderId::generate(),
            status,
            total: snapshot.totals.total,
            placed_at: Utc::now(),
        }
    }
}

/// Collaborator that turns a checkout snapshot into an order.
///
/// Only the checkout flow calls this; the cart never does.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    /// Submit an order for the given snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmissionError`] if the order could not be placed.
    async fn submit(&self, snapshot: &CartSnapshot) -> Result<OrderConfirmation, SubmissionError>;
}

/// Drives checkout for carts against one order submitter.
pub struct CheckoutService<S> {
    submitter: S,
}

impl<S: OrderSubmitter> CheckoutService<S> {
    /// Create a checkout service.
    #[must_use]
    pub const fn new(submitter: S) -> Self {
        Self { submitter }
    }

    /// Get a reference to the order submitter.
    #[must_use]
    pub const fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Check out `cart`.
    ///
    /// The cart is locked for the whole submission so no concurrent update
    /// can slip in between the snapshot and the clear. If the returned future
    /// is dropped before completion the lock is released and the cart is left
    /// as it was.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`] if the cart has no items
    /// - [`CheckoutError::InProgress`] if a checkout is already pending
    /// - [`CheckoutError::Pricing`] if the cart cannot be priced
    /// - [`CheckoutError::Submission`] with the submitter's error, unchanged
    #[instrument(skip(self, cart), fields(currency = %cart.currency()))]
    pub async fn checkout(&self, cart: &CartStore) -> Result<OrderConfirmation, CheckoutError> {
        let guard = cart.begin_checkout()?;
        let snapshot = guard.snapshot();
        info!(
            lines = snapshot.items.len(),
            items = snapshot.item_count(),
            total = %snapshot.totals.total,
            "Submitting order"
        );

        match self.submitter.submit(snapshot).await {
            Ok(confirmation) => {
                guard.complete();
                info!(
                    order_id = %confirmation.order_id,
                    status = %confirmation.status,
                    "Order submitted, cart cleared"
                );
                Ok(confirmation)
            }
            Err(e) => {
                drop(guard);
                warn!(error = %e, "Order submission failed, cart left unchanged");
                Err(CheckoutError::Submission(e))
            }
        }
    }
}
