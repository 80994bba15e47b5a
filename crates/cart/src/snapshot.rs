//! Point-in-time views of a cart.

use bitebox_core::{CurrencyCode, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::line_item::LineItem;

/// Derived pricing for a cart, computed in a single critical section.
///
/// `total == subtotal + delivery_fee + tax` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub tax: Money,
    pub total: Money,
    /// Sum of quantities across all lines.
    pub item_count: u64,
}

impl CartTotals {
    /// Totals of a cart with nothing priced.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            subtotal: Money::zero(currency_code),
            delivery_fee: Money::zero(currency_code),
            tax: Money::zero(currency_code),
            total: Money::zero(currency_code),
            item_count: 0,
        }
    }
}

/// Immutable copy of the cart handed to the order backend at checkout.
///
/// Taken atomically, so later cart mutations never show up in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub currency: CurrencyCode,
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
    pub taken_at: DateTime<Utc>,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn item_count(&self) -> u64 {
        self.totals.item_count
    }
}
