//! Status enums for carts and orders.

use serde::{Deserialize, Serialize};

/// Observable state of a cart.
///
/// Checkout is only permitted from [`CartState::NonEmpty`] and a successful
/// checkout always returns the cart to [`CartState::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartState {
    #[default]
    Empty,
    NonEmpty,
}

impl CartState {
    /// Derive the state from the number of line items.
    #[must_use]
    pub const fn from_line_count(lines: usize) -> Self {
        if lines == 0 { Self::Empty } else { Self::NonEmpty }
    }

    /// Whether a checkout may start from this state.
    #[must_use]
    pub const fn can_checkout(self) -> bool {
        matches!(self, Self::NonEmpty)
    }
}

impl std::fmt::Display for CartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::NonEmpty => write!(f, "non_empty"),
        }
    }
}

/// Status of a submitted order as reported by the order backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received but not yet confirmed by the vendor.
    #[default]
    Pending,
    /// Confirmed by the vendor.
    Accepted,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
