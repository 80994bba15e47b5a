//! Cart error types.

use bitebox_core::ProductId;
use thiserror::Error;

/// Errors returned by [`crate::CartStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Malformed input such as a negative price or a zero quantity.
    ///
    /// Inputs are never clamped into range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced line item does not exist.
    ///
    /// The UI only offers quantity controls for existing items, so callers
    /// should treat this as a logic error rather than a user-facing condition.
    #[error("Item not found: {0}")]
    NotFound(ProductId),

    /// The cart is locked while a checkout submission is pending.
    #[error("Cart is locked while a checkout is in progress")]
    CheckoutInProgress,

    /// The pricing policy produced an amount the cart cannot use.
    #[error("Pricing error: {0}")]
    Pricing(String),
}

impl CartError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::NotFound(ProductId::new("sushi-12"));
        assert_eq!(err.to_string(), "Item not found: sushi-12");

        let err = CartError::invalid("quantity must be at least 1");
        assert_eq!(err.to_string(), "Invalid argument: quantity must be at least 1");
    }
}
