//! Cart line items.

use bitebox_core::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::CartError;

/// One product selection in the cart.
///
/// Equality of line items in the cart is decided by `product_id` alone; the
/// name is only a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    product_id: ProductId,
    name: String,
    unit_price: Money,
    quantity: u32,
}

impl LineItem {
    /// Create a validated line item.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidArgument`] if `unit_price` is negative or
    /// `quantity` is zero.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, CartError> {
        let item = Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check the invariants of an item that did not come through [`Self::new`],
    /// e.g. one read back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidArgument`] describing the first violation.
    pub fn validate(&self) -> Result<(), CartError> {
        if self.product_id.as_str().is_empty() {
            return Err(CartError::invalid("product id cannot be empty"));
        }
        if self.unit_price.is_negative() {
            return Err(CartError::invalid(format!(
                "unit price for {} cannot be negative (got {})",
                self.product_id, self.unit_price
            )));
        }
        if !self.unit_price.is_whole_minor_units() {
            return Err(CartError::invalid(format!(
                "unit price for {} has fractions of a cent (got {})",
                self.product_id, self.unit_price.amount
            )));
        }
        if self.quantity == 0 {
            return Err(CartError::invalid(format!(
                "quantity for {} must be at least 1",
                self.product_id
            )));
        }
        self.line_total().map(|_| ())
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn unit_price(&self) -> Money {
        self.unit_price
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price * quantity`, exact.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidArgument`] if the product overflows.
    pub fn line_total(&self) -> Result<Money, CartError> {
        self.unit_price.checked_mul(self.quantity).map_err(|e| {
            CartError::invalid(format!("line total for {}: {e}", self.product_id))
        })
    }

    /// Quantity after adding `extra` units, without mutating.
    pub(crate) fn incremented_quantity(&self, extra: u32) -> Result<u32, CartError> {
        self.quantity.checked_add(extra).ok_or_else(|| {
            CartError::invalid(format!("quantity for {} overflows", self.product_id))
        })
    }

    pub(crate) const fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bitebox_core::CurrencyCode;

    use super::*;

    fn usd(s: &str) -> Money {
        Money::parse(s, CurrencyCode::USD).unwrap()
    }

    #[test]
    fn test_new_valid_item() {
        let item = LineItem::new("A", "Dumplings", usd("5.00"), 2).unwrap();
        assert_eq!(item.product_id().as_str(), "A");
        assert_eq!(item.name(), "Dumplings");
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.line_total().unwrap(), usd("10.00"));
    }

    #[test]
    fn test_free_item_is_allowed() {
        let item = LineItem::new("napkins", "Napkins", usd("0"), 1).unwrap();
        assert!(item.line_total().unwrap().is_zero());
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = LineItem::new("A", "Dumplings", usd("-0.01"), 1).unwrap_err();
        assert!(matches!(err, CartError::InvalidArgument(_)));
    }

    #[test]
    fn test_sub_cent_price_rejected() {
        let err = LineItem::new("A", "Dumplings", usd("1.005"), 1).unwrap_err();
        assert!(matches!(err, CartError::InvalidArgument(_)));

        // Trailing zeros are not extra precision
        assert!(LineItem::new("A", "Dumplings", usd("1.5000"), 1).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = LineItem::new("A", "Dumplings", usd("1.00"), 0).unwrap_err();
        assert!(matches!(err, CartError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_product_id_rejected() {
        let err = LineItem::new("", "Mystery", usd("1.00"), 1).unwrap_err();
        assert!(matches!(err, CartError::InvalidArgument(_)));
    }

    #[test]
    fn test_deserialized_item_is_revalidated() {
        let json = r#"{"product_id":"A","name":"x","unit_price":{"amount":"1.00","currency_code":"USD"},"quantity":0}"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_incremented_quantity_overflow() {
        let item = LineItem::new("A", "x", usd("1.00"), u32::MAX).unwrap();
        assert!(item.incremented_quantity(1).is_err());
        assert_eq!(item.incremented_quantity(0).unwrap(), u32::MAX);
    }
}
