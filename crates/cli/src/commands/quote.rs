//! Price an item list without touching the saved cart.
//!
//! The file is a YAML list:
//!
//! ```yaml
//! - product_id: pad-thai
//!   name: Pad Thai
//!   unit_price: "12.00"
//!   quantity: 2
//! - product_id: spring-rolls
//!   name: Spring Rolls
//!   unit_price: 4.50
//! ```
//!
//! Repeated product IDs merge into one line, exactly as repeated `add`
//! commands would.

use std::path::Path;

use bitebox_cart::{CartSnapshot, CartStore};
use bitebox_core::Money;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use super::{new_cart, report};
use crate::config::CliConfig;

/// Errors reading a quote file.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid item list: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One entry of a quote file.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Parse a YAML item list.
///
/// # Errors
///
/// Returns `QuoteError::Parse` if the document is not a list of items.
pub fn parse_items(yaml: &str) -> Result<Vec<QuoteItem>, QuoteError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Add every item to `cart` in order and snapshot the result.
///
/// # Errors
///
/// Returns the first item the cart rejects.
pub fn price_items(
    cart: &CartStore,
    items: Vec<QuoteItem>,
) -> Result<CartSnapshot, bitebox_cart::CartError> {
    for item in items {
        let unit_price = Money::new(item.unit_price, cart.currency());
        cart.add_item(item.product_id, item.name, unit_price, item.quantity)?;
    }
    Ok(cart.snapshot())
}

/// Load the file at `path`, price it, and print the breakdown.
#[instrument(skip(config), fields(path = %path.display()))]
pub async fn run(config: &CliConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| QuoteError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let items = parse_items(&yaml)?;

    let snapshot = price_items(&new_cart(config)?, items)?;

    info!("Quote ({}):", snapshot.currency);
    report(&snapshot.items, &snapshot.totals);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use bitebox_cart::{CartError, DeliveryFee, StandardPricing, TaxRate};
    use bitebox_core::CurrencyCode;

    use super::*;

    fn cart() -> CartStore {
        let pricing = StandardPricing::new(
            DeliveryFee::flat(Decimal::new(299, 2)).unwrap(),
            TaxRate::new(Decimal::new(8, 2)).unwrap(),
        );
        CartStore::new(CurrencyCode::USD, pricing)
    }

    #[test]
    fn test_parse_accepts_string_and_number_prices() {
        let items = parse_items(
            r#"
- product_id: A
  name: Dumplings
  unit_price: "5.00"
  quantity: 2
- product_id: B
  name: Soup
  unit_price: 4.5
"#,
        )
        .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit_price, Decimal::new(500, 2));
        assert_eq!(items[1].unit_price, Decimal::new(45, 1));
        assert_eq!(items[1].quantity, 1);
    }

    #[test]
    fn test_parse_rejects_non_list() {
        assert!(matches!(
            parse_items("product_id: A"),
            Err(QuoteError::Parse(_))
        ));
    }

    #[test]
    fn test_repeated_products_merge() {
        let items = parse_items(
            r"
- {product_id: A, name: Dumplings, unit_price: 5.00, quantity: 2}
- {product_id: A, name: Dumplings, unit_price: 5.00, quantity: 1}
",
        )
        .unwrap();

        let snapshot = price_items(&cart(), items).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.totals.subtotal.amount, Decimal::new(1500, 2));
        assert_eq!(snapshot.totals.tax.amount, Decimal::new(120, 2));
        assert_eq!(snapshot.totals.total.amount, Decimal::new(1919, 2));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let items = parse_items("- {product_id: A, name: Soup, unit_price: 4, quantity: 0}").unwrap();
        assert!(matches!(
            price_items(&cart(), items),
            Err(CartError::InvalidArgument(_))
        ));
    }
}
