//! Cart editing commands.
//!
//! # Usage
//!
//! ```bash
//! bitebox add pad-thai "Pad Thai" 12.00 -q 2
//! bitebox remove pad-thai
//! bitebox set pad-thai 1
//! bitebox clear
//! bitebox show
//! ```

use bitebox_core::Money;
use tracing::{info, instrument};

use super::{Session, report};
use crate::config::CliConfig;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Add `quantity` units of a product, merging with an existing line.
#[instrument(skip(config, name, price))]
pub async fn add(
    config: &CliConfig,
    product_id: String,
    name: String,
    price: &str,
    quantity: u32,
) -> CommandResult {
    let unit_price = Money::parse(price, config.currency)?;
    let session = Session::open(config).await?;

    let line = session.cart().add_item(product_id, name, unit_price, quantity)?;
    session.save().await?;

    info!(
        "Added {} (now x{} in cart)",
        line.name(),
        line.quantity()
    );
    info!("Total: {}", session.cart().total());
    Ok(())
}

/// Remove a product's line.
#[instrument(skip(config))]
pub async fn remove(config: &CliConfig, product_id: &str) -> CommandResult {
    let session = Session::open(config).await?;

    match session.cart().remove_item(product_id)? {
        Some(line) => {
            session.save().await?;
            info!("Removed {}", line.name());
        }
        None => info!("{product_id} is not in the cart"),
    }
    info!("Total: {}", session.cart().total());
    Ok(())
}

/// Replace a product's quantity. Zero removes the line.
#[instrument(skip(config))]
pub async fn set(config: &CliConfig, product_id: &str, quantity: u32) -> CommandResult {
    let session = Session::open(config).await?;

    match session.cart().set_quantity(product_id, quantity)? {
        Some(line) => info!("{} is now x{}", line.name(), line.quantity()),
        None => info!("Removed {product_id}"),
    }
    session.save().await?;

    info!("Total: {}", session.cart().total());
    Ok(())
}

/// Empty the cart and delete the saved file.
#[instrument(skip(config))]
pub async fn clear(config: &CliConfig) -> CommandResult {
    let session = Session::open(config).await?;
    session.cart().clear()?;
    session.save().await?;

    info!("Cart cleared");
    Ok(())
}

/// Print the cart's lines and totals.
#[instrument(skip(config))]
pub async fn show(config: &CliConfig) -> CommandResult {
    let session = Session::open(config).await?;
    let snapshot = session.cart().snapshot();

    info!("Cart ({}):", snapshot.currency);
    report(&snapshot.items, &snapshot.totals);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use bitebox_core::CurrencyCode;
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::PricingConfig;

    fn config(path: &Path) -> CliConfig {
        CliConfig {
            cart_path: path.to_path_buf(),
            currency: CurrencyCode::USD,
            pricing: PricingConfig {
                delivery_fee: Decimal::new(299, 2),
                free_delivery_threshold: None,
                tax_rate: Decimal::new(8, 2),
            },
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[tokio::test]
    async fn test_edits_persist_between_commands() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir.path().join("cart.json"));

        add(&config, "A".into(), "Burrito".into(), "5.00", 2).await.unwrap();
        add(&config, "A".into(), "Burrito".into(), "5.00", 1).await.unwrap();
        add(&config, "B".into(), "Churros".into(), "3.50", 1).await.unwrap();
        set(&config, "B", 2).await.unwrap();

        let session = Session::open(&config).await.unwrap();
        assert_eq!(session.cart().item("A").unwrap().quantity(), 3);
        assert_eq!(session.cart().item("B").unwrap().quantity(), 2);
        assert_eq!(session.cart().subtotal().amount, Decimal::new(2200, 2));
    }

    #[tokio::test]
    async fn test_emptying_cart_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let config = config(&path);

        add(&config, "A".into(), "Burrito".into(), "5.00", 1).await.unwrap();
        assert!(path.exists());

        remove(&config, "A").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_set_on_missing_product_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir.path().join("cart.json"));

        assert!(set(&config, "ghost", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_price_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let config = config(&path);

        assert!(add(&config, "A".into(), "Burrito".into(), "five", 1).await.is_err());
        assert!(add(&config, "A".into(), "Burrito".into(), "-1.00", 1).await.is_err());
        assert!(!path.exists());
    }
}
