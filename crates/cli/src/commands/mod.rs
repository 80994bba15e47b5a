//! CLI command implementations.
//!
//! Every command works against a [`Session`]: the saved cart loaded into a
//! fresh [`CartStore`], written back once the command succeeds.

pub mod cart;
pub mod checkout;
pub mod quote;

use bitebox_cart::{
    CartRepository, CartStore, CartTotals, JsonFileCartRepository, LineItem, PersistenceError,
    StoredCart,
};
use tracing::info;

use crate::config::CliConfig;

/// A cart loaded from disk for the duration of one command.
pub struct Session {
    cart: CartStore,
    repository: JsonFileCartRepository,
}

impl Session {
    /// Build the cart from configuration and load the saved contents, if any.
    ///
    /// # Errors
    ///
    /// Fails if the pricing settings are invalid or the saved cart cannot be
    /// read or restored.
    pub async fn open(config: &CliConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let cart = new_cart(config)?;
        let repository = JsonFileCartRepository::new(&config.cart_path);

        if let Some(stored) = repository.load().await? {
            stored.restore_into(&cart)?;
        }

        Ok(Self { cart, repository })
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Write the cart back, deleting the file once it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart file cannot be written or removed.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        if self.cart.is_empty() {
            self.repository.delete().await
        } else {
            self.repository.save(&StoredCart::from_store(&self.cart)).await
        }
    }
}

/// Empty cart priced with the configured currency and policy.
fn new_cart(config: &CliConfig) -> Result<CartStore, Box<dyn std::error::Error>> {
    let pricing = config.pricing.build()?;
    Ok(CartStore::new(config.currency, pricing))
}

/// Log each line followed by the totals.
fn report(items: &[LineItem], totals: &CartTotals) {
    if items.is_empty() {
        info!("Cart is empty");
        return;
    }

    for item in items {
        match item.line_total() {
            Ok(line_total) => info!(
                "  {} x{} @ {} = {}  [{}]",
                item.name(),
                item.quantity(),
                item.unit_price(),
                line_total,
                item.product_id()
            ),
            Err(e) => info!("  {} x{}  ({e})", item.name(), item.quantity()),
        }
    }

    info!("Items:    {}", totals.item_count);
    info!("Subtotal: {}", totals.subtotal);
    info!("Delivery: {}", totals.delivery_fee);
    info!("Tax:      {}", totals.tax);
    info!("Total:    {}", totals.total);
}
