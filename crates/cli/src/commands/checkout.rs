//! Check out the saved cart against a dry-run order backend.
//!
//! No order is actually placed. The dry-run submitter accepts every order
//! (or declines every payment with `--decline`) so the full checkout flow,
//! including the clear-on-success and keep-on-failure rules, can be exercised
//! from the terminal.

use async_trait::async_trait;
use bitebox_cart::{
    CartSnapshot, CheckoutService, OrderConfirmation, OrderSubmitter, SubmissionError,
};
use bitebox_core::OrderStatus;
use tracing::{debug, info, instrument};

use super::Session;
use crate::config::CliConfig;

/// Order submitter that never leaves the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSubmitter {
    decline: bool,
}

impl DryRunSubmitter {
    #[must_use]
    pub const fn new(decline: bool) -> Self {
        Self { decline }
    }
}

#[async_trait]
impl OrderSubmitter for DryRunSubmitter {
    async fn submit(&self, snapshot: &CartSnapshot) -> Result<OrderConfirmation, SubmissionError> {
        debug!(
            lines = snapshot.items.len(),
            total = %snapshot.totals.total,
            "Dry-run order received"
        );

        if self.decline {
            return Err(SubmissionError::PaymentDeclined(
                "declined by dry-run backend".to_string(),
            ));
        }
        Ok(OrderConfirmation::for_snapshot(snapshot, OrderStatus::Accepted))
    }
}

/// Submit the saved cart. The saved file is removed only on success.
#[instrument(skip(config))]
pub async fn run(config: &CliConfig, decline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(config).await?;
    let service = CheckoutService::new(DryRunSubmitter::new(decline));

    let confirmation = service.checkout(session.cart()).await?;
    session.save().await?;

    info!(
        "Order {} {} for {}",
        confirmation.order_id,
        confirmation.status,
        confirmation.total
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use bitebox_core::CurrencyCode;
    use rust_decimal::Decimal;

    use super::*;
    use crate::commands::cart;
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
    async fn test_successful_checkout_removes_saved_cart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let config = config(&path);
        cart::add(&config, "A".into(), "Ramen".into(), "13.00", 1).await.unwrap();

        run(&config, false).await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_declined_checkout_keeps_saved_cart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let config = config(&path);
        cart::add(&config, "A".into(), "Ramen".into(), "13.00", 1).await.unwrap();
        let before = tokio::fs::read(&path).await.unwrap();

        let err = run(&config, true).await.unwrap_err();

        assert!(err.to_string().starts_with("Payment declined"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_empty_cart_cannot_check_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir.path().join("cart.json"));

        assert!(run(&config, false).await.is_err());
    }
}
