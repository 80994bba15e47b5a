//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BITEBOX_CART_PATH` - Where the session cart is saved (default: bitebox-cart.json)
//! - `BITEBOX_CURRENCY` - ISO 4217 currency for the cart (default: USD)
//! - `BITEBOX_DELIVERY_FEE` - Delivery fee charged per order (default: 2.99)
//! - `BITEBOX_FREE_DELIVERY_THRESHOLD` - Subtotal at or above which delivery is free
//! - `BITEBOX_TAX_RATE` - Tax rate as a fraction (default: 0.08)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;

use bitebox_cart::{DeliveryFee, PricingError, StandardPricing, TaxRate};
use bitebox_core::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

const DEFAULT_CART_PATH: &str = "bitebox-cart.json";
const DEFAULT_CURRENCY: &str = "USD";
const DEFAULT_DELIVERY_FEE: &str = "2.99";
const DEFAULT_TAX_RATE: &str = "0.08";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid pricing configuration: {0}")]
    InvalidPricing(#[from] PricingError),
}

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path of the saved session cart
    pub cart_path: PathBuf,
    /// Currency the cart is priced in
    pub currency: CurrencyCode,
    /// Delivery fee and tax settings
    pub pricing: PricingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Delivery fee and tax settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    pub delivery_fee: Decimal,
    pub free_delivery_threshold: Option<Decimal>,
    pub tax_rate: Decimal,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value or
    /// the pricing settings are out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let cart_path = PathBuf::from(get_or_default(&lookup, "BITEBOX_CART_PATH", DEFAULT_CART_PATH));
        let currency = parse_var(&lookup, "BITEBOX_CURRENCY", DEFAULT_CURRENCY)?;
        let pricing = PricingConfig {
            delivery_fee: parse_var(&lookup, "BITEBOX_DELIVERY_FEE", DEFAULT_DELIVERY_FEE)?,
            free_delivery_threshold: parse_optional_var(&lookup, "BITEBOX_FREE_DELIVERY_THRESHOLD")?,
            tax_rate: parse_var(&lookup, "BITEBOX_TAX_RATE", DEFAULT_TAX_RATE)?,
        };
        // Fail at startup rather than on first use
        pricing.build()?;

        Ok(Self {
            cart_path,
            currency,
            pricing,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

impl PricingConfig {
    /// Build the pricing policy described by these settings.
    ///
    /// # Errors
    ///
    /// Returns `PricingError` for negative fees, a non-positive threshold, or
    /// a tax rate outside `[0, 1]`.
    pub fn build(&self) -> Result<StandardPricing, PricingError> {
        let delivery = match self.free_delivery_threshold {
            Some(threshold) => DeliveryFee::free_above(self.delivery_fee, threshold)?,
            None => DeliveryFee::flat(self.delivery_fee)?,
        };
        Ok(StandardPricing::new(delivery, TaxRate::new(self.tax_rate)?))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when unset.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value = get_or_default(lookup, key, default);
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a variable that may be unset.
fn parse_optional_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}
