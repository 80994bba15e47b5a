//! Pricing policies: delivery fee and tax as functions of the subtotal.
//!
//! A [`PricingPolicy`] is supplied when the cart is constructed so that fees
//! can vary by region or vendor without touching the cart itself. Policies
//! must be deterministic. They should also be non-decreasing in the subtotal,
//! but that is not enforced: "free delivery over X" schedules deliberately
//! break it.

use std::sync::Arc;

use bitebox_core::{Money, MoneyError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a pricing policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("delivery fee schedule must have at least one tier")]
    EmptySchedule,
    #[error("first delivery tier must start at a subtotal of 0, got {0}")]
    FirstTierNotZero(Decimal),
    #[error("delivery tiers must be strictly ascending (tier at {0} is out of order)")]
    UnorderedTiers(Decimal),
    #[error("amount cannot be negative: {0}")]
    NegativeAmount(Decimal),
    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),
}

/// Strategy computing the delivery fee and tax owed for a subtotal.
///
/// Implementations return amounts in the currency of `subtotal`. An error
/// rejects the cart state being priced; it is never replaced by a guess.
pub trait PricingPolicy: Send + Sync {
    /// Delivery charge for the given subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the fee cannot be computed.
    fn delivery_fee(&self, subtotal: Money) -> Result<Money, MoneyError>;

    /// Tax owed on the given subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the tax cannot be computed.
    fn tax(&self, subtotal: Money) -> Result<Money, MoneyError>;
}

impl<T: PricingPolicy + ?Sized> PricingPolicy for Arc<T> {
    fn delivery_fee(&self, subtotal: Money) -> Result<Money, MoneyError> {
        (**self).delivery_fee(subtotal)
    }

    fn tax(&self, subtotal: Money) -> Result<Money, MoneyError> {
        (**self).tax(subtotal)
    }
}

impl<T: PricingPolicy + ?Sized> PricingPolicy for Box<T> {
    fn delivery_fee(&self, subtotal: Money) -> Result<Money, MoneyError> {
        (**self).delivery_fee(subtotal)
    }

    fn tax(&self, subtotal: Money) -> Result<Money, MoneyError> {
        (**self).tax(subtotal)
    }
}

// =============================================================================
// Delivery Fee
// =============================================================================

/// One step of a tiered delivery fee schedule.
///
/// Applies from `min_subtotal` (inclusive) up to the next tier's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub min_subtotal: Decimal,
    pub fee: Decimal,
}

impl FeeTier {
    #[must_use]
    pub const fn new(min_subtotal: Decimal, fee: Decimal) -> Self {
        Self { min_subtotal, fee }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Schedule {
    Free,
    Flat(Decimal),
    Tiered(Vec<FeeTier>),
}

/// Delivery fee schedule.
///
/// Only constructible through validating constructors, so a schedule always
/// covers every non-negative subtotal with a non-negative fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFee {
    schedule: Schedule,
}

impl DeliveryFee {
    /// Delivery is always free.
    #[must_use]
    pub const fn free() -> Self {
        Self {
            schedule: Schedule::Free,
        }
    }

    /// The same fee regardless of subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NegativeAmount`] if `fee` is negative.
    pub fn flat(fee: Decimal) -> Result<Self, PricingError> {
        ensure_non_negative(fee)?;
        Ok(Self {
            schedule: Schedule::Flat(fee),
        })
    }

    /// A stepped schedule.
    ///
    /// # Errors
    ///
    /// Fails if `tiers` is empty, does not start at zero, is not strictly
    /// ascending, or contains a negative fee.
    pub fn tiered(tiers: Vec<FeeTier>) -> Result<Self, PricingError> {
        let first = tiers.first().ok_or(PricingError::EmptySchedule)?;
        if !first.min_subtotal.is_zero() {
            return Err(PricingError::FirstTierNotZero(first.min_subtotal));
        }
        for tier in &tiers {
            ensure_non_negative(tier.fee)?;
        }
        for (lower, upper) in tiers.iter().zip(tiers.iter().skip(1)) {
            if upper.min_subtotal <= lower.min_subtotal {
                return Err(PricingError::UnorderedTiers(upper.min_subtotal));
            }
        }
        Ok(Self {
            schedule: Schedule::Tiered(tiers),
        })
    }

    /// Charge `fee` below `threshold` and nothing at or above it.
    ///
    /// # Errors
    ///
    /// Fails if either amount is negative or `threshold` is zero.
    pub fn free_above(fee: Decimal, threshold: Decimal) -> Result<Self, PricingError> {
        ensure_non_negative(threshold)?;
        Self::tiered(vec![
            FeeTier::new(Decimal::ZERO, fee),
            FeeTier::new(threshold, Decimal::ZERO),
        ])
    }

    /// Fee owed for a subtotal amount.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        match &self.schedule {
            Schedule::Free => Decimal::ZERO,
            Schedule::Flat(fee) => *fee,
            Schedule::Tiered(tiers) => tiers
                .iter()
                .rev()
                .find(|tier| tier.min_subtotal <= subtotal)
                .map_or(Decimal::ZERO, |tier| tier.fee),
        }
    }
}

impl Default for DeliveryFee {
    fn default() -> Self {
        Self::free()
    }
}

// =============================================================================
// Tax
// =============================================================================

/// Proportional tax rate, stored as a fraction (`0.08` is 8%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// No tax.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// # Errors
    ///
    /// Returns [`PricingError::InvalidTaxRate`] unless `0 <= rate <= 1`.
    pub fn new(rate: Decimal) -> Result<Self, PricingError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(PricingError::InvalidTaxRate(rate));
        }
        Ok(Self(rate))
    }

    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.0
    }

    /// Tax on `subtotal`, rounded to minor units.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product cannot be represented.
    pub fn apply(&self, subtotal: Money) -> Result<Money, MoneyError> {
        subtotal
            .checked_scale(self.0)
            .map(Money::round_to_minor_units)
    }
}

// =============================================================================
// Standard Policy
// =============================================================================

/// Delivery fee schedule plus a proportional tax.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StandardPricing {
    delivery: DeliveryFee,
    tax: TaxRate,
}

impl StandardPricing {
    #[must_use]
    pub const fn new(delivery: DeliveryFee, tax: TaxRate) -> Self {
        Self { delivery, tax }
    }

    #[must_use]
    pub const fn delivery(&self) -> &DeliveryFee {
        &self.delivery
    }

    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax
    }
}

impl PricingPolicy for StandardPricing {
    fn delivery_fee(&self, subtotal: Money) -> Result<Money, MoneyError> {
        Ok(
            Money::new(self.delivery.fee_for(subtotal.amount), subtotal.currency_code)
                .round_to_minor_units(),
        )
    }

    fn tax(&self, subtotal: Money) -> Result<Money, MoneyError> {
        self.tax.apply(subtotal)
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<(), PricingError> {
    if amount < Decimal::ZERO {
        Err(PricingError::NegativeAmount(amount))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bitebox_core::CurrencyCode;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn usd(s: &str) -> Money {
        Money::new(dec(s), CurrencyCode::USD)
    }

    #[test]
    fn test_flat_fee_ignores_subtotal() {
        let fee = DeliveryFee::flat(dec("2.99")).unwrap();
        assert_eq!(fee.fee_for(Decimal::ZERO), dec("2.99"));
        assert_eq!(fee.fee_for(dec("1000")), dec("2.99"));
    }

    #[test]
    fn test_flat_fee_rejects_negative() {
        assert_eq!(
            DeliveryFee::flat(dec("-1")),
            Err(PricingError::NegativeAmount(dec("-1")))
        );
    }

    #[test]
    fn test_tiered_fee_picks_highest_reached_tier() {
        let fee = DeliveryFee::tiered(vec![
            FeeTier::new(dec("0"), dec("4.99")),
            FeeTier::new(dec("15"), dec("2.99")),
            FeeTier::new(dec("30"), dec("0")),
        ])
        .unwrap();

        assert_eq!(fee.fee_for(dec("0")), dec("4.99"));
        assert_eq!(fee.fee_for(dec("14.99")), dec("4.99"));
        assert_eq!(fee.fee_for(dec("15")), dec("2.99"));
        assert_eq!(fee.fee_for(dec("29.99")), dec("2.99"));
        assert_eq!(fee.fee_for(dec("30")), dec("0"));
    }

    #[test]
    fn test_tiered_fee_validation() {
        assert_eq!(DeliveryFee::tiered(vec![]), Err(PricingError::EmptySchedule));
        assert_eq!(
            DeliveryFee::tiered(vec![FeeTier::new(dec("5"), dec("1"))]),
            Err(PricingError::FirstTierNotZero(dec("5")))
        );
        assert_eq!(
            DeliveryFee::tiered(vec![
                FeeTier::new(dec("0"), dec("3")),
                FeeTier::new(dec("10"), dec("2")),
                FeeTier::new(dec("10"), dec("1")),
            ]),
            Err(PricingError::UnorderedTiers(dec("10")))
        );
        assert_eq!(
            DeliveryFee::tiered(vec![FeeTier::new(dec("0"), dec("-3"))]),
            Err(PricingError::NegativeAmount(dec("-3")))
        );
    }

    #[test]
    fn test_free_above_threshold() {
        let fee = DeliveryFee::free_above(dec("3.50"), dec("25")).unwrap();
        assert_eq!(fee.fee_for(dec("24.99")), dec("3.50"));
        assert_eq!(fee.fee_for(dec("25")), Decimal::ZERO);
        assert!(DeliveryFee::free_above(dec("3.50"), dec("0")).is_err());
    }

    #[test]
    fn test_tax_rate_bounds() {
        assert!(TaxRate::new(dec("0")).is_ok());
        assert!(TaxRate::new(dec("1")).is_ok());
        assert_eq!(
            TaxRate::new(dec("1.01")),
            Err(PricingError::InvalidTaxRate(dec("1.01")))
        );
        assert!(TaxRate::new(dec("-0.05")).is_err());
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        let rate = TaxRate::new(dec("0.0825")).unwrap();
        // 10.00 * 0.0825 = 0.825 -> 0.83
        assert_eq!(rate.apply(usd("10.00")), Ok(usd("0.83")));
        assert_eq!(rate.apply(usd("0")), Ok(usd("0")));
    }

    #[test]
    fn test_standard_pricing_keeps_subtotal_currency() {
        let pricing = StandardPricing::new(
            DeliveryFee::flat(dec("1.5")).unwrap(),
            TaxRate::new(dec("0.2")).unwrap(),
        );
        let subtotal = Money::new(dec("10"), CurrencyCode::GBP);

        let fee = pricing.delivery_fee(subtotal).unwrap();
        assert_eq!(fee.currency_code, CurrencyCode::GBP);
        assert_eq!(fee.amount, dec("1.50"));
        assert_eq!(pricing.tax(subtotal).unwrap().amount, dec("2.00"));
    }

    #[test]
    fn test_policy_through_arc() {
        let shared: Arc<dyn PricingPolicy> = Arc::new(StandardPricing::default());
        assert!(shared.delivery_fee(usd("12")).unwrap().is_zero());
        assert!(shared.tax(usd("12")).unwrap().is_zero());
    }

    #[test]
    fn test_full_rate_on_largest_amount_is_exact() {
        let rate = TaxRate::new(Decimal::ONE).unwrap();
        let subtotal = Money::new(Decimal::MAX, CurrencyCode::USD);
        assert_eq!(rate.apply(subtotal), Ok(subtotal));
    }
}
