//! Type-safe monetary amounts using decimal arithmetic.
//!
//! All cart arithmetic goes through [`Money`] so that repeated totals never
//! drift the way binary floating point would.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places in the minor unit of every supported currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Errors that can occur when constructing or combining [`Money`] values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The two operands are in different currencies.
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch {
        /// Currency of the left-hand operand.
        expected: CurrencyCode,
        /// Currency of the right-hand operand.
        found: CurrencyCode,
    },
    /// The result does not fit in a decimal.
    #[error("monetary amount overflow")]
    Overflow,
    /// The input string is not a decimal amount.
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    /// The input string is not a supported ISO 4217 code.
    #[error("unsupported currency '{0}'")]
    UnknownCurrency(String),
}

/// A monetary amount with currency information.
///
/// ## Examples
///
/// ```
/// use bitebox_core::{CurrencyCode, Money};
///
/// let price = Money::parse("5.00", CurrencyCode::USD).unwrap();
/// let line = price.checked_mul(3).unwrap();
/// assert_eq!(line.to_string(), "$15.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Create an amount from minor units (e.g., cents for USD).
    #[must_use]
    pub fn from_minor_units(minor: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(minor, MINOR_UNIT_SCALE), currency_code)
    }

    /// Parse a decimal amount such as `"12.50"`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if the input is not an exact
    /// decimal number.
    pub fn parse(s: &str, currency_code: CurrencyCode) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str_exact(s.trim())
            .map_err(|_| MoneyError::InvalidAmount(s.to_owned()))?;
        Ok(Self::new(amount, currency_code))
    }

    /// Returns `true` if the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns `true` if the amount is a whole number of minor units (cents).
    #[must_use]
    pub fn is_whole_minor_units(&self) -> bool {
        self.amount.normalize().scale() <= MINOR_UNIT_SCALE
    }

    /// Returns `true` if the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Add two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] if the currencies differ, or
    /// [`MoneyError::Overflow`] if the sum is not representable.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(MoneyError::Overflow)
    }

    /// Multiply by a whole quantity.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product is not representable.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, MoneyError> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(MoneyError::Overflow)
    }

    /// Multiply by a decimal rate (e.g., a tax rate of `0.08`).
    ///
    /// The result is not rounded; call [`Self::round_to_minor_units`].
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Overflow`] if the product is not representable.
    pub fn checked_scale(self, rate: Decimal) -> Result<Self, MoneyError> {
        self.amount
            .checked_mul(rate)
            .map(|amount| Self::new(amount, self.currency_code))
            .ok_or(MoneyError::Overflow)
    }

    /// Round to the currency's minor unit, half away from zero.
    #[must_use]
    pub fn round_to_minor_units(self) -> Self {
        Self::new(
            self.amount
                .round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero),
            self.currency_code,
        )
    }

    /// Sum an iterator of amounts, starting from zero in `currency_code`.
    ///
    /// # Errors
    ///
    /// Fails on the first currency mismatch or overflow.
    pub fn checked_sum<I>(currency_code: CurrencyCode, amounts: I) -> Result<Self, MoneyError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::zero(currency_code), Self::checked_add)
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency_code == other.currency_code {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency_code,
                found: other.currency_code,
            })
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_minor_units();
        let sign = if rounded.is_negative() { "-" } else { "" };
        write!(
            f,
            "{sign}{}{:.2}",
            self.currency_code.symbol(),
            rounded.amount.abs()
        )
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(MoneyError::UnknownCurrency(s.to_owned())),
        }
    }
}
