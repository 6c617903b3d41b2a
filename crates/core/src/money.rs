//! Money value object.
//!
//! Amounts are exact decimals with two fractional digits. Arithmetic goes
//! through checked helpers so sums and products never drift or wrap.

use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of fractional digits every amount is normalized to.
pub const MONEY_SCALE: u32 = 2;

/// Non-negative monetary amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "Decimal", try_from = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Create money from a decimal amount.
    ///
    /// Rejects negative amounts and amounts with more than two fractional digits.
    pub fn new(amount: Decimal) -> Result<Self, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "money amount cannot be negative: {amount}"
            )));
        }
        if amount.scale() > MONEY_SCALE {
            return Err(DomainError::validation(format!(
                "money amount cannot have more than {MONEY_SCALE} decimal places: {amount}"
            )));
        }
        let mut normalized = amount;
        normalized.rescale(MONEY_SCALE);
        Ok(Self(normalized))
    }

    /// Create money from minor units (cents).
    pub fn from_cents(cents: u64) -> Result<Self, DomainError> {
        let cents = i64::try_from(cents)
            .map_err(|_| DomainError::validation(format!("money amount out of range: {cents}")))?;
        Self::new(Decimal::new(cents, MONEY_SCALE))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, other: Money) -> Result<Money, DomainError> {
        let sum = self
            .0
            .checked_add(other.0)
            .ok_or_else(|| DomainError::validation("money addition overflowed"))?;
        Money::new(sum)
    }

    /// Multiply a unit price by a quantity.
    pub fn times(self, quantity: u32) -> Result<Money, DomainError> {
        let product = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| DomainError::validation("money multiplication overflowed"))?;
        Money::new(product)
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn sum<I>(amounts: I) -> Result<Money, DomainError>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid money amount '{s}': {e}")))?;
        Money::new(amount)
    }
}
