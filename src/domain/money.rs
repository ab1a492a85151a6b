use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

// ============================================================================
// Money - Exact two-decimal monetary amount
// ============================================================================
//
// Every value is rounded half-to-even to two fractional digits and rescaled
// so that it always carries exactly two digits (10 -> 10.00).
//
// ============================================================================

/// Number of fractional digits carried by every `Money` value
pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Invalid monetary amount: {0:?}")]
    Parse(String),
}

/// Monetary amount normalized to scale 2 with banker's rounding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Parse a decimal string, e.g. `"10"`, `"-12.345"` or `"1.5e2"`
    pub fn parse(text: &str) -> Result<Self, MoneyError> {
        let trimmed = text.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(Self::from_decimal)
            .map_err(|_| MoneyError::Parse(text.to_string()))
    }

    pub fn from_decimal(value: Decimal) -> Self {
        Self(normalize(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::new(0, MONEY_SCALE))
    }

    /// The underlying decimal, always with scale 2
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn less_than(&self, other: &Money) -> bool {
        self < other
    }

    pub fn less_than_or_equal(&self, other: &Money) -> bool {
        self <= other
    }

    pub fn greater_than(&self, other: &Money) -> bool {
        self > other
    }

    pub fn greater_than_or_equal(&self, other: &Money) -> bool {
        self >= other
    }

    /// # Panics
    ///
    /// Panics if the sum overflows the 96-bit decimal mantissa.
    /// Use [`Money::checked_add`] when the operands are untrusted.
    pub fn add(&self, other: &Money) -> Money {
        Self::from_decimal(self.0 + other.0)
    }

    /// # Panics
    ///
    /// Panics if the difference overflows the 96-bit decimal mantissa.
    pub fn subtract(&self, other: &Money) -> Money {
        Self::from_decimal(self.0 - other.0)
    }

    pub fn checked_add(&self, other: &Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Self::from_decimal)
    }

    pub fn checked_sub(&self, other: &Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Self::from_decimal)
    }
}

fn normalize(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    if rounded.is_zero() {
        // drops the sign of -0.00
        return Decimal::new(0, MONEY_SCALE);
    }
    rounded.rescale(MONEY_SCALE);
    rounded
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self::from_decimal(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self::from_decimal(Decimal::from(value))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::add(&self, &rhs)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        self.subtract(&rhs)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Self::from_decimal(-self.0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
