//! Amount type
//!
//! Domain primitive for monetary amounts with business rule validation.
//! Values mirror the `NUMERIC(18, 2)` columns of the ledger: two fractional
//! digits and at most sixteen integer digits.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value a `NUMERIC(18, 2)` column can hold
const MAX_AMOUNT: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

/// Fixed number of fractional digits
pub const SCALE: u32 = 2;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - At most 2 decimal places, stored rescaled to exactly 2
/// - Fits in `NUMERIC(18, 2)`
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use wallet_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.to_string(), "100.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount or Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Balance cannot be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max 2, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value (9999999999999999.99)")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

/// Bring a decimal to the ledger scale, rejecting values that would lose digits.
fn to_ledger_scale(value: Decimal) -> Result<Decimal, AmountError> {
    let normalized = value.normalize();
    if normalized.scale() > SCALE {
        return Err(AmountError::TooManyDecimals(normalized.scale()));
    }
    if normalized.abs() > MAX_AMOUNT {
        return Err(AmountError::Overflow);
    }
    let mut scaled = normalized;
    scaled.rescale(SCALE);
    Ok(scaled)
}

/// Present a stored ledger value with exactly two fractional digits.
///
/// Postgres returns a NUMERIC zero without its declared scale.
pub fn with_ledger_scale(value: Decimal) -> Decimal {
    let mut scaled = value;
    scaled.rescale(SCALE);
    scaled
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 significant decimal places
    /// - `AmountError::Overflow` if the value does not fit `NUMERIC(18, 2)`
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        to_ledger_scale(value).map(Self)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The signed value recorded on the transaction log for a debit.
    pub fn negated(&self) -> Decimal {
        -self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Balance represents a wallet balance (zero or positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        to_ledger_scale(value).map(Self)
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(Decimal::new(0, SCALE))
    }

    /// Get the underlying value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if balance covers a withdrawal of `amount`
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 - amount.value() >= Decimal::ZERO
    }

    /// Add amount to balance
    pub fn credit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        let new_value = self
            .0
            .checked_add(amount.value())
            .ok_or(AmountError::Overflow)?;
        Balance::new(new_value)
    }

    /// Subtract amount from balance
    pub fn debit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        Balance::new(self.0 - amount.value())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}
