//! Monetary amounts in major units with lossless minor-unit conversion.
//!
//! Amounts are held as [`Decimal`] major units (e.g. `50.25`) and travel on
//! the wire as integer minor units (e.g. `5025`), so no binary floating point
//! value is ever part of the persisted or transmitted state.

use std::fmt;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const MINOR_UNITS_PER_MAJOR: i64 = 100;
const MINOR_UNIT_SCALE: u32 = 2;

/// Validation errors for [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountValidationError {
    /// The value was NaN or infinite.
    NotFinite,
    /// The value was zero or negative.
    NotPositive,
    /// The value rounds to zero minor units.
    BelowMinorUnit,
    /// The value does not fit the minor-unit integer range.
    OutOfRange,
}

impl fmt::Display for AmountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite => write!(f, "amount must be a finite number"),
            Self::NotPositive => write!(f, "amount must be greater than zero"),
            Self::BelowMinorUnit => write!(f, "amount must be at least one minor unit"),
            Self::OutOfRange => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for AmountValidationError {}

/// Strictly positive amount in major currency units.
///
/// # Examples
/// ```
/// use budget_sync::domain::Amount;
///
/// let amount = Amount::from_f64(50.25).expect("valid amount");
/// assert_eq!(amount.to_minor_units(), Ok(5025));
/// assert_eq!(Amount::from_minor_units(5025), Ok(amount));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Validate a decimal major-unit value.
    pub fn new(value: Decimal) -> Result<Self, AmountValidationError> {
        if value <= Decimal::ZERO {
            return Err(AmountValidationError::NotPositive);
        }
        Ok(Self(value.normalize()))
    }

    /// Validate a floating point major-unit value, as typed into a form.
    pub fn from_f64(value: f64) -> Result<Self, AmountValidationError> {
        if !value.is_finite() {
            return Err(AmountValidationError::NotFinite);
        }
        let decimal = Decimal::from_f64(value).ok_or(AmountValidationError::OutOfRange)?;
        Self::new(decimal)
    }

    /// Build an amount from an integer count of minor units.
    pub fn from_minor_units(minor: i64) -> Result<Self, AmountValidationError> {
        if minor <= 0 {
            return Err(AmountValidationError::NotPositive);
        }
        Self::new(Decimal::new(minor, MINOR_UNIT_SCALE))
    }

    /// Convert to minor units, rounding half away from zero.
    pub fn to_minor_units(self) -> Result<i64, AmountValidationError> {
        let scaled = self
            .0
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))
            .ok_or(AmountValidationError::OutOfRange)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let minor = scaled.to_i64().ok_or(AmountValidationError::OutOfRange)?;
        if minor == 0 {
            return Err(AmountValidationError::BelowMinorUnit);
        }
        Ok(minor)
    }

    /// The major-unit value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for minor-unit conversion.
    use super::*;
    use rstest::rstest;

    #[test]
    fn fifty_twenty_five_survives_the_wire() {
        let amount = Amount::from_f64(50.25).expect("valid amount");
        let minor = amount.to_minor_units().expect("fits");
        assert_eq!(minor, 5025);
        let back = Amount::from_minor_units(minor).expect("valid minor units");
        assert_eq!(back, amount);
        assert_eq!(back.to_string(), "50.25");
        assert_eq!(back.as_decimal(), Decimal::new(5025, 2));
    }

    #[rstest]
    #[case(75.5, 7550)]
    #[case(0.1, 10)]
    #[case(19.999, 2000)]
    #[case(0.005, 1)]
    fn rounds_to_nearest_minor_unit(#[case] major: f64, #[case] expected: i64) {
        let amount = Amount::from_f64(major).expect("valid amount");
        assert_eq!(amount.to_minor_units(), Ok(expected));
    }

    #[rstest]
    #[case(0.0, AmountValidationError::NotPositive)]
    #[case(-3.5, AmountValidationError::NotPositive)]
    #[case(f64::NAN, AmountValidationError::NotFinite)]
    #[case(f64::INFINITY, AmountValidationError::NotFinite)]
    fn rejects_non_positive_or_non_finite(
        #[case] major: f64,
        #[case] expected: AmountValidationError,
    ) {
        assert_eq!(Amount::from_f64(major), Err(expected));
    }

    #[test]
    fn sub_minor_amounts_cannot_be_sent() {
        let amount = Amount::from_f64(0.001).expect("positive");
        assert_eq!(
            amount.to_minor_units(),
            Err(AmountValidationError::BelowMinorUnit)
        );
    }

    #[test]
    fn serde_rejects_zero() {
        let parsed: Result<Amount, _> = serde_json::from_str("\"0\"");
        assert!(parsed.is_err());
        let parsed: Amount = serde_json::from_str("\"12.30\"").expect("valid amount");
        assert_eq!(parsed.to_minor_units(), Ok(1230));
    }
}
