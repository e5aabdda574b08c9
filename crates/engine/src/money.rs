use std::{
    fmt,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::EngineError;

/// Money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (amounts, sums,
/// averages) to avoid floating-point drift. The wire format is a two-decimal
/// [`Decimal`]; conversion in either direction is explicit.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
/// use rust_decimal::Decimal;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_decimal(), Decimal::new(1234, 2));
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Conversion from a decimal rejects more than two fractional digits:
///
/// ```rust
/// use engine::MoneyCents;
/// use rust_decimal::Decimal;
///
/// assert_eq!(
///     MoneyCents::try_from_decimal(Decimal::new(1050, 2)).unwrap().cents(),
///     1050
/// );
/// assert!(MoneyCents::try_from_decimal(Decimal::new(12345, 3)).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Converts a decimal amount into cents.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - must fit in an `i64` cent count
    pub fn try_from_decimal(value: Decimal) -> Result<Self, EngineError> {
        if value != value.round_dp(2) {
            return Err(EngineError::Validation(
                "amount must have at most two decimal places".to_string(),
            ));
        }
        let cents = (value * Decimal::ONE_HUNDRED)
            .round_dp(0)
            .to_i64()
            .ok_or_else(|| EngineError::Validation("amount out of range".to_string()))?;
        Ok(Self(cents))
    }

    /// Returns the amount as a two-decimal [`Decimal`].
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        self.0 -= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "0.01");
        assert_eq!(MoneyCents::new(10).to_string(), "0.10");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn decimal_round_trip() {
        let amount = MoneyCents::try_from_decimal(Decimal::new(99999, 2)).unwrap();
        assert_eq!(amount.cents(), 99999);
        assert_eq!(amount.to_decimal(), Decimal::new(99999, 2));
    }

    #[test]
    fn whole_numbers_convert() {
        assert_eq!(
            MoneyCents::try_from_decimal(Decimal::from(10)).unwrap().cents(),
            1000
        );
    }

    #[test]
    fn rejects_more_than_two_decimals() {
        assert!(MoneyCents::try_from_decimal(Decimal::new(12345, 3)).is_err());
        assert!(MoneyCents::try_from_decimal(Decimal::new(1, 3)).is_err());
    }
}
