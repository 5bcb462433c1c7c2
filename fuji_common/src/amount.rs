//! Module to convert amounts between their fractional form (eg "0.03" L-BTC) and the smallest
//! unit of the asset (eg satoshi), and to size the collateral of a loan.
//!
//! All the arithmetic is done with [`Decimal`], floating point numbers are never involved.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Precision of the assets on the ledger, 1 unit is 10^8 smallest units
pub const DEFAULT_PRECISION: u8 = 8;

#[derive(thiserror::Error, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Error {
    #[error("The maximum precision is 8, given {0}")]
    TooPrecise(u8),

    #[error("Our precision is {our}, given a string with {given}")]
    StringTooPrecise { our: u8, given: u32 },

    #[error("Amount cannot be negative, given {0}")]
    Negative(Decimal),

    #[error("There was an overflow in converting the amount {0}")]
    Overflow(String),

    #[error("Division by zero computing the collateral")]
    DivisionByZero,

    #[error(transparent)]
    Parse(#[from] rust_decimal::Error),
}

/// Helper to convert fractional values of an asset to its smallest units and viceversa.
///
/// For example 100 smallest units with precision 2 is "1.00"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision(u8);

impl Default for Precision {
    fn default() -> Self {
        Precision(DEFAULT_PRECISION)
    }
}

impl Precision {
    /// Create a new Precision, erroring if the given precision is greater than the allowed maximum (8)
    pub fn new(precision: u8) -> Result<Precision, Error> {
        if precision > DEFAULT_PRECISION {
            Err(Error::TooPrecise(precision))
        } else {
            Ok(Precision(precision))
        }
    }

    /// Convert a fractional amount to smallest units, rounding down.
    ///
    /// Rounding up could produce an amount greater than the confirmed balance it was computed from.
    ///
    /// ```
    /// # use fuji_common::amount::Precision;
    /// # use rust_decimal::Decimal;
    /// # use std::str::FromStr;
    /// let p = Precision::default();
    /// let v = Decimal::from_str("0.000000015").unwrap();
    /// assert_eq!(p.to_smallest_unit(v).unwrap(), 1);
    /// ```
    pub fn to_smallest_unit(&self, fractional: Decimal) -> Result<u64, Error> {
        if fractional.is_sign_negative() && !fractional.is_zero() {
            return Err(Error::Negative(fractional));
        }
        let scaled = fractional
            .checked_mul(self.factor())
            .ok_or_else(|| Error::Overflow(fractional.to_string()))?;
        scaled
            .floor()
            .to_u64()
            .ok_or_else(|| Error::Overflow(fractional.to_string()))
    }

    /// Convert smallest units to the fractional amount
    pub fn from_smallest_unit(&self, units: u64) -> Decimal {
        Decimal::from_i128_with_scale(units as i128, self.0 as u32)
    }

    /// Format the given smallest units according to our precision
    ///
    /// ```
    /// # use fuji_common::amount::Precision;
    /// let p = Precision::new(2).unwrap();
    /// assert_eq!(p.sats_to_string(100), "1.00");
    /// ```
    pub fn sats_to_string(&self, units: u64) -> String {
        self.from_smallest_unit(units).to_string()
    }

    /// Parse a string with our precision to smallest units.
    ///
    /// Strings with more decimal digits than our precision are rejected instead of being rounded.
    pub fn string_to_sats(&self, val: &str) -> Result<u64, Error> {
        let value = Decimal::from_str(val.trim())?;
        if value.scale() > self.0 as u32 {
            return Err(Error::StringTooPrecise {
                our: self.0,
                given: value.scale(),
            });
        }
        self.to_smallest_unit(value)
    }

    fn factor(&self) -> Decimal {
        Decimal::from(10u64.pow(self.0 as u32))
    }
}

/// Convert a fractional amount with the ledger precision to smallest units, rounding down
pub fn to_smallest_unit(fractional: Decimal) -> Result<u64, Error> {
    Precision::default().to_smallest_unit(fractional)
}

/// Convert smallest units to a fractional amount with the ledger precision
pub fn from_smallest_unit(units: u64) -> Decimal {
    Precision::default().from_smallest_unit(units)
}

/// Compute the collateral, in smallest units, needed to borrow `borrow` smallest units of the
/// synthetic asset at the given `price` while keeping a `ratio_percent` collateralization.
///
/// `ratio_percent` is a percentage, 180 means the collateral is worth 1.8 times the borrowed
/// amount. The caller is responsible to check `price` and `ratio_percent` are positive; a zero
/// price results in [`Error::DivisionByZero`].
pub fn collateral_from_ratio(
    borrow: u64,
    ratio_percent: Decimal,
    price: Decimal,
) -> Result<u64, Error> {
    if price.is_zero() {
        return Err(Error::DivisionByZero);
    }
    let ratio = ratio_percent
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or_else(|| Error::Overflow(ratio_percent.to_string()))?;
    let value = from_smallest_unit(borrow)
        .checked_mul(ratio)
        .ok_or_else(|| Error::Overflow(borrow.to_string()))?
        .checked_div(price)
        .ok_or(Error::DivisionByZero)?;
    to_smallest_unit(value)
}

#[cfg(test)]
mod test {
    use rand::{thread_rng, Rng};

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn floor_never_rounds_up() {
        assert_eq!(to_smallest_unit(d("0.000000015")).unwrap(), 1);
        assert_eq!(to_smallest_unit(d("0.000000019999")).unwrap(), 1);
        assert_eq!(to_smallest_unit(d("0.00000000999")).unwrap(), 0);
        assert_eq!(to_smallest_unit(d("1")).unwrap(), 100_000_000);
        assert_eq!(to_smallest_unit(d("0")).unwrap(), 0);
        assert_eq!(to_smallest_unit(d("500")).unwrap(), 50_000_000_000);
    }

    #[test]
    fn negative_and_overflow() {
        assert_eq!(
            to_smallest_unit(d("-0.1")).unwrap_err(),
            Error::Negative(d("-0.1"))
        );
        assert!(matches!(
            to_smallest_unit(d("1000000000000000")),
            Err(Error::Overflow(_))
        ));

        let max = from_smallest_unit(u64::MAX);
        assert_eq!(to_smallest_unit(max).unwrap(), u64::MAX);
        assert!(matches!(
            to_smallest_unit(max + d("0.00000001")),
            Err(Error::Overflow(_))
        ));
    }

    #[test]
    fn parse_error() {
        let err = Precision::default().string_to_sats("1,5").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "{err}");
    }

    #[test]
    fn roundtrip_within_one_unit() {
        let mut rng = thread_rng();
        let tolerance = d("0.00000001");
        for _ in 0..1000 {
            // up to the 21 million coins of the ledger, with more decimals than it supports
            let scale: u32 = rng.gen_range(0..=12);
            let max = 21_000_000i128 * 10i128.pow(scale);
            let x = Decimal::from_i128_with_scale(rng.gen_range(0..=max), scale);
            let back = from_smallest_unit(to_smallest_unit(x).unwrap());
            assert!(back <= x, "{back} > {x}");
            assert!(x - back < tolerance, "{x} converted back to {back}");
        }
    }

    #[test]
    fn collateral() {
        let borrow = to_smallest_unit(d("500")).unwrap();
        let collateral = collateral_from_ratio(borrow, d("180"), d("30000")).unwrap();
        let expected = to_smallest_unit(d("500") * d("1.8") / d("30000")).unwrap();
        assert_eq!(collateral, expected);
        assert_eq!(collateral, 3_000_000);

        assert_eq!(
            collateral_from_ratio(borrow, d("180"), Decimal::ZERO).unwrap_err(),
            Error::DivisionByZero
        );

        // 150% of 100 units at 20000 is 0.0075
        let borrow = to_smallest_unit(d("100")).unwrap();
        assert_eq!(
            collateral_from_ratio(borrow, d("150"), d("20000")).unwrap(),
            750_000
        );
    }

    #[test]
    fn precision_strings() {
        let p = Precision::new(2).unwrap();
        assert_eq!(p.sats_to_string(100), "1.00");
        assert_eq!(p.sats_to_string(1), "0.01");
        assert_eq!(p.string_to_sats("1.0").unwrap(), 100);
        assert_eq!(p.string_to_sats("1").unwrap(), 100);
        assert_eq!(
            p.string_to_sats("1.001").unwrap_err(),
            Error::StringTooPrecise { our: 2, given: 3 }
        );

        let p = Precision::default();
        assert_eq!(p.sats_to_string(3_000_000), "0.03000000");
        assert_eq!(p.string_to_sats("0.000005").unwrap(), 500);

        assert_eq!(Precision::new(9).unwrap_err(), Error::TooPrecise(9));
    }
}
