//! # Coin Amounts
//!
//! `Coins` is a signed fixed-point amount with two fractional digits, stored
//! as an `i64` count of hundredths. Rewards are never carried as floats
//! inside the ledger: a float's text form varies between languages, and the
//! canonicalizer rejects floats outright.
//!
//! ## Canonical Text
//!
//! - no exponent, no leading `+`, no leading zeros;
//! - trailing fractional zeros removed, no fraction when integral;
//! - `5`, `12.5`, `-0.25`, `1000000`.
//!
//! This is the form that enters a block hash and the form `Coins`
//! serializes to. Deserialization also accepts JSON numbers so that records
//! written by other tools can still be read.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Hundredths per whole coin.
pub const SCALE: i64 = 100;

/// A fixed-point coin amount (hundredths of a coin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coins(i64);

impl Coins {
    /// Zero coins.
    pub const ZERO: Coins = Coins(0);

    /// Construct from a raw count of hundredths.
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Construct from a whole number of coins.
    pub fn from_whole(whole: i64) -> Result<Self, ValidationError> {
        whole
            .checked_mul(SCALE)
            .map(Self)
            .ok_or_else(|| ValidationError::AmountOutOfRange(whole.to_string()))
    }

    /// Convert a caller-supplied floating-point amount.
    ///
    /// Fails for NaN/infinite input, for more than two fractional digits and
    /// for values outside the `i64` hundredths range.
    pub fn from_f64(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteAmount(value));
        }
        let scaled = value * SCALE as f64;
        if scaled.abs() >= i64::MAX as f64 {
            return Err(ValidationError::AmountOutOfRange(value.to_string()));
        }
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 1e-9 * scaled.abs().max(1.0) {
            return Err(ValidationError::ExcessPrecision(value.to_string()));
        }
        Ok(Self(rounded as i64))
    }

    /// Raw count of hundredths.
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// True when the amount is exactly zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// True when the amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Absolute value, saturating at `i64::MAX` hundredths.
    pub const fn abs(&self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Saturating addition.
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Render the canonical decimal text.
    pub fn to_canonical_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let scale = SCALE as u64;
        let whole = magnitude / scale;
        let frac = magnitude % scale;
        if frac == 0 {
            format!("{sign}{whole}")
        } else if frac % 10 == 0 {
            format!("{sign}{whole}.{}", frac / 10)
        } else {
            format!("{sign}{whole}.{frac:02}")
        }
    }

    /// Parse decimal text such as `12.5`, `-3`, `0.25` or `7.50`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidAmount(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole_part, frac_part) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !whole_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        if digits.ends_with('.') {
            return Err(invalid());
        }
        let frac_significant = frac_part.trim_end_matches('0');
        if frac_significant.len() > 2 {
            return Err(ValidationError::ExcessPrecision(trimmed.to_string()));
        }

        let out_of_range = || ValidationError::AmountOutOfRange(trimmed.to_string());
        let whole: i64 = if whole_part.is_empty() {
            0
        } else {
            whole_part.parse().map_err(|_| out_of_range())?
        };
        let frac: i64 = match frac_significant.len() {
            0 => 0,
            1 => frac_significant.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac_significant.parse::<i64>().map_err(|_| invalid())?,
        };
        // i128 so that i64::MIN hundredths still parses.
        let magnitude = i128::from(whole) * i128::from(SCALE) + i128::from(frac);
        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed).map(Self).map_err(|_| out_of_range())
    }
}

impl std::fmt::Display for Coins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl std::str::FromStr for Coins {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::iter::Sum for Coins {
    /// Saturating sum; a balance can never wrap around.
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl Serialize for Coins {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

struct CoinsVisitor;

impl<'de> Visitor<'de> for CoinsVisitor {
    type Value = Coins;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a decimal string or number with at most two fractional digits")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Coins, E> {
        Coins::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Coins, E> {
        Coins::from_whole(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Coins, E> {
        let whole = i64::try_from(v).map_err(|_| E::custom(format!("amount {v} is out of range")))?;
        Coins::from_whole(whole).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Coins, E> {
        Coins::from_f64(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CoinsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_text() {
        assert_eq!(Coins::from_whole(5).unwrap().to_string(), "5");
        assert_eq!(Coins::from_hundredths(1250).to_string(), "12.5");
        assert_eq!(Coins::from_hundredths(1205).to_string(), "12.05");
        assert_eq!(Coins::from_hundredths(-25).to_string(), "-0.25");
        assert_eq!(Coins::ZERO.to_string(), "0");
        assert_eq!(
            Coins::from_hundredths(i64::MIN).to_string(),
            "-92233720368547758.08"
        );
    }

    #[test]
    fn test_from_f64() {
        assert_eq!(Coins::from_f64(12.5).unwrap(), Coins::from_hundredths(1250));
        assert_eq!(Coins::from_f64(0.29).unwrap(), Coins::from_hundredths(29));
        assert_eq!(Coins::from_f64(-3.0).unwrap(), Coins::from_hundredths(-300));
    }

    #[test]
    fn test_from_f64_rejects_nan_and_infinity() {
        assert!(matches!(
            Coins::from_f64(f64::NAN),
            Err(ValidationError::NonFiniteAmount(_))
        ));
        assert!(matches!(
            Coins::from_f64(f64::INFINITY),
            Err(ValidationError::NonFiniteAmount(_))
        ));
    }

    #[test]
    fn test_from_f64_rejects_sub_hundredths() {
        assert!(matches!(
            Coins::from_f64(0.001),
            Err(ValidationError::ExcessPrecision(_))
        ));
    }

    #[test]
    fn test_from_f64_rejects_out_of_range() {
        assert!(matches!(
            Coins::from_f64(1e300),
            Err(ValidationError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Coins::parse("12.5").unwrap(), Coins::from_hundredths(1250));
        assert_eq!(Coins::parse("7.50").unwrap(), Coins::from_hundredths(750));
        assert_eq!(Coins::parse("5.000").unwrap(), Coins::from_hundredths(500));
        assert_eq!(Coins::parse("-0.25").unwrap(), Coins::from_hundredths(-25));
        assert_eq!(Coins::parse(".5").unwrap(), Coins::from_hundredths(50));
        assert_eq!(Coins::parse("+3").unwrap(), Coins::from_hundredths(300));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "-", ".", "1.", "abc", "1e3", "1.2.3", "--1", " 1 2"] {
            assert!(Coins::parse(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(matches!(
            Coins::parse("0.125"),
            Err(ValidationError::ExcessPrecision(_))
        ));
        assert!(matches!(
            Coins::parse("99999999999999999999"),
            Err(ValidationError::AmountOutOfRange(_))
        ));
    }

    #[test]
    fn test_serde_string_and_number() {
        let c = Coins::from_hundredths(1250);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"12.5\"");
        assert_eq!(serde_json::from_str::<Coins>("\"12.5\"").unwrap(), c);
        assert_eq!(serde_json::from_str::<Coins>("12.5").unwrap(), c);
        assert_eq!(
            serde_json::from_str::<Coins>("5").unwrap(),
            Coins::from_hundredths(500)
        );
        assert!(serde_json::from_str::<Coins>("0.001").is_err());
    }

    #[test]
    fn test_sum_saturates() {
        let total: Coins = [Coins::from_hundredths(i64::MAX), Coins::from_hundredths(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Coins::from_hundredths(i64::MAX));
    }

    #[test]
    fn test_sign_helpers() {
        let c = Coins::from_hundredths(-150);
        assert!(c.is_negative());
        assert_eq!(c.abs(), Coins::from_hundredths(150));
        assert!(Coins::ZERO.is_zero());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_canonical_text_parses_back(h in any::<i64>()) {
            let c = Coins::from_hundredths(h);
            prop_assert_eq!(Coins::parse(&c.to_canonical_string()).unwrap(), c);
        }

        #[test]
        fn test_canonical_text_has_no_trailing_zero_fraction(h in any::<i64>()) {
            let text = Coins::from_hundredths(h).to_canonical_string();
            if let Some((_, frac)) = text.split_once('.') {
                prop_assert!(!frac.ends_with('0'));
            }
        }
    }
}
