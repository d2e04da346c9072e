//! Numeric conversions between loosely-typed archive fields and engine values.
//!
//! Contract:
//! - Every conversion here is total. Malformed input degrades to zero (or `None`
//!   for the `_opt` variants) and never panics.
//! - Amounts are arbitrary-precision integers in base units (`BigInt`).
//! - Display values are `f64` in human units, i.e. `raw / 10^decimals`.
//!
//! Upstream archives encode the same quantity as a JSON number in one source
//! and a decimal string in another, sometimes in scientific notation
//! (`"1.77068e+25"`). `RawNumeric` keeps whichever form arrived.

use std::borrow::Cow;
use std::fmt;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::domain::Timestamp;

/// A number as it appears in an archive record: JSON number or text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumeric {
    Number(serde_json::Number),
    Text(String),
}

impl RawNumeric {
    pub fn text(s: impl Into<String>) -> Self {
        RawNumeric::Text(s.into())
    }

    pub fn int(v: u64) -> Self {
        RawNumeric::Number(serde_json::Number::from(v))
    }

    /// Float constructor; non-finite values have no JSON form and become `0`.
    pub fn float(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(RawNumeric::Number)
            .unwrap_or_else(|| RawNumeric::int(0))
    }

    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawNumeric::Number(n) => Cow::Owned(n.to_string()),
            RawNumeric::Text(s) => Cow::Borrowed(s.trim()),
        }
    }
}

impl fmt::Display for RawNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for RawNumeric {
    fn from(s: &str) -> Self {
        RawNumeric::Text(s.to_string())
    }
}

impl From<u64> for RawNumeric {
    fn from(v: u64) -> Self {
        RawNumeric::int(v)
    }
}

// ---------------- Big integers ----------------

/// Exact integer parse: plain decimal digits (optional sign) or `0x` hex.
fn parse_exact_int(s: &str) -> Option<BigInt> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        return BigInt::parse_bytes(hex.as_bytes(), 16);
    }
    let digits = s.strip_prefix('+').unwrap_or(s);
    digits.parse::<BigInt>().ok()
}

fn exact_int_of(raw: &RawNumeric) -> Option<BigInt> {
    match raw {
        RawNumeric::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(BigInt::from(u))
            } else {
                n.as_i64().map(BigInt::from)
            }
        }
        RawNumeric::Text(s) => parse_exact_int(s),
    }
}

fn float_of(raw: &RawNumeric) -> Option<f64> {
    let v = match raw {
        RawNumeric::Number(n) => n.as_f64()?,
        RawNumeric::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    v.is_finite().then_some(v)
}

/// Integer value of `raw`, or `None` when absent or unparsable.
///
/// Fractional and scientific-notation inputs are floored.
pub fn to_big_int_opt(raw: Option<&RawNumeric>) -> Option<BigInt> {
    let raw = raw?;
    if let Some(n) = exact_int_of(raw) {
        return Some(n);
    }
    float_of(raw).and_then(|v| BigInt::from_f64(v.floor()))
}

/// Integer value of `raw`; `0` when absent or unparsable.
pub fn to_big_int(raw: Option<&RawNumeric>) -> BigInt {
    to_big_int_opt(raw).unwrap_or_default()
}

// ---------------- Decimal display values ----------------

fn pow10(decimals: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u32), decimals as usize)
}

/// `n / 10^decimals` as `f64`, splitting integer and fractional parts so that
/// large base-unit amounts keep their fractional digits.
pub fn scale_big_int(n: &BigInt, decimals: u32) -> f64 {
    if n.is_zero() {
        return 0.0;
    }
    if decimals == 0 {
        return n.to_f64().filter(|v| v.is_finite()).unwrap_or(0.0);
    }
    let divisor = pow10(decimals);
    let whole = n / &divisor;
    let frac = n % &divisor;
    let whole = whole.to_f64().unwrap_or(0.0);
    let frac = match (frac.to_f64(), divisor.to_f64()) {
        (Some(r), Some(d)) if d != 0.0 => r / d,
        _ => 0.0,
    };
    let out = whole + frac;
    if out.is_finite() {
        out
    } else {
        0.0
    }
}

/// Human-unit value of `raw` given the token's `decimals`; `0.0` on absent or
/// malformed input.
///
/// Non-integer inputs (`"12.5"`, `1.7e25`) are parsed as floats and scaled by
/// the same `10^-decimals` factor.
pub fn to_decimal(raw: Option<&RawNumeric>, decimals: u32) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    if let Some(n) = exact_int_of(raw) {
        return scale_big_int(&n, decimals);
    }
    match float_of(raw) {
        Some(v) => {
            let out = v / 10f64.powi(decimals as i32);
            if out.is_finite() {
                out
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

/// Base-unit decimal string for a human-unit value (inverse of `to_decimal`
/// within the precision of `decimals`). Non-finite input yields `"0"`.
pub fn to_raw_string(x: f64, decimals: u32) -> String {
    if !x.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", decimals as usize, x);
    let digits: String = fixed.chars().filter(|c| *c != '.').collect();
    digits
        .parse::<BigInt>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "0".to_string())
}

// ---------------- Timestamps ----------------

/// Unix-seconds timestamp; `None` for absent, non-finite or non-positive values.
pub fn to_timestamp(raw: Option<&RawNumeric>) -> Option<Timestamp> {
    let raw = raw?;
    if let Some(n) = exact_int_of(raw) {
        let secs = n.to_u64()?;
        return (secs > 0).then_some(Timestamp::from_secs(secs));
    }
    let v = float_of(raw)?;
    if v <= 0.0 {
        return None;
    }
    v.floor().to_u64().filter(|s| *s > 0).map(Timestamp::from_secs)
}

// ---------------- Percent helpers ----------------

/// Clamp a percentage into `[0, 100]`; non-finite values become `0`.
#[inline]
pub fn clamp_percentage(v: f64) -> f64 {
    if !v.is_finite() || v < 0.0 {
        0.0
    } else if v > 100.0 {
        100.0
    } else {
        v
    }
}

/// `num / den * 100`, or `0` when the denominator is not positive.
#[inline]
pub fn percent_of(num: f64, den: f64) -> f64 {
    if den > 0.0 && num.is_finite() {
        num / den * 100.0
    } else {
        0.0
    }
}

/// Serde adapter writing a `BigInt` as its decimal string.
pub mod big_int_string {
    use num_bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &BigInt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(d)?;
        s.parse::<BigInt>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(s: &str) -> RawNumeric {
        RawNumeric::text(s)
    }

    #[test]
    fn wei_strings_scale_to_tokens() {
        assert_eq!(to_decimal(Some(&t("3000000000000000000000")), 18), 3000.0);
        assert_eq!(to_decimal(Some(&t("1500000000000000000")), 18), 1.5);
        assert_eq!(to_decimal(Some(&RawNumeric::int(42)), 0), 42.0);
    }

    #[test]
    fn malformed_inputs_degrade_to_zero() {
        assert_eq!(to_decimal(None, 18), 0.0);
        assert_eq!(to_decimal(Some(&t("")), 18), 0.0);
        assert_eq!(to_decimal(Some(&t("abc")), 18), 0.0);
        assert_eq!(to_decimal(Some(&t("NaN")), 18), 0.0);
        assert_eq!(to_big_int(Some(&t("not a number"))), BigInt::zero());
        assert_eq!(to_big_int_opt(Some(&t("   "))), None);
        assert_eq!(to_big_int_opt(None), None);
    }

    #[test]
    fn big_int_handles_scientific_and_fractional_text() {
        assert_eq!(to_big_int(Some(&t("12.9"))), BigInt::from(12));
        assert_eq!(to_big_int(Some(&t("1e3"))), BigInt::from(1000));
        assert_eq!(to_big_int(Some(&t("0x1f"))), BigInt::from(31));
        assert_eq!(to_big_int(Some(&RawNumeric::float(7.75))), BigInt::from(7));
        // zero is a value, not absence
        assert_eq!(to_big_int_opt(Some(&t("0"))), Some(BigInt::zero()));
    }

    #[test]
    fn timestamps_reject_non_positive() {
        assert_eq!(to_timestamp(Some(&RawNumeric::int(0))), None);
        assert_eq!(to_timestamp(Some(&t("-5"))), None);
        assert_eq!(to_timestamp(Some(&t("inf"))), None);
        assert_eq!(
            to_timestamp(Some(&RawNumeric::int(1_700_000_000))),
            Some(Timestamp::from_secs(1_700_000_000))
        );
        assert_eq!(
            to_timestamp(Some(&RawNumeric::float(12.7))),
            Some(Timestamp::from_secs(12))
        );
    }

    #[test]
    fn raw_string_of_human_value() {
        assert_eq!(to_raw_string(3000.0, 18), "3000000000000000000000");
        assert_eq!(to_raw_string(0.25, 2), "25");
        assert_eq!(to_raw_string(f64::NAN, 18), "0");
    }

    #[test]
    fn percentages_clamp() {
        assert_eq!(clamp_percentage(-1.0), 0.0);
        assert_eq!(clamp_percentage(120.0), 100.0);
        assert_eq!(clamp_percentage(f64::INFINITY), 0.0);
        assert_eq!(percent_of(1.0, 0.0), 0.0);
        assert_eq!(percent_of(1.0, 4.0), 25.0);
    }

    proptest! {
        // Quarter steps are exact in binary, so the round trip must be exact.
        #[test]
        fn decimal_round_trip(k in 0u32..4_000_000, d in 2u32..=18) {
            let x = f64::from(k) / 4.0;
            let raw = to_raw_string(x, d);
            prop_assert_eq!(to_decimal(Some(&RawNumeric::Text(raw)), d), x);
        }

        #[test]
        fn conversions_are_total(s in ".*", d in 0u32..40) {
            let raw = RawNumeric::Text(s);
            let v = to_decimal(Some(&raw), d);
            prop_assert!(v.is_finite());
            let _ = to_big_int(Some(&raw));
            let _ = to_timestamp(Some(&raw));
        }
    }
}
