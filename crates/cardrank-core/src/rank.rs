//! The `Rank` ordering key.
//!
//! A rank is an arbitrary-precision decimal. Only its numeric value matters:
//! `15`, `15.0` and `15.000` are the same rank and compare equal. The
//! canonical text form is a plain decimal without exponent or trailing
//! fractional zeros, which is what storage collaborators persist.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RankError;

/// An ordering key. Smaller ranks sort first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rank(BigDecimal);

impl Rank {
    /// Wrap a decimal value.
    #[must_use]
    pub const fn new(value: BigDecimal) -> Self {
        Self(value)
    }

    /// Borrow the underlying decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// Consume the rank, returning the underlying decimal.
    #[must_use]
    pub fn into_decimal(self) -> BigDecimal {
        self.0
    }

    /// Exact half of this rank.
    #[must_use]
    pub fn half(&self) -> Self {
        Self(&self.0 * BigDecimal::new(5.into(), 1))
    }

    /// Exact sum of two ranks.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self(&self.0 + &other.0)
    }

    /// Exact difference `self - other`.
    #[must_use]
    pub fn minus(&self, other: &Self) -> Self {
        Self(&self.0 - &other.0)
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Drop the fractional part (rounds toward zero).
    #[must_use]
    pub fn trunc(&self) -> Self {
        Self(self.0.with_scale(0))
    }

    /// Returns `true` when the rank has no fractional part.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.0.with_scale(0) == self.0
    }

    /// Plain decimal text: no exponent, no trailing fractional zeros.
    #[must_use]
    pub fn to_plain_string(&self) -> String {
        let (digits, scale) = self.0.as_bigint_and_exponent();
        let raw = digits.to_string();
        let (negative, magnitude) = raw
            .strip_prefix('-')
            .map_or((false, raw.as_str()), |rest| (true, rest));

        if magnitude.bytes().all(|b| b == b'0') {
            return "0".to_string();
        }

        let mut text = if scale <= 0 {
            let zeros = usize::try_from(-scale).unwrap_or(0);
            format!("{magnitude}{}", "0".repeat(zeros))
        } else {
            let frac_len = usize::try_from(scale).unwrap_or(0);
            let padded = if magnitude.len() <= frac_len {
                format!("{}{magnitude}", "0".repeat(frac_len + 1 - magnitude.len()))
            } else {
                magnitude.to_string()
            };
            let (int_part, frac_part) = padded.split_at(padded.len() - frac_len);
            let frac_part = frac_part.trim_end_matches('0');
            if frac_part.is_empty() {
                int_part.to_string()
            } else {
                format!("{int_part}.{frac_part}")
            }
        };

        if negative {
            text.insert(0, '-');
        }
        text
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

impl FromStr for Rank {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RankError::InvalidRank(s.to_string()));
        }
        BigDecimal::from_str(trimmed)
            .map(Self)
            .map_err(|_| RankError::InvalidRank(s.to_string()))
    }
}

impl TryFrom<String> for Rank {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rank> for String {
    fn from(rank: Rank) -> Self {
        rank.to_plain_string()
    }
}

impl From<BigDecimal> for Rank {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl From<i64> for Rank {
    fn from(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl From<u64> for Rank {
    fn from(value: u64) -> Self {
        Self(BigDecimal::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::Rank;

    fn rank(s: &str) -> Rank {
        s.parse().expect("valid rank literal")
    }

    #[test]
    fn equality_ignores_scale() {
        assert_eq!(rank("15"), rank("15.000"));
        assert!(rank("15.5") > rank("15.49999"));
        assert!(rank("-3") < rank("-2.5"));
    }

    #[test]
    fn plain_string_is_canonical() {
        assert_eq!(rank("15.500").to_plain_string(), "15.5");
        assert_eq!(rank("1e3").to_plain_string(), "1000");
        assert_eq!(rank("-0.0005").to_plain_string(), "-0.0005");
        assert_eq!(rank("0.000").to_plain_string(), "0");
        assert_eq!(rank("-18446744073709551616").to_plain_string(), "-18446744073709551616");
        assert_eq!(rank("1.25E-2").to_plain_string(), "0.0125");
    }

    #[test]
    fn half_is_exact() {
        assert_eq!(rank("15").half(), rank("7.5"));
        assert_eq!(rank("0.0000001").half(), rank("0.00000005"));
        assert_eq!(rank("-3").half(), rank("-1.5"));
    }

    #[test]
    fn trunc_rounds_toward_zero() {
        assert_eq!(rank("12.99").trunc(), rank("12"));
        assert_eq!(rank("-12.99").trunc(), rank("-12"));
        assert!(rank("12").is_integer());
        assert!(!rank("12.5").is_integer());
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Rank>().is_err());
        assert!("twelve".parse::<Rank>().is_err());
        assert!("1.2.3".parse::<Rank>().is_err());
    }

    #[test]
    fn serde_uses_canonical_string() {
        let json = serde_json::to_string(&rank("10.50")).expect("serialize");
        assert_eq!(json, "\"10.5\"");
        let back: Rank = serde_json::from_str("\"-7.25\"").expect("deserialize");
        assert_eq!(back, rank("-7.25"));
        assert!(serde_json::from_str::<Rank>("\"nope\"").is_err());
    }
}
