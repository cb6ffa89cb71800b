//! The numeric domain ranks live in.
//!
//! A [`RankSpace`] fixes the representable bounds, the precision the storage
//! collaborator can retain, and the threshold below which a neighbour
//! interval counts as exhausted. It is a plain value: every decision it makes
//! is a pure function of its inputs.

use bigdecimal::BigDecimal;
use std::num::NonZeroU64;

use crate::error::RankError;
use crate::rank::Rank;

/// How many significant digits a stored rank may keep.
///
/// Supplied by the storage collaborator: engines with unlimited decimal
/// precision use [`PrecisionPolicy::Unlimited`], engines with a fixed-width
/// numeric column supply their digit limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecisionPolicy {
    #[default]
    Unlimited,
    SignificantDigits(NonZeroU64),
}

impl PrecisionPolicy {
    /// Map a raw significant-figure count to a policy; `0` means unlimited.
    #[must_use]
    pub const fn from_sig_figs(sig_figs: u64) -> Self {
        match NonZeroU64::new(sig_figs) {
            Some(digits) => Self::SignificantDigits(digits),
            None => Self::Unlimited,
        }
    }

    /// The raw significant-figure count; `0` means unlimited.
    #[must_use]
    pub const fn sig_figs(self) -> u64 {
        match self {
            Self::Unlimited => 0,
            Self::SignificantDigits(digits) => digits.get(),
        }
    }
}

/// Bounds, precision and exhaustion threshold for one ranking domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankSpace {
    min: Rank,
    max: Rank,
    threshold: Rank,
    precision: PrecisionPolicy,
}

impl RankSpace {
    /// Build a rank space, validating `0 < threshold`, `min < 2 * threshold < max`
    /// and that `precision` can resolve the threshold everywhere in the space.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InvalidBounds`] when the bounds are inverted or the
    /// threshold does not fit strictly inside them, and
    /// [`RankError::InsufficientPrecision`] when the precision cap is too small.
    pub fn new(
        min: Rank,
        max: Rank,
        threshold: Rank,
        precision: PrecisionPolicy,
    ) -> Result<Self, RankError> {
        let zero = Rank::from(0_i64);
        let double_threshold = threshold.plus(&threshold);
        if threshold <= zero || min >= double_threshold || double_threshold >= max {
            return Err(RankError::InvalidBounds {
                min: min.to_plain_string(),
                max: max.to_plain_string(),
                threshold: threshold.to_plain_string(),
            });
        }

        Self {
            min,
            max,
            threshold,
            precision: PrecisionPolicy::Unlimited,
        }
        .with_precision(precision)
    }

    /// The same space with a different precision policy.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::InsufficientPrecision`] when `precision` keeps
    /// fewer digits than [`RankSpace::required_sig_figs`].
    pub fn with_precision(mut self, precision: PrecisionPolicy) -> Result<Self, RankError> {
        if let PrecisionPolicy::SignificantDigits(digits) = precision {
            let required = self.required_sig_figs();
            if digits.get() < required {
                return Err(RankError::InsufficientPrecision {
                    sig_figs: digits.get(),
                    required,
                });
            }
        }
        self.precision = precision;
        Ok(self)
    }

    /// Fewest significant digits that still resolve the threshold at the
    /// largest magnitude in the space: the integer digits of that magnitude,
    /// the fractional digits of the threshold, and one guard digit.
    ///
    /// With that many digits a rounded midpoint of any interval that does not
    /// collide stays strictly between its bounds.
    #[must_use]
    pub fn required_sig_figs(&self) -> u64 {
        let magnitude = self.min.abs().max(self.max.abs());
        let integer = magnitude.trunc().to_plain_string();
        let integer_digits = if integer == "0" { 0 } else { integer.len() };

        let threshold = self.threshold.to_plain_string();
        let fractional_digits = threshold.split_once('.').map_or(0, |(_, frac)| frac.len());

        u64::try_from(integer_digits + fractional_digits).map_or(u64::MAX, |d| d.saturating_add(1))
    }

    /// Smallest representable rank.
    #[must_use]
    pub const fn min(&self) -> &Rank {
        &self.min
    }

    /// Largest representable rank.
    #[must_use]
    pub const fn max(&self) -> &Rank {
        &self.max
    }

    /// Half-interval size below which a split is refused.
    #[must_use]
    pub const fn threshold(&self) -> &Rank {
        &self.threshold
    }

    #[must_use]
    pub const fn precision(&self) -> PrecisionPolicy {
        self.precision
    }

    /// Returns `true` when `rank` lies inside `[min, max]`.
    #[must_use]
    pub fn contains(&self, rank: &Rank) -> bool {
        &self.min <= rank && rank <= &self.max
    }

    /// Round `value` to the configured significant digits and clamp it into
    /// the space. A no-op apart from clamping under unlimited precision.
    #[must_use]
    pub fn reduce(&self, value: &Rank) -> Rank {
        let reduced = match self.precision {
            PrecisionPolicy::Unlimited => value.clone(),
            PrecisionPolicy::SignificantDigits(digits) => {
                Rank::new(value.as_decimal().with_prec(digits.get()))
            }
        };

        if reduced < self.min {
            self.min.clone()
        } else if reduced > self.max {
            self.max.clone()
        } else {
            reduced
        }
    }

    /// `reduce((a + b) / 2)`.
    #[must_use]
    pub fn midpoint(&self, a: &Rank, b: &Rank) -> Rank {
        self.reduce(&a.plus(b).half())
    }

    /// Returns `true` when the interval `[min, max]` is too narrow to split
    /// again without losing precision: `reduce((max - min) / 2) < threshold`.
    #[must_use]
    pub fn collides_with_bounds(&self, min: &Rank, max: &Rank) -> bool {
        if min == max {
            return true;
        }
        self.reduce(&max.minus(min).half()) < self.threshold
    }
}

impl Default for RankSpace {
    /// `[-2^64, 2^64]` with a `1e-7` threshold and unlimited precision.
    fn default() -> Self {
        let bound = BigDecimal::from(u64::MAX) + BigDecimal::from(1_u64);
        Self {
            min: Rank::new(-bound.clone()),
            max: Rank::new(bound),
            threshold: Rank::new(BigDecimal::new(1.into(), 7)),
            precision: PrecisionPolicy::Unlimited,
        }
    }
}
