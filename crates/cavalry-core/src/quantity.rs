//! # Quantities
//!
//! Quantities arrive from form inputs, intent payloads and hand-edited
//! storage. None of them are trusted; every path clamps instead of failing.
//!
//! ## Clamping Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input             for_add()     for_set()      stored (normalize)      │
//! │  ─────             ─────────     ─────────      ──────────────────      │
//! │  3                 3             3              3                       │
//! │  2.7               2             2              2                       │
//! │  0.5               1             1              1                       │
//! │  0                 1             0 (remove)     1                       │
//! │  -5                1             0 (remove)     1                       │
//! │  NaN / ±∞          1             0 (remove)     1                       │
//! │  > u32::MAX        u32::MAX      u32::MAX       u32::MAX                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `set_qty` deletes on a low quantity. Normalization never does.

use std::str::FromStr;

use crate::error::ValidationError;

/// A quantity as requested by a caller, before clamping.
///
/// Converts from every integer and float type so callers can pass whatever
/// their input produced: `store.add("p1", 2, None)`, `store.set_qty(key, 1.5)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestedQuantity(f64);

impl RequestedQuantity {
    /// The default quantity for add operations.
    pub const ONE: RequestedQuantity = RequestedQuantity(1.0);

    /// Wraps a raw value.
    pub const fn new(raw: f64) -> Self {
        RequestedQuantity(raw)
    }

    /// Parses form text, mapping anything unparsable to NaN.
    ///
    /// Empty text and garbage both end up clamped by the operation that
    /// consumes the quantity, the same as a form field left blank.
    pub fn lenient(text: &str) -> Self {
        text.trim()
            .parse::<f64>()
            .map(RequestedQuantity)
            .unwrap_or(RequestedQuantity(f64::NAN))
    }

    /// Returns the raw value.
    pub const fn raw(&self) -> f64 {
        self.0
    }

    /// Quantity to add: at least 1, fractions truncated.
    ///
    /// Non-finite input counts as invalid and clamps to the minimum.
    pub fn for_add(&self) -> u32 {
        if !self.0.is_finite() {
            return 1;
        }
        saturate(self.0).max(1)
    }

    /// Quantity to set: 0 means "remove the item".
    ///
    /// Non-finite and non-positive input maps to 0. Any positive value keeps
    /// the item with at least quantity 1.
    pub fn for_set(&self) -> u32 {
        if !self.0.is_finite() || self.0 <= 0.0 {
            return 0;
        }
        saturate(self.0).max(1)
    }
}

impl Default for RequestedQuantity {
    fn default() -> Self {
        RequestedQuantity::ONE
    }
}

/// Clamps a stored quantity to an integer ≥ 1.
///
/// Used by normalization, which repairs low quantities instead of dropping
/// the item.
pub fn clamp_stored(raw: f64) -> u32 {
    if !raw.is_finite() {
        return 1;
    }
    saturate(raw).max(1)
}

/// Truncates toward zero and saturates into `0..=u32::MAX`.
fn saturate(raw: f64) -> u32 {
    let truncated = raw.trunc();
    if truncated <= 0.0 {
        0
    } else if truncated >= u32::MAX as f64 {
        u32::MAX
    } else {
        truncated as u32
    }
}

// =============================================================================
// Conversions
// =============================================================================

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RequestedQuantity {
                fn from(value: $ty) -> Self {
                    RequestedQuantity(value as f64)
                }
            }
        )*
    };
}

impl_from_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl FromStr for RequestedQuantity {
    type Err = ValidationError;

    /// Strict parse for callers that want to reject garbage up front.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map(RequestedQuantity)
            .map_err(|_| ValidationError::invalid_format("qty", format!("'{}' is not a number", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_add_clamps_to_one() {
        assert_eq!(RequestedQuantity::from(3).for_add(), 3);
        assert_eq!(RequestedQuantity::from(0).for_add(), 1);
        assert_eq!(RequestedQuantity::from(-4).for_add(), 1);
        assert_eq!(RequestedQuantity::from(2.7).for_add(), 2);
        assert_eq!(RequestedQuantity::from(f64::NAN).for_add(), 1);
        assert_eq!(RequestedQuantity::from(f64::INFINITY).for_add(), 1);
    }

    #[test]
    fn test_for_set_zero_means_remove() {
        assert_eq!(RequestedQuantity::from(5).for_set(), 5);
        assert_eq!(RequestedQuantity::from(0).for_set(), 0);
        assert_eq!(RequestedQuantity::from(-1).for_set(), 0);
        assert_eq!(RequestedQuantity::from(f64::NAN).for_set(), 0);
        assert_eq!(RequestedQuantity::from(f64::NEG_INFINITY).for_set(), 0);
        assert_eq!(RequestedQuantity::from(f64::INFINITY).for_set(), 0);
        assert_eq!(RequestedQuantity::from(0.5).for_set(), 1);
    }

    #[test]
    fn test_saturates_large_values() {
        assert_eq!(RequestedQuantity::from(u64::MAX).for_add(), u32::MAX);
        assert_eq!(RequestedQuantity::from(1e12).for_set(), u32::MAX);
        assert_eq!(clamp_stored(1e15), u32::MAX);
    }

    #[test]
    fn test_clamp_stored() {
        assert_eq!(clamp_stored(-5.0), 1);
        assert_eq!(clamp_stored(0.0), 1);
        assert_eq!(clamp_stored(7.9), 7);
        assert_eq!(clamp_stored(f64::NAN), 1);
    }

    #[test]
    fn test_parsing() {
        assert_eq!("4".parse::<RequestedQuantity>().unwrap().for_add(), 4);
        assert_eq!(" 2 ".parse::<RequestedQuantity>().unwrap().for_add(), 2);
        assert!("abc".parse::<RequestedQuantity>().is_err());

        assert_eq!(RequestedQuantity::lenient("").for_add(), 1);
        assert_eq!(RequestedQuantity::lenient("abc").for_set(), 0);
        assert_eq!(RequestedQuantity::lenient("6").for_add(), 6);
    }
}
