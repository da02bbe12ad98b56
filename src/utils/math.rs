//! Exact rationals and checked arithmetic.
//!
//! This module provides safe arithmetic operations with overflow protection
//! and the [`Ratio`] type used for on-offer percentages and seized reserve
//! fractions.

use std::fmt;

use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::FLOATING_POINT_DIVISOR;

// ═══════════════════════════════════════════════════════════════════════════════
// RATIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Exact non-negative rational number, always stored in lowest terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    numerator: u128,
    denominator: u128,
}

impl Ratio {
    /// Zero (0/1)
    pub const ZERO: Self = Self {
        numerator: 0,
        denominator: 1,
    };

    /// One (1/1)
    pub const ONE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Create a ratio, reducing it to lowest terms
    pub fn new(numerator: u128, denominator: u128) -> Result<Self> {
        if denominator == 0 {
            return Err(Error::InvalidParameter {
                name: "denominator".into(),
                reason: "division by zero".into(),
            });
        }
        let divisor = gcd(numerator, denominator);
        Ok(Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    /// Create from a value scaled by [`FLOATING_POINT_DIVISOR`]
    pub fn from_scaled(raw: u128) -> Self {
        let divisor = gcd(raw, FLOATING_POINT_DIVISOR);
        Self {
            numerator: raw / divisor,
            denominator: FLOATING_POINT_DIVISOR / divisor,
        }
    }

    /// Numerator in lowest terms
    pub const fn numerator(&self) -> u128 {
        self.numerator
    }

    /// Denominator in lowest terms
    pub const fn denominator(&self) -> u128 {
        self.denominator
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Check if exactly one
    pub fn is_one(&self) -> bool {
        self.numerator == self.denominator
    }

    /// Floor of `self * scale`
    pub fn scaled(&self, scale: u128) -> Result<u128> {
        mul_div_u128(self.numerator, scale, self.denominator)
    }

    /// Approximate decimal value, for display and logging
    pub fn to_decimal(&self) -> Option<Decimal> {
        let numerator = Decimal::from_u128(self.numerator)?;
        let denominator = Decimal::from_u128(self.denominator)?;
        numerator.checked_div(denominator)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Greatest common divisor (Euclid)
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    if a == 0 {
        1
    } else {
        a
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CHECKED ARITHMETIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes (a * b) / c in u128, rounding down
pub fn mul_div_u128(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    let product = a.checked_mul(b).ok_or(Error::Overflow {
        operation: format!("{} * {}", a, b),
    })?;
    Ok(product / c)
}

/// Computes a / b in u128, rounding up
pub fn ceil_div_u128(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(Error::InvalidParameter {
            name: "divisor".into(),
            reason: "division by zero".into(),
        });
    }
    Ok(a / b + u128::from(a % b != 0))
}
