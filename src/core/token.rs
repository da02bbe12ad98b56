//! Token amounts.
//!
//! Strongly-typed amounts keep settlement currency and seized collateral
//! from being mixed up:
//! - [`TokenAmount`]: settlement currency paid by bidders and held as surplus
//! - [`CollateralAmount`]: proceeds released by a finalized subject
//! - [`TokenId`]: symbol of the settlement token an auction accepts

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Settlement currency amount in the token's smallest unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from base units
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Get raw base units
    pub fn units(&self) -> u64 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Addition that reports overflow as an error
    pub fn try_add(self, other: Self) -> Result<Self> {
        self.checked_add(other).ok_or(Error::Overflow {
            operation: format!("{} + {}", self.0, other.0),
        })
    }

    /// Subtraction that reports underflow as an error
    pub fn try_sub(self, other: Self) -> Result<Self> {
        self.checked_sub(other).ok_or(Error::Underflow {
            operation: format!("{} - {}", self.0, other.0),
        })
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TokenAmount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl From<TokenAmount> for u64 {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Collateral released by a subject on finalization (e.g. signer bonds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CollateralAmount(u64);

impl CollateralAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from base units
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Get raw base units
    pub fn units(&self) -> u64 {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for CollateralAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Symbol of the settlement token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Create a token id from a symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
