//! Utility modules for covpool.
//!
//! This module contains shared utilities used across the crate:
//! - Exact rationals and checked arithmetic
//! - Constants

pub mod constants;
pub mod math;

pub use constants::*;
pub use math::*;
