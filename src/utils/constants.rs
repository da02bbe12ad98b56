//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED POINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Scale of the depletion velocity and of seized reserve fractions (10^18)
pub const FLOATING_POINT_DIVISOR: u128 = 1_000_000_000_000_000_000;

/// Percentage divisor (100 = 100%)
pub const PERCENT_DIVISOR: u64 = 100;

// ═══════════════════════════════════════════════════════════════════════════════
// AUCTION CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default auction length - 24 hours
pub const DEFAULT_AUCTION_DURATION_SECS: u64 = 86_400;

/// Longest auction the curve arithmetic supports - 10 years
pub const MAX_AUCTION_DURATION_SECS: u64 = 10 * 365 * 86_400;

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum bond exposure (percent) before a subject can be put on auction
pub const DEFAULT_EXPOSURE_THRESHOLD_PERCENT: u64 = 75;

/// Highest exposure a subject can report
pub const MAX_EXPOSURE_PERCENT: u64 = 100;

/// Settlement token symbol used when none is configured
pub const DEFAULT_SETTLEMENT_TOKEN: &str = "TBTC";

/// Events retained in memory by the registry and orchestrator
pub const DEFAULT_MAX_EVENTS: usize = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of subject and account identifiers in bytes
pub const ID_LENGTH: usize = 32;
