//! Error types for the covpool liquidation engine.
//!
//! This module defines all error types used throughout the crate. Every
//! variant maps onto one of the [`ErrorCategory`] buckets so callers can
//! decide whether a rejected call is worth retrying.

use thiserror::Error;

/// Result type alias for covpool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a rejected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input, rejected before any state mutation
    Validation,
    /// Subject does not (yet) qualify; retryable as time advances
    NotEligible,
    /// Reserve seizure failed; retryable
    ReserveUnavailable,
    /// Caller logic error (wrong lifecycle step)
    StateConflict,
    /// Arithmetic, serialization or configuration failure
    Internal,
}

/// Main error type for covpool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Offer taken with a zero payment
    #[error("Can't pay 0 tokens")]
    ZeroPayment,

    /// Payment exceeds what the auction still needs
    #[error("Payment {payment} exceeds amount outstanding {outstanding}")]
    Overpay {
        /// Offered payment
        payment: u64,
        /// Amount still outstanding on the auction
        outstanding: u64,
    },

    /// Auction amount desired must be positive
    #[error("Amount desired must be greater than zero")]
    InvalidAmount,

    /// Auction duration must be positive
    #[error("Auction duration must be greater than zero")]
    DurationZero,

    /// Auction duration above the supported maximum
    #[error("Auction duration {duration}s exceeds maximum {max}s")]
    DurationTooLong {
        /// Requested duration in seconds
        duration: u64,
        /// Maximum supported duration in seconds
        max: u64,
    },

    /// Subject already has an open auction in the registry
    #[error("Auction already open for subject {0}")]
    AuctionAlreadyOpen(String),

    /// Auction was fully filled or terminated
    #[error("Auction {0} is not open")]
    AuctionNotOpen(String),

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Eligibility Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Subject exposure is below the auction threshold
    #[error("Subject {subject} not eligible: exposure {exposure}% below threshold {threshold}%")]
    NotEligible {
        /// Subject identifier
        subject: String,
        /// Reported bond exposure percentage
        exposure: u64,
        /// Configured threshold percentage
        threshold: u64,
    },

    /// Subject liquidation is not in progress
    #[error("Subject {0} liquidation is not in progress")]
    SubjectNotLiquidatable(String),

    // ═══════════════════════════════════════════════════════════════════
    // Reserve Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Reserve refused to seize the requested fraction
    #[error("Payout failed for auction {auction}: {reason}")]
    PayoutFailed {
        /// Auction on whose behalf the payout ran
        auction: String,
        /// Reason reported by the reserve
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // State Conflict Errors
    // ═══════════════════════════════════════════════════════════════════

    /// No open auction for the subject
    #[error("No active auction for subject {0}")]
    NoActiveAuction(String),

    /// Auction identifier unknown to the registry
    #[error("Auction not found: {0}")]
    AuctionNotFound(String),

    /// Orchestrator already delegated the subject to an auction
    #[error("Liquidation already in progress for subject {0}")]
    LiquidationInProgress(String),

    /// Subject was already finalized
    #[error("Subject {0} already resolved")]
    SubjectAlreadyResolved(String),

    /// Subject still reports itself as liquidatable
    #[error("Subject {0} is not in liquidated state")]
    SubjectStillLiquidatable(String),

    /// Close hook bound to a different subject than the auction's
    #[error("Subject mismatch: expected {expected}, got {got}")]
    SubjectMismatch {
        /// Subject of the auction
        expected: String,
        /// Subject the hook was bound to
        got: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Underflow in calculation
    #[error("Arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ZeroPayment
            | Error::Overpay { .. }
            | Error::InvalidAmount
            | Error::DurationZero
            | Error::DurationTooLong { .. }
            | Error::AuctionAlreadyOpen(_)
            | Error::AuctionNotOpen(_)
            | Error::InvalidParameter { .. } => ErrorCategory::Validation,

            Error::NotEligible { .. } | Error::SubjectNotLiquidatable(_) => {
                ErrorCategory::NotEligible
            }

            Error::PayoutFailed { .. } => ErrorCategory::ReserveUnavailable,

            Error::NoActiveAuction(_)
            | Error::AuctionNotFound(_)
            | Error::LiquidationInProgress(_)
            | Error::SubjectAlreadyResolved(_)
            | Error::SubjectStillLiquidatable(_)
            | Error::SubjectMismatch { .. } => ErrorCategory::StateConflict,

            Error::Overflow { .. }
            | Error::Underflow { .. }
            | Error::Serialization(_)
            | Error::Deserialization(_)
            | Error::Config(_)
            | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if retrying the same call later may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::NotEligible | ErrorCategory::ReserveUnavailable
        )
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(self, Error::Overflow { .. } | Error::Underflow { .. })
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Validation errors: 1xxx
            Error::ZeroPayment => 1001,
            Error::Overpay { .. } => 1002,
            Error::InvalidAmount => 1003,
            Error::DurationZero => 1004,
            Error::DurationTooLong { .. } => 1005,
            Error::AuctionAlreadyOpen(_) => 1006,
            Error::AuctionNotOpen(_) => 1007,
            Error::InvalidParameter { .. } => 1008,

            // Eligibility errors: 2xxx
            Error::NotEligible { .. } => 2001,
            Error::SubjectNotLiquidatable(_) => 2002,

            // Reserve errors: 3xxx
            Error::PayoutFailed { .. } => 3001,

            // State conflicts: 4xxx
            Error::NoActiveAuction(_) => 4001,
            Error::AuctionNotFound(_) => 4002,
            Error::LiquidationInProgress(_) => 4003,
            Error::SubjectAlreadyResolved(_) => 4004,
            Error::SubjectStillLiquidatable(_) => 4005,
            Error::SubjectMismatch { .. } => 4006,

            // Internal errors: 9xxx
            Error::Overflow { .. } => 9001,
            Error::Underflow { .. } => 9002,
            Error::Serialization(_) => 9003,
            Error::Deserialization(_) => 9004,
            Error::Config(_) => 9005,
            Error::Io(_) => 9006,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
