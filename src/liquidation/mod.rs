//! Liquidation module for covpool.
//!
//! This module decides how a liquidated subject is resolved:
//! - Direct buyout from surplus
//! - Delegation to a declining-price auction
//! - Surplus capture when a subject resolves elsewhere first

pub mod orchestrator;

pub use orchestrator::*;
