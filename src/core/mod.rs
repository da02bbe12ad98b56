//! Core modules for covpool.
//!
//! This module contains the fundamental building blocks:
//! - Orchestrator configuration
//! - Subject, account and auction identifiers
//! - Settlement and collateral amounts

pub mod config;
pub mod ids;
pub mod token;

pub use config::*;
pub use ids::*;
pub use token::*;
