//! Interfaces to the systems around the auction machinery.
//!
//! - [`ReserveClaim`]: the pool of value auctions sell fractions of
//! - [`MonitoredSubject`]: a position that can be liquidated
//! - [`ProceedsRoute`]: where a finalized subject's proceeds go
//!
//! Auctions opened by the orchestrator are settled through a crate-private
//! close hook, so a full fill always finalizes its subject.
//!
//! [`memory`] provides in-memory implementations for tests and the CLI.

use thiserror::Error;

use crate::auction::Auction;
use crate::core::ids::{AccountId, SubjectId};
use crate::core::token::{CollateralAmount, TokenAmount};
use crate::error::Result;
use crate::utils::math::Ratio;

pub mod memory;

pub use memory::{InMemoryReserve, ProceedsEscrow, StubSubject};

/// Failure reported by a reserve when it cannot release funds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SeizeError(pub String);

impl SeizeError {
    /// Create from a reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Reserve that pays winning bidders
pub trait ReserveClaim {
    /// Transfer `fraction` of the current reserve to `recipient`
    fn seize(&mut self, fraction: Ratio, recipient: AccountId) -> std::result::Result<(), SeizeError>;
}

/// Position monitored for liquidation
pub trait MonitoredSubject {
    /// Subject identifier
    fn id(&self) -> SubjectId;

    /// Current bond exposure in percent
    fn bond_exposure_percent(&self) -> u64;

    /// Settlement amount needed to resolve the subject
    fn outstanding_obligation(&self) -> TokenAmount;

    /// Whether the subject is still in liquidation
    fn currently_liquidatable(&self) -> bool;

    /// Pay the obligation and release the subject's collateral
    fn finalize(&mut self, payment: TokenAmount) -> CollateralAmount;
}

/// Destination of collateral released on finalization
pub trait ProceedsRoute {
    /// Accept `proceeds` released by `subject`
    fn receive(&mut self, subject: SubjectId, proceeds: CollateralAmount);
}

/// Callback into the auction's owner when an offer closes the auction
pub(crate) trait AuctionCloseHook {
    /// Checked before the closing offer is paid out; an error aborts the offer
    fn before_close(&mut self, auction: &Auction) -> Result<()>;

    /// Run after the auction closed as fully filled
    fn on_close(&mut self, auction: &Auction, now: u64);
}

/// Hook for auctions nobody needs to be told about
#[cfg(test)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoCloseHook;

#[cfg(test)]
impl AuctionCloseHook for NoCloseHook {
    fn before_close(&mut self, _auction: &Auction) -> Result<()> {
        Ok(())
    }

    fn on_close(&mut self, _auction: &Auction, _now: u64) {}
}
