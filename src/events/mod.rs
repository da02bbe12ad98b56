//! Observability events.
//!
//! Every state transition of the auction registry and the liquidation
//! orchestrator is recorded as a [`CovpoolEvent`]. Events are kept in a
//! bounded in-memory [`EventLog`] and mirrored to `tracing`.

use serde::{Deserialize, Serialize};

use crate::core::ids::{AccountId, AuctionId, SubjectId};
use crate::core::token::TokenAmount;
use crate::utils::constants::DEFAULT_MAX_EVENTS;
use crate::utils::math::Ratio;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Why an auction stopped accepting offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Amount desired was collected in full
    FullyFilled,
    /// Orchestrator terminated it after an external resolution
    EarlyTerminated,
}

/// How a subject left the liquidation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Bought out with surplus, no auction opened
    DirectBuyout,
    /// Auction fully filled and proceeds routed
    AuctionFilled,
    /// Resolved outside the pool while its auction was open
    ExternallyLiquidated,
}

/// All covpool event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovpoolEvent {
    /// Auction was opened for a subject
    AuctionCreated {
        /// Liquidated subject
        subject: SubjectId,
        /// New auction
        auction_id: AuctionId,
        /// Settlement amount the auction must collect
        amount_desired: TokenAmount,
        /// Auction length in seconds
        duration: u64,
        /// Creation time
        timestamp: u64,
    },
    /// A bidder paid into an auction and received a reserve fraction
    AuctionOfferTaken {
        /// Auction filled
        auction_id: AuctionId,
        /// Paying bidder, recipient of the reserve fraction
        bidder: AccountId,
        /// Settlement amount paid
        payment_amount: TokenAmount,
        /// Reserve fraction seized for the bidder
        reserve_fraction_paid: Ratio,
        /// Fill time
        timestamp: u64,
    },
    /// Auction closed
    AuctionClosed {
        /// Closed auction
        auction_id: AuctionId,
        /// Close reason
        reason: CloseReason,
        /// Close time
        timestamp: u64,
    },
    /// Orchestrator surplus changed
    SurplusUpdated {
        /// Surplus after the change
        new_surplus: TokenAmount,
        /// Update time
        timestamp: u64,
    },
    /// Subject reached its terminal state
    SubjectResolved {
        /// Resolved subject
        subject: SubjectId,
        /// How it was resolved
        resolution: Resolution,
        /// Resolution time
        timestamp: u64,
    },
}

impl CovpoolEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AuctionCreated { .. } => "AuctionCreated",
            Self::AuctionOfferTaken { .. } => "AuctionOfferTaken",
            Self::AuctionClosed { .. } => "AuctionClosed",
            Self::SurplusUpdated { .. } => "SurplusUpdated",
            Self::SubjectResolved { .. } => "SubjectResolved",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::AuctionCreated { timestamp, .. }
            | Self::AuctionOfferTaken { timestamp, .. }
            | Self::AuctionClosed { timestamp, .. }
            | Self::SurplusUpdated { timestamp, .. }
            | Self::SubjectResolved { timestamp, .. } => *timestamp,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Bounded, append-only collection of events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<CovpoolEvent>,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_EVENTS)
    }

    /// Create a log keeping at most `max_events` recent events
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events: max_events.max(1),
        }
    }

    /// Add an event (with pruning)
    pub fn push(&mut self, event: CovpoolEvent) {
        tracing::debug!(event_type = event.event_type(), ?event, "event recorded");
        self.events.push(event);

        if self.events.len() > self.max_events {
            self.events.drain(0..self.events.len() - self.max_events);
        }
    }

    /// Get all retained events
    pub fn events(&self) -> &[CovpoolEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&CovpoolEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Take all retained events, leaving the log empty
    pub fn drain(&mut self) -> Vec<CovpoolEvent> {
        std::mem::take(&mut self.events)
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
