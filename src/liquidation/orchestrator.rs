//! Liquidation Orchestrator.
//!
//! Decides per subject whether to buy it out directly from surplus or to open
//! an auction, finalizes subjects when their auction fills, and captures the
//! collected funds of auctions cut short by an external resolution.
//!
//! Surplus is only ever spent on a full direct buyout. A subject whose
//! obligation exceeds the surplus gets an auction for the whole obligation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auction::{Auction, AuctionRegistry, OfferFill, OfferOrder};
use crate::collaborators::{AuctionCloseHook, MonitoredSubject, ProceedsRoute, ReserveClaim};
use crate::core::config::OrchestratorConfig;
use crate::core::ids::{AuctionId, SubjectId};
use crate::core::token::{CollateralAmount, TokenAmount};
use crate::error::{Error, Result};
use crate::events::{CovpoolEvent, EventLog, Resolution};

// ═══════════════════════════════════════════════════════════════════════════════
// SUBJECT STATUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a subject stands in the liquidation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectStatus {
    /// Not known to the orchestrator
    Inactive,
    /// Delegated to an open auction
    AuctionOpen(AuctionId),
    /// Terminal
    Resolved(Resolution),
}

/// Outcome of [`LiquidationOrchestrator::notify_liquidation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationDecision {
    /// Bought out from surplus
    DirectBuyout {
        /// Surplus spent
        cost: TokenAmount,
        /// Collateral routed to the proceeds destination
        proceeds: CollateralAmount,
    },
    /// Auction opened for the obligation
    AuctionOpened(AuctionId),
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-subject liquidation state machine and surplus keeper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationOrchestrator {
    config: OrchestratorConfig,
    surplus: TokenAmount,
    delegates: HashMap<SubjectId, AuctionId>,
    resolved: HashMap<SubjectId, Resolution>,
    events: EventLog,
}

impl LiquidationOrchestrator {
    /// Create an orchestrator with no surplus
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        let events = EventLog::with_capacity(config.max_events);

        Ok(Self {
            config,
            surplus: TokenAmount::ZERO,
            delegates: HashMap::new(),
            resolved: HashMap::new(),
            events,
        })
    }

    /// A registry sized to this orchestrator's event retention
    pub fn new_registry(&self) -> AuctionRegistry {
        AuctionRegistry::with_max_events(self.config.max_events)
    }

    /// Handle a subject entering liquidation
    ///
    /// Buys the subject out if the surplus covers its obligation, otherwise
    /// opens an auction for the full obligation.
    pub fn notify_liquidation<S, P>(
        &mut self,
        registry: &mut AuctionRegistry,
        subject: &mut S,
        route: &mut P,
        now: u64,
    ) -> Result<LiquidationDecision>
    where
        S: MonitoredSubject + ?Sized,
        P: ProceedsRoute + ?Sized,
    {
        let id = subject.id();
        match self.status(&id) {
            SubjectStatus::Resolved(_) => return Err(Error::SubjectAlreadyResolved(id.to_string())),
            SubjectStatus::AuctionOpen(_) => return Err(Error::LiquidationInProgress(id.to_string())),
            SubjectStatus::Inactive => {}
        }
        if !subject.currently_liquidatable() {
            return Err(Error::SubjectNotLiquidatable(id.to_string()));
        }

        let exposure = subject.bond_exposure_percent();
        let threshold = self.config.exposure_threshold_percent;
        if exposure < threshold {
            return Err(Error::NotEligible {
                subject: id.to_string(),
                exposure,
                threshold,
            });
        }

        let cost = subject.outstanding_obligation();
        if cost.is_zero() {
            return Err(Error::InvalidAmount);
        }

        if self.surplus >= cost {
            let surplus = self.surplus.try_sub(cost)?;
            let proceeds = subject.finalize(cost);
            route.receive(id, proceeds);

            self.surplus = surplus;
            self.resolve(id, Resolution::DirectBuyout, now);
            self.events.push(CovpoolEvent::SurplusUpdated {
                new_surplus: surplus,
                timestamp: now,
            });

            tracing::info!(%id, %cost, %proceeds, %surplus, "subject bought out from surplus");
            return Ok(LiquidationDecision::DirectBuyout { cost, proceeds });
        }

        let auction_id = registry.create_auction(
            id,
            self.config.settlement_token.clone(),
            cost,
            self.config.auction_duration_secs,
            now,
        )?;
        self.delegates.insert(id, auction_id);

        if !self.surplus.is_zero() {
            tracing::debug!(%id, surplus = %self.surplus, %cost, "surplus below obligation, left untouched");
        }
        tracing::info!(%id, %auction_id, %cost, surplus = %self.surplus, "subject delegated to auction");
        Ok(LiquidationDecision::AuctionOpened(auction_id))
    }

    /// Handle a subject resolved outside the pool while its auction was open
    ///
    /// Terminates the auction and adds what it collected to the surplus.
    pub fn notify_liquidated<S>(
        &mut self,
        registry: &mut AuctionRegistry,
        subject: &S,
        now: u64,
    ) -> Result<TokenAmount>
    where
        S: MonitoredSubject + ?Sized,
    {
        let id = subject.id();
        let auction_id = match self.status(&id) {
            SubjectStatus::AuctionOpen(auction_id) => auction_id,
            SubjectStatus::Resolved(_) => return Err(Error::SubjectAlreadyResolved(id.to_string())),
            SubjectStatus::Inactive => return Err(Error::NoActiveAuction(id.to_string())),
        };
        if subject.currently_liquidatable() {
            return Err(Error::SubjectStillLiquidatable(id.to_string()));
        }

        let pending = registry
            .auction(auction_id)
            .filter(|auction| auction.is_open())
            .map(Auction::amount_collected)
            .ok_or_else(|| Error::NoActiveAuction(id.to_string()))?;
        let surplus = self.surplus.try_add(pending)?;

        let collected = registry.early_terminate(&id, now)?;
        self.surplus = surplus;
        self.delegates.remove(&id);
        self.resolve(id, Resolution::ExternallyLiquidated, now);
        self.events.push(CovpoolEvent::SurplusUpdated {
            new_surplus: surplus,
            timestamp: now,
        });

        tracing::info!(%id, %auction_id, %collected, %surplus, "auction proceeds captured as surplus");
        Ok(collected)
    }

    /// Take a bidder's offer on the auction `subject` is delegated to
    ///
    /// The reserve fraction on offer is seized for `order.bidder`. When the
    /// offer closes the auction, the subject must still be liquidatable; it
    /// is then finalized, its proceeds go to `route` and it is resolved as
    /// [`Resolution::AuctionFilled`] before this returns.
    ///
    /// This is the only public way to fill an auction:
    ///
    /// ```compile_fail
    /// use covpool::prelude::*;
    ///
    /// let mut registry = AuctionRegistry::new();
    /// let order = OfferOrder::new(AuctionId::new(1), AccountId::from_label("bidder"), TokenAmount::from_units(1));
    /// let mut reserve = InMemoryReserve::new(1_000);
    /// let _ = registry.take_offer(&order, 0, &mut reserve, &mut ());
    /// ```
    pub fn take_offer<S, P, R>(
        &mut self,
        registry: &mut AuctionRegistry,
        order: &OfferOrder,
        subject: &mut S,
        route: &mut P,
        reserve: &mut R,
        now: u64,
    ) -> Result<OfferFill>
    where
        S: MonitoredSubject + ?Sized,
        P: ProceedsRoute + ?Sized,
        R: ReserveClaim + ?Sized,
    {
        let auction = registry
            .auction(order.auction_id)
            .ok_or_else(|| Error::AuctionNotFound(order.auction_id.to_string()))?;
        let id = subject.id();
        if auction.subject() != id {
            return Err(Error::SubjectMismatch {
                expected: auction.subject().to_string(),
                got: id.to_string(),
            });
        }

        let mut hook = self.close_hook(subject, route);
        registry.take_offer(order, now, reserve, &mut hook)
    }

    fn close_hook<'a, S, P>(&'a mut self, subject: &'a mut S, route: &'a mut P) -> SettlementHook<'a, S, P>
    where
        S: MonitoredSubject + ?Sized,
        P: ProceedsRoute + ?Sized,
    {
        SettlementHook {
            orchestrator: self,
            subject,
            route,
        }
    }

    fn resolve(&mut self, id: SubjectId, resolution: Resolution, now: u64) {
        self.resolved.insert(id, resolution);
        self.events.push(CovpoolEvent::SubjectResolved {
            subject: id,
            resolution,
            timestamp: now,
        });
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════

    /// Settlement tokens available for direct buyouts
    pub fn surplus(&self) -> TokenAmount {
        self.surplus
    }

    /// Configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Exposure threshold in percent
    pub fn threshold(&self) -> u64 {
        self.config.exposure_threshold_percent
    }

    /// Status of a subject
    pub fn status(&self, subject: &SubjectId) -> SubjectStatus {
        if let Some(resolution) = self.resolved.get(subject) {
            SubjectStatus::Resolved(*resolution)
        } else if let Some(auction_id) = self.delegates.get(subject) {
            SubjectStatus::AuctionOpen(*auction_id)
        } else {
            SubjectStatus::Inactive
        }
    }

    /// Auction the subject is delegated to, if any
    pub fn auction_for(&self, subject: &SubjectId) -> Option<AuctionId> {
        self.delegates.get(subject).copied()
    }

    /// Recorded events
    pub fn events(&self) -> &[CovpoolEvent] {
        self.events.events()
    }

    /// Take recorded events
    pub fn drain_events(&mut self) -> Vec<CovpoolEvent> {
        self.events.drain()
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SETTLEMENT HOOK
// ═══════════════════════════════════════════════════════════════════════════════

/// Finalizes a subject and routes its proceeds when its auction fills
pub(crate) struct SettlementHook<'a, S: ?Sized, P: ?Sized> {
    orchestrator: &'a mut LiquidationOrchestrator,
    subject: &'a mut S,
    route: &'a mut P,
}

impl<S, P> AuctionCloseHook for SettlementHook<'_, S, P>
where
    S: MonitoredSubject + ?Sized,
    P: ProceedsRoute + ?Sized,
{
    fn before_close(&mut self, auction: &Auction) -> Result<()> {
        // subject identity is checked by `LiquidationOrchestrator::take_offer`
        let id = self.subject.id();
        if self.orchestrator.auction_for(&id) != Some(auction.id()) {
            return Err(Error::NoActiveAuction(id.to_string()));
        }
        if !self.subject.currently_liquidatable() {
            return Err(Error::SubjectNotLiquidatable(id.to_string()));
        }
        Ok(())
    }

    fn on_close(&mut self, auction: &Auction, now: u64) {
        let id = self.subject.id();
        let proceeds = self.subject.finalize(auction.amount_collected());
        self.route.receive(id, proceeds);

        self.orchestrator.delegates.remove(&id);
        self.orchestrator.resolve(id, Resolution::AuctionFilled, now);

        tracing::info!(%id, auction_id = %auction.id(), %proceeds, "subject settled by auction");
    }
}
