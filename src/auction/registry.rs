//! Auction Registry.
//!
//! Owns every auction, maps each subject to its single open auction and
//! performs reserve payouts on an auction's behalf. Closed auctions stay in
//! the registry for audit but can no longer be filled.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::auction::record::{Auction, OfferFill};
use crate::collaborators::{AuctionCloseHook, ReserveClaim};
use crate::core::ids::{AccountId, AuctionId, SubjectId};
use crate::core::token::{TokenAmount, TokenId};
use crate::error::{Error, Result};
use crate::events::{CloseReason, CovpoolEvent, EventLog};
use crate::utils::math::Ratio;

/// Offer submitted by a bidder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferOrder {
    /// Auction to fill
    pub auction_id: AuctionId,
    /// Bidder paying and receiving the reserve fraction
    pub bidder: AccountId,
    /// Settlement amount paid
    pub payment: TokenAmount,
}

impl OfferOrder {
    /// Create an order
    pub fn new(auction_id: AuctionId, bidder: AccountId, payment: TokenAmount) -> Self {
        Self {
            auction_id,
            bidder,
            payment,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUCTION REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Collection of auctions with per-subject exclusivity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionRegistry {
    auctions: BTreeMap<AuctionId, Auction>,
    active: HashMap<SubjectId, AuctionId>,
    next_id: u64,
    events: EventLog,
}

impl Default for AuctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AuctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_max_events(crate::utils::constants::DEFAULT_MAX_EVENTS)
    }

    /// Create an empty registry keeping at most `max_events` events
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            auctions: BTreeMap::new(),
            active: HashMap::new(),
            next_id: 1,
            events: EventLog::with_capacity(max_events),
        }
    }

    /// Open an auction for `subject` at `now`
    pub fn create_auction(
        &mut self,
        subject: SubjectId,
        token: TokenId,
        amount_desired: TokenAmount,
        duration: u64,
        now: u64,
    ) -> Result<AuctionId> {
        let id = AuctionId::new(self.next_id);
        let auction = Auction::new(id, subject, token, amount_desired, duration, now)?;

        if self.active.contains_key(&subject) {
            return Err(Error::AuctionAlreadyOpen(subject.to_string()));
        }
        let next_id = self.next_id.checked_add(1).ok_or(Error::Overflow {
            operation: "auction id".into(),
        })?;

        self.next_id = next_id;
        self.auctions.insert(id, auction);
        self.active.insert(subject, id);
        self.events.push(CovpoolEvent::AuctionCreated {
            subject,
            auction_id: id,
            amount_desired,
            duration,
            timestamp: now,
        });

        tracing::info!(%id, %subject, %amount_desired, duration, "auction created");
        Ok(id)
    }

    /// Take an offer on behalf of a bidder
    ///
    /// The reserve fraction is seized for the bidder before the auction
    /// changes. When the offer closes the auction, `hook.before_close` may
    /// veto it before anything is paid and `hook.on_close` runs afterwards.
    ///
    /// Bidders reach this through
    /// [`LiquidationOrchestrator::take_offer`](crate::liquidation::LiquidationOrchestrator::take_offer).
    pub(crate) fn take_offer<R, H>(
        &mut self,
        order: &OfferOrder,
        now: u64,
        reserve: &mut R,
        hook: &mut H,
    ) -> Result<OfferFill>
    where
        R: ReserveClaim + ?Sized,
        H: AuctionCloseHook + ?Sized,
    {
        let id = order.auction_id;
        let auction = self
            .auctions
            .get_mut(&id)
            .ok_or_else(|| Error::AuctionNotFound(id.to_string()))?;

        auction.validate_payment(order.payment)?;
        if auction.would_fill(order.payment) {
            hook.before_close(auction)?;
        }

        let bidder = order.bidder;
        let fill = auction.take_offer(order.payment, now, |fraction| {
            Self::payout(reserve, id, bidder, fraction)
        })?;

        self.events.push(CovpoolEvent::AuctionOfferTaken {
            auction_id: id,
            bidder,
            payment_amount: order.payment,
            reserve_fraction_paid: fill.reserve_fraction,
            timestamp: now,
        });
        tracing::info!(
            %id,
            %bidder,
            payment = %order.payment,
            fraction = %fill.reserve_fraction,
            "offer taken"
        );

        if fill.fully_filled {
            let subject = auction.subject();
            self.active.remove(&subject);
            self.events.push(CovpoolEvent::AuctionClosed {
                auction_id: id,
                reason: CloseReason::FullyFilled,
                timestamp: now,
            });
            tracing::info!(%id, %subject, "auction fully filled");
            hook.on_close(auction, now);
        }

        Ok(fill)
    }

    /// Close the open auction of `subject`, returning the amount it collected
    pub(crate) fn early_terminate(&mut self, subject: &SubjectId, now: u64) -> Result<TokenAmount> {
        let id = self
            .active
            .get(subject)
            .copied()
            .ok_or_else(|| Error::NoActiveAuction(subject.to_string()))?;
        let auction = self
            .auctions
            .get_mut(&id)
            .ok_or_else(|| Error::AuctionNotFound(id.to_string()))?;

        self.active.remove(subject);
        let collected = auction.terminate(now);
        self.events.push(CovpoolEvent::AuctionClosed {
            auction_id: id,
            reason: CloseReason::EarlyTerminated,
            timestamp: now,
        });

        tracing::warn!(%id, %subject, %collected, "auction terminated early");
        Ok(collected)
    }

    fn payout<R>(reserve: &mut R, auction: AuctionId, recipient: AccountId, fraction: Ratio) -> Result<()>
    where
        R: ReserveClaim + ?Sized,
    {
        reserve.seize(fraction, recipient).map_err(|e| {
            tracing::error!(%auction, %recipient, error = %e, "payout failed");
            Error::PayoutFailed {
                auction: auction.to_string(),
                reason: e.to_string(),
            }
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════

    /// Get an auction, open or closed
    pub fn auction(&self, id: AuctionId) -> Option<&Auction> {
        self.auctions.get(&id)
    }

    /// Open auction of `subject`, if any
    pub fn active_auction(&self, subject: &SubjectId) -> Option<&Auction> {
        self.active.get(subject).and_then(|id| self.auctions.get(id))
    }

    /// Id of the open auction of `subject`, if any
    pub fn active_auction_id(&self, subject: &SubjectId) -> Option<AuctionId> {
        self.active.get(subject).copied()
    }

    /// Number of open auctions
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// All auctions in creation order
    pub fn auctions(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryReserve, NoCloseHook};

    const TOKEN: &str = "TBTC";

    fn setup() -> (AuctionRegistry, SubjectId, AuctionId) {
        let mut registry = AuctionRegistry::new();
        let subject = SubjectId::from_label("deposit");
        let id = registry
            .create_auction(subject, TokenId::new(TOKEN), TokenAmount::from_units(1_000), 100, 0)
            .unwrap();
        (registry, subject, id)
    }

    fn order(id: AuctionId, amount: u64) -> OfferOrder {
        OfferOrder::new(id, AccountId::from_label("bidder"), TokenAmount::from_units(amount))
    }

    struct VetoHook;

    impl AuctionCloseHook for VetoHook {
        fn before_close(&mut self, auction: &Auction) -> Result<()> {
            Err(Error::SubjectNotLiquidatable(auction.subject().to_string()))
        }

        fn on_close(&mut self, _auction: &Auction, _now: u64) {
            panic!("closed despite veto");
        }
    }

    #[derive(Default)]
    struct CountingHook {
        closed: Vec<AuctionId>,
    }

    impl AuctionCloseHook for CountingHook {
        fn before_close(&mut self, _auction: &Auction) -> Result<()> {
            Ok(())
        }

        fn on_close(&mut self, auction: &Auction, _now: u64) {
            self.closed.push(auction.id());
        }
    }

    #[test]
    fn test_create_auction() {
        let (registry, subject, id) = setup();
        assert_eq!(registry.active_auction_id(&subject), Some(id));
        assert_eq!(registry.active_count(), 1);
        assert_eq!(registry.events()[0].event_type(), "AuctionCreated");

        let auction = registry.auction(id).unwrap();
        assert!(auction.is_open());
        assert_eq!(auction.curve().velocity(), Ratio::ONE);
        assert_eq!(auction.amount_collected(), TokenAmount::ZERO);
    }

    #[test]
    fn test_create_auction_rejections() {
        let (mut registry, subject, _) = setup();
        let token = TokenId::new(TOKEN);
        let other = SubjectId::from_label("other");

        assert_eq!(
            registry.create_auction(other, token.clone(), TokenAmount::ZERO, 100, 0),
            Err(Error::InvalidAmount)
        );
        assert_eq!(
            registry.create_auction(other, token.clone(), TokenAmount::from_units(1), 0, 0),
            Err(Error::DurationZero)
        );
        assert!(matches!(
            registry.create_auction(subject, token, TokenAmount::from_units(1), 100, 0),
            Err(Error::AuctionAlreadyOpen(_))
        ));
        assert_eq!(registry.auctions().count(), 1);
        assert_eq!(registry.events().len(), 1);
    }

    #[test]
    fn test_full_fill_drops_mapping() {
        let (mut registry, subject, id) = setup();
        let mut reserve = InMemoryReserve::new(10_000);
        let mut hook = CountingHook::default();

        registry.take_offer(&order(id, 400), 50, &mut reserve, &mut hook).unwrap();
        assert!(hook.closed.is_empty());
        assert_eq!(registry.active_auction_id(&subject), Some(id));

        let fill = registry.take_offer(&order(id, 600), 100, &mut reserve, &mut hook).unwrap();
        assert!(fill.fully_filled);
        assert_eq!(hook.closed, vec![id]);
        assert_eq!(registry.active_auction_id(&subject), None);
        assert!(!registry.auction(id).unwrap().is_open());

        // subject can be auctioned again once cleared
        let again = registry
            .create_auction(subject, TokenId::new(TOKEN), TokenAmount::from_units(5), 100, 200)
            .unwrap();
        assert_ne!(again, id);
    }

    #[test]
    fn test_payout_failure_leaves_state() {
        let (mut registry, _, id) = setup();
        let mut reserve = InMemoryReserve::new(10_000);
        reserve.fail_with("reserve paused");
        let before = registry.auction(id).cloned();
        let events = registry.events().len();

        let result = registry.take_offer(&order(id, 500), 50, &mut reserve, &mut NoCloseHook);
        assert!(matches!(result, Err(Error::PayoutFailed { .. })));
        assert_eq!(registry.auction(id).cloned(), before);
        assert_eq!(registry.events().len(), events);
        assert_eq!(reserve.balance(), 10_000);

        reserve.recover();
        registry.take_offer(&order(id, 500), 50, &mut reserve, &mut NoCloseHook).unwrap();
        assert_eq!(reserve.balance(), 7_500);
    }

    #[test]
    fn test_veto_blocks_closing_fill_only() {
        let (mut registry, subject, id) = setup();
        let mut reserve = InMemoryReserve::new(10_000);

        registry.take_offer(&order(id, 100), 10, &mut reserve, &mut VetoHook).unwrap();
        let balance = reserve.balance();

        let result = registry.take_offer(&order(id, 900), 20, &mut reserve, &mut VetoHook);
        assert!(matches!(result, Err(Error::SubjectNotLiquidatable(_))));
        assert_eq!(reserve.balance(), balance);
        assert_eq!(registry.active_auction_id(&subject), Some(id));
        assert_eq!(registry.auction(id).unwrap().amount_collected().units(), 100);
    }

    #[test]
    fn test_unknown_auction() {
        let (mut registry, _, _) = setup();
        let mut reserve = InMemoryReserve::new(1);
        let result = registry.take_offer(&order(AuctionId::new(99), 1), 0, &mut reserve, &mut NoCloseHook);
        assert!(matches!(result, Err(Error::AuctionNotFound(_))));
    }

    #[test]
    fn test_early_terminate() {
        let (mut registry, subject, id) = setup();
        let mut reserve = InMemoryReserve::new(10_000);
        registry.take_offer(&order(id, 250), 10, &mut reserve, &mut NoCloseHook).unwrap();

        assert_eq!(registry.early_terminate(&subject, 20).unwrap().units(), 250);
        assert_eq!(registry.active_auction_id(&subject), None);
        assert!(matches!(
            registry.early_terminate(&subject, 30),
            Err(Error::NoActiveAuction(_))
        ));
        assert!(matches!(
            registry.take_offer(&order(id, 1), 40, &mut reserve, &mut NoCloseHook),
            Err(Error::AuctionNotOpen(_))
        ));

        let closed: Vec<_> = registry
            .auctions()
            .filter_map(|a| a.close_reason().map(|r| (a.id(), r)))
            .collect();
        assert_eq!(closed, vec![(id, CloseReason::EarlyTerminated)]);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let (mut registry, subject, id) = setup();
        let mut reserve = InMemoryReserve::new(10_000);
        registry.take_offer(&order(id, 300), 30, &mut reserve, &mut NoCloseHook).unwrap();

        let restored = AuctionRegistry::from_bytes(&registry.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.active_auction_id(&subject), Some(id));
        assert_eq!(restored.auction(id), registry.auction(id));
        assert_eq!(restored.events(), registry.events());
        assert!(AuctionRegistry::from_bytes(&[1, 2, 3]).is_err());
    }
}
