//! Integration tests for covpool.
//!
//! These tests drive the orchestrator, registry and in-memory collaborators
//! through complete liquidation lifecycles.

use rust_decimal::Decimal;

use covpool::prelude::*;

const ONE: u64 = 1_000_000_000_000_000_000;
const DAY: u64 = 86_400;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

struct Pool {
    orchestrator: LiquidationOrchestrator,
    registry: AuctionRegistry,
    reserve: InMemoryReserve,
    escrow: ProceedsEscrow,
}

impl Pool {
    fn new() -> Self {
        let config = OrchestratorConfig::default().with_auction_duration(DAY);
        let orchestrator = LiquidationOrchestrator::new(config).unwrap();
        let registry = orchestrator.new_registry();
        Self {
            orchestrator,
            registry,
            reserve: InMemoryReserve::new(ONE),
            escrow: ProceedsEscrow::new(),
        }
    }

    fn liquidate(&mut self, subject: &mut StubSubject, now: u64) -> Result<LiquidationDecision> {
        self.orchestrator
            .notify_liquidation(&mut self.registry, subject, &mut self.escrow, now)
    }

    fn open(&mut self, subject: &mut StubSubject, now: u64) -> AuctionId {
        match self.liquidate(subject, now).unwrap() {
            LiquidationDecision::AuctionOpened(id) => id,
            other => panic!("expected an auction, got {:?}", other),
        }
    }

    fn bid(
        &mut self,
        subject: &mut StubSubject,
        id: AuctionId,
        bidder: &str,
        amount: u64,
        now: u64,
    ) -> Result<OfferFill> {
        let order = OfferOrder::new(id, AccountId::from_label(bidder), TokenAmount::from_units(amount));
        self.orchestrator.take_offer(
            &mut self.registry,
            &order,
            subject,
            &mut self.escrow,
            &mut self.reserve,
            now,
        )
    }

    fn on_offer(&self, id: AuctionId, now: u64) -> Ratio {
        self.registry.auction(id).unwrap().on_offer(now)
    }

    fn curve(&self, id: AuctionId) -> PricingCurve {
        *self.registry.auction(id).unwrap().curve()
    }
}

fn deposit(label: &str, obligation: u64) -> StubSubject {
    StubSubject::new(label, 90, TokenAmount::from_units(obligation))
        .with_bonded(CollateralAmount::from_units(10_000))
}

fn assert_close(actual: Ratio, expected: &str, tolerance: &str) {
    let actual = actual.to_decimal().unwrap();
    let expected: Decimal = expected.parse().unwrap();
    let tolerance: Decimal = tolerance.parse().unwrap();
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUCTION LIFECYCLE TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_partial_fills_then_full_fill() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", ONE);
    let id = pool.open(&mut subject, 0);

    assert_close(pool.on_offer(id, 3_600), "0.0416", "0.0001");
    let first = pool.bid(&mut subject, id, "alice", ONE / 2, 3_600).unwrap();
    assert!(!first.fully_filled);
    assert_eq!(pool.curve(id).reference_start_time(), 1_800);
    assert_close(pool.curve(id).velocity(), "1.0212", "0.0001");

    assert_close(pool.on_offer(id, 6_300), "0.0531", "0.0002");
    pool.bid(&mut subject, id, "bob", ONE / 10, 6_300).unwrap();
    assert_eq!(pool.curve(id).reference_start_time(), 2_700);
    assert_close(pool.curve(id).velocity(), "1.03225", "0.00001");

    assert_close(pool.on_offer(id, 7_500), "0.0573", "0.0002");
    let last = pool.bid(&mut subject, id, "carol", 4 * ONE / 10, 7_500).unwrap();
    assert!(last.fully_filled);

    let auction = pool.registry.auction(id).unwrap();
    assert!(!auction.is_open());
    assert_eq!(auction.amount_collected().units(), ONE);
    assert_eq!(pool.registry.active_auction_id(&subject.id()), None);

    // subject finalized once, exposed bonds routed to escrow
    assert_eq!(subject.finalize_calls(), 1);
    assert_eq!(pool.escrow.total().units(), 9_000);
    assert_eq!(pool.escrow.received(), &[(subject.id(), CollateralAmount::from_units(9_000))]);
    assert_eq!(
        pool.orchestrator.status(&subject.id()),
        SubjectStatus::Resolved(Resolution::AuctionFilled)
    );
}

#[test]
fn test_multiple_takers() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", ONE);
    let id = pool.open(&mut subject, 0);

    pool.bid(&mut subject, id, "alice", ONE / 4, 3_600).unwrap();
    assert_eq!(pool.curve(id).reference_start_time(), 900);
    assert_close(pool.curve(id).velocity(), "1.0105", "0.0001");

    assert_close(pool.on_offer(id, 4_500), "0.0421", "0.0002");
    let outstanding = pool.registry.auction(id).unwrap().amount_outstanding();
    assert_eq!(outstanding.units(), 3 * ONE / 4);

    let fill = pool
        .bid(&mut subject, id, "bob", outstanding.units(), 4_500)
        .unwrap();
    assert!(fill.fully_filled);
    assert_close(fill.reserve_fraction, "0.0421", "0.0002");

    let alice = pool.reserve.seized_by(&AccountId::from_label("alice"));
    let bob = pool.reserve.seized_by(&AccountId::from_label("bob"));
    assert!(alice > 0 && bob > alice);
    assert_eq!(pool.reserve.balance(), ONE - alice - bob);
}

#[test]
fn test_earlier_fill_gets_better_price() {
    let mut early = Pool::new();
    let mut late = Pool::new();
    let mut a = deposit("a", 1_000_000);
    let mut b = deposit("b", 1_000_000);
    let early_id = early.open(&mut a, 0);
    let late_id = late.open(&mut b, 0);

    let early_fill = early.bid(&mut a, early_id, "x", 500_000, 10_000).unwrap();
    let late_fill = late.bid(&mut b, late_id, "x", 500_000, 20_000).unwrap();
    assert!(
        early_fill.reserve_fraction.to_decimal().unwrap()
            < late_fill.reserve_fraction.to_decimal().unwrap()
    );
}

#[test]
fn test_whole_reserve_on_offer_at_deadline() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);
    let id = pool.open(&mut subject, 100);

    pool.bid(&mut subject, id, "alice", 100, 10_000).unwrap();
    pool.bid(&mut subject, id, "alice", 300, 50_000).unwrap();
    assert_eq!(pool.on_offer(id, 100 + DAY), Ratio::ONE);

    let fill = pool.bid(&mut subject, id, "bob", 600, 100 + DAY).unwrap();
    assert_eq!(fill.reserve_fraction, Ratio::ONE);
    assert_eq!(pool.reserve.balance(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// REJECTION TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_rejected_offers_leave_state_unchanged() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);
    let id = pool.open(&mut subject, 0);
    let before = pool.registry.auction(id).cloned();
    let events = pool.registry.events().len();

    assert_eq!(pool.bid(&mut subject, id, "x", 0, 10), Err(Error::ZeroPayment));
    assert!(matches!(
        pool.bid(&mut subject, id, "x", 1_001, 10),
        Err(Error::Overpay { payment: 1_001, outstanding: 1_000 })
    ));

    pool.reserve.fail_with("reserve locked");
    assert!(matches!(
        pool.bid(&mut subject, id, "x", 500, 10),
        Err(Error::PayoutFailed { .. })
    ));

    assert_eq!(pool.registry.auction(id).cloned(), before);
    assert_eq!(pool.registry.events().len(), events);
    assert_eq!(pool.reserve.balance(), ONE);

    // retry after the reserve recovers gets the same fraction
    pool.reserve.recover();
    let quote = pool
        .registry
        .auction(id)
        .unwrap()
        .quote(TokenAmount::from_units(500), 10)
        .unwrap();
    let fill = pool.bid(&mut subject, id, "x", 500, 10).unwrap();
    assert_eq!(fill.reserve_fraction, quote);
}

#[test]
fn test_closing_fill_rejected_after_subject_left_liquidation() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);
    let id = pool.open(&mut subject, 0);
    pool.bid(&mut subject, id, "alice", 500, 1_000).unwrap();

    subject.set_liquidatable(false);
    assert!(matches!(
        pool.bid(&mut subject, id, "bob", 500, 2_000),
        Err(Error::SubjectNotLiquidatable(_))
    ));
    assert_eq!(subject.finalize_calls(), 0);
    assert!(pool.registry.auction(id).unwrap().is_open());

    let collected = pool
        .orchestrator
        .notify_liquidated(&mut pool.registry, &subject, 3_000)
        .unwrap();
    assert_eq!(collected.units(), 500);
    assert_eq!(pool.orchestrator.surplus().units(), 500);
    assert_eq!(
        pool.registry.auction(id).unwrap().close_reason(),
        Some(CloseReason::EarlyTerminated)
    );
    assert!(matches!(
        pool.bid(&mut subject, id, "bob", 500, 4_000),
        Err(Error::AuctionNotOpen(_))
    ));
}

#[test]
fn test_full_fill_always_settles_subject() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);
    let mut other = deposit("deposit-2", 1_000);
    let id = pool.open(&mut subject, 0);

    // neither a partial nor a closing fill can name someone else's auction
    for amount in [400, 1_000] {
        assert!(matches!(
            pool.bid(&mut other, id, "bob", amount, 10),
            Err(Error::SubjectMismatch { .. })
        ));
    }
    assert_eq!(other.finalize_calls(), 0);
    assert!(pool.registry.auction(id).unwrap().is_open());
    assert_eq!(pool.reserve.balance(), ONE);

    let fill = pool.bid(&mut subject, id, "alice", 1_000, 10).unwrap();
    assert!(fill.fully_filled);
    assert_eq!(subject.finalize_calls(), 1);
    assert_eq!(
        pool.escrow.received(),
        &[(subject.id(), CollateralAmount::from_units(9_000))]
    );
    assert_eq!(
        pool.orchestrator.status(&subject.id()),
        SubjectStatus::Resolved(Resolution::AuctionFilled)
    );
    assert_eq!(pool.orchestrator.auction_for(&subject.id()), None);
    assert_eq!(pool.registry.active_auction_id(&subject.id()), None);

    // the subject is terminal, not stuck mid-liquidation
    assert!(matches!(
        pool.liquidate(&mut subject, 20),
        Err(Error::SubjectAlreadyResolved(_))
    ));
    assert!(matches!(
        pool.orchestrator.notify_liquidated(&mut pool.registry, &subject, 20),
        Err(Error::SubjectAlreadyResolved(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════════════════
// SURPLUS TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_surplus_direct_buyout() {
    let mut pool = Pool::new();

    // 2.5 collected before the first subject resolved elsewhere
    let mut first = deposit("deposit-1", 3 * ONE);
    let id = pool.open(&mut first, 0);
    pool.bid(&mut first, id, "alice", 5 * ONE / 2, 3_600).unwrap();
    first.set_liquidatable(false);
    pool.orchestrator
        .notify_liquidated(&mut pool.registry, &first, 7_200)
        .unwrap();
    assert_eq!(pool.orchestrator.surplus().units(), 5 * ONE / 2);

    // 1.0 lot is bought out directly, leaving 1.5
    let mut second = deposit("deposit-2", ONE);
    let decision = pool.liquidate(&mut second, 10_000).unwrap();
    assert!(matches!(decision, LiquidationDecision::DirectBuyout { .. }));
    assert_eq!(pool.orchestrator.surplus().units(), 3 * ONE / 2);
    assert_eq!(pool.registry.active_count(), 0);
    assert_eq!(pool.registry.active_auction_id(&second.id()), None);
    assert_eq!(second.finalize_calls(), 1);
    assert_eq!(pool.escrow.total().units(), 9_000);

    // 2.0 lot exceeds the surplus: auction for the full obligation
    let mut third = deposit("deposit-3", 2 * ONE);
    let id = pool.open(&mut third, 11_000);
    assert_eq!(
        pool.registry.auction(id).unwrap().amount_desired().units(),
        2 * ONE
    );
    assert_eq!(pool.orchestrator.surplus().units(), 3 * ONE / 2);
}

#[test]
fn test_eligibility_threshold() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);

    subject.set_exposure(74);
    assert!(matches!(pool.liquidate(&mut subject, 0), Err(Error::NotEligible { .. })));
    assert!(pool.registry.events().is_empty());

    subject.set_exposure(75);
    assert!(pool.liquidate(&mut subject, 0).is_ok());
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT AND SNAPSHOT TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_event_stream() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);
    let id = pool.open(&mut subject, 0);
    pool.bid(&mut subject, id, "alice", 1_000, 500).unwrap();

    let types: Vec<_> = pool.registry.events().iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["AuctionCreated", "AuctionOfferTaken", "AuctionClosed"]);
    assert_eq!(
        pool.registry.events()[2],
        CovpoolEvent::AuctionClosed {
            auction_id: id,
            reason: CloseReason::FullyFilled,
            timestamp: 500,
        }
    );

    let resolved = pool.orchestrator.drain_events();
    assert_eq!(
        resolved,
        vec![CovpoolEvent::SubjectResolved {
            subject: subject.id(),
            resolution: Resolution::AuctionFilled,
            timestamp: 500,
        }]
    );
}

#[test]
fn test_independent_subjects() {
    let mut pool = Pool::new();
    let mut a = deposit("a", 1_000);
    let mut b = deposit("b", 2_000);
    let id_a = pool.open(&mut a, 0);
    let id_b = pool.open(&mut b, 0);
    assert_ne!(id_a, id_b);

    pool.bid(&mut a, id_a, "x", 1_000, 1_000).unwrap();
    assert!(pool.registry.auction(id_b).unwrap().is_open());
    assert_eq!(pool.curve(id_b).reference_start_time(), 0);
    assert_eq!(pool.registry.active_count(), 1);
}

#[test]
fn test_snapshots_resume_auction() {
    let mut pool = Pool::new();
    let mut subject = deposit("deposit-1", 1_000);
    let id = pool.open(&mut subject, 0);
    pool.bid(&mut subject, id, "alice", 400, 1_000).unwrap();

    let registry = AuctionRegistry::from_bytes(&pool.registry.to_bytes().unwrap()).unwrap();
    let orchestrator =
        LiquidationOrchestrator::from_bytes(&pool.orchestrator.to_bytes().unwrap()).unwrap();
    pool.registry = registry;
    pool.orchestrator = orchestrator;

    let fill = pool.bid(&mut subject, id, "bob", 600, 2_000).unwrap();
    assert!(fill.fully_filled);
    assert_eq!(
        pool.orchestrator.status(&subject.id()),
        SubjectStatus::Resolved(Resolution::AuctionFilled)
    );
}
