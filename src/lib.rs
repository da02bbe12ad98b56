//! # covpool
//!
//! Coverage-pool liquidation through declining-price auctions. When a
//! monitored position cannot be liquidated by its usual path, the pool either
//! buys it out directly from surplus or auctions a growing share of its
//! reserve for the settlement tokens needed to close the position.
//!
//! ## Architecture
//!
//! - **Auction**: Pricing curve, auction records and the registry owning them
//! - **Liquidation**: Orchestrator deciding between buyout and auction
//! - **Collaborators**: Reserve, subject and proceeds interfaces
//! - **Events**: Bounded log of every state transition
//!
//! ## Example
//!
//! ```rust
//! use covpool::prelude::*;
//!
//! let mut orchestrator = LiquidationOrchestrator::new(OrchestratorConfig::default())?;
//! let mut registry = orchestrator.new_registry();
//! let mut reserve = InMemoryReserve::new(1_000_000);
//! let mut escrow = ProceedsEscrow::new();
//! let mut subject = StubSubject::new("deposit-1", 80, TokenAmount::from_units(1_000));
//!
//! let decision = orchestrator.notify_liquidation(&mut registry, &mut subject, &mut escrow, 0)?;
//! let LiquidationDecision::AuctionOpened(auction_id) = decision else {
//!     unreachable!("no surplus yet");
//! };
//!
//! let order = OfferOrder::new(auction_id, AccountId::from_label("bidder"), TokenAmount::from_units(1_000));
//! let fill = orchestrator.take_offer(&mut registry, &order, &mut subject, &mut escrow, &mut reserve, 43_200)?;
//! assert!(fill.fully_filled);
//! assert_eq!(subject.finalize_calls(), 1);
//! # Ok::<(), covpool::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod auction;
pub mod collaborators;
pub mod core;
pub mod error;
pub mod events;
pub mod liquidation;
pub mod utils;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auction::{Auction, AuctionRegistry, OfferFill, OfferOrder, PricingCurve};
    pub use crate::collaborators::{
        InMemoryReserve, MonitoredSubject, ProceedsEscrow, ProceedsRoute, ReserveClaim,
        SeizeError, StubSubject,
    };
    pub use crate::core::{
        config::OrchestratorConfig,
        ids::{AccountId, AuctionId, SubjectId},
        token::{CollateralAmount, TokenAmount, TokenId},
    };
    pub use crate::error::{Error, Result};
    pub use crate::events::{CloseReason, CovpoolEvent, EventLog, Resolution};
    pub use crate::liquidation::{LiquidationDecision, LiquidationOrchestrator, SubjectStatus};
    pub use crate::utils::math::Ratio;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name
pub const PROTOCOL_NAME: &str = "covpool";
