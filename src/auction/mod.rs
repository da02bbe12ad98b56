//! Declining-price auctions.
//!
//! This module contains:
//! - The linear pricing curve
//! - The auction record and its offer logic
//! - The registry owning all auctions

pub mod curve;
pub mod record;
pub mod registry;

pub use curve::PricingCurve;
pub use record::{Auction, OfferFill};
pub use registry::{AuctionRegistry, OfferOrder};
