//! Auction record.
//!
//! An auction sells growing fractions of a reserve for settlement tokens
//! until `amount_desired` has been collected. Offers are taken through the
//! [`AuctionRegistry`](super::AuctionRegistry), which performs the payout.

use serde::{Deserialize, Serialize};

use crate::auction::curve::PricingCurve;
use crate::core::ids::{AuctionId, SubjectId};
use crate::core::token::{TokenAmount, TokenId};
use crate::error::{Error, Result};
use crate::events::CloseReason;
use crate::utils::math::{mul_div_u128, Ratio};

// ═══════════════════════════════════════════════════════════════════════════════
// OFFER FILL
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of an accepted offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferFill {
    /// Auction filled
    pub auction_id: AuctionId,
    /// Settlement amount paid
    pub payment: TokenAmount,
    /// Share of the reserve on offer when the offer was taken
    pub percent_on_offer: Ratio,
    /// Share of the whole reserve paid to the bidder
    ///
    /// `percent_on_offer * payment / outstanding`, floored to a multiple of
    /// 1e-18. The exact product is never exceeded.
    pub reserve_fraction: Ratio,
    /// Amount still outstanding after the payment
    pub amount_outstanding: TokenAmount,
    /// Whether the offer closed the auction
    pub fully_filled: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Declining-price auction for one liquidation subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    id: AuctionId,
    subject: SubjectId,
    token: TokenId,
    amount_desired: TokenAmount,
    amount_collected: TokenAmount,
    curve: PricingCurve,
    is_open: bool,
    close_reason: Option<CloseReason>,
    closed_at: Option<u64>,
}

impl Auction {
    /// Open an auction at `now`
    pub(crate) fn new(
        id: AuctionId,
        subject: SubjectId,
        token: TokenId,
        amount_desired: TokenAmount,
        duration: u64,
        now: u64,
    ) -> Result<Self> {
        if amount_desired.is_zero() {
            return Err(Error::InvalidAmount);
        }
        let curve = PricingCurve::new(now, duration)?;

        Ok(Self {
            id,
            subject,
            token,
            amount_desired,
            amount_collected: TokenAmount::ZERO,
            curve,
            is_open: true,
            close_reason: None,
            closed_at: None,
        })
    }

    /// Auction identifier
    pub fn id(&self) -> AuctionId {
        self.id
    }

    /// Subject being liquidated
    pub fn subject(&self) -> SubjectId {
        self.subject
    }

    /// Accepted settlement token
    pub fn token(&self) -> &TokenId {
        &self.token
    }

    /// Amount the auction must collect
    pub fn amount_desired(&self) -> TokenAmount {
        self.amount_desired
    }

    /// Amount collected so far
    pub fn amount_collected(&self) -> TokenAmount {
        self.amount_collected
    }

    /// Amount still to be collected
    pub fn amount_outstanding(&self) -> TokenAmount {
        self.amount_desired.saturating_sub(self.amount_collected)
    }

    /// Pricing curve
    pub fn curve(&self) -> &PricingCurve {
        &self.curve
    }

    /// Current reference start time of the curve
    pub fn reference_start_time(&self) -> u64 {
        self.curve.reference_start_time()
    }

    /// Current depletion velocity
    pub fn velocity(&self) -> Ratio {
        self.curve.velocity()
    }

    /// Time from which the whole reserve is on offer
    pub fn original_end(&self) -> u64 {
        self.curve.original_end()
    }

    /// Whether offers are accepted
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Close reason, once closed
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Close time, once closed
    pub fn closed_at(&self) -> Option<u64> {
        self.closed_at
    }

    /// Share of the reserve on offer at `now`; zero once closed
    pub fn on_offer(&self, now: u64) -> Ratio {
        if self.is_open {
            self.curve.on_offer(now)
        } else {
            Ratio::ZERO
        }
    }

    /// Check an offer of `payment` would be accepted
    pub fn validate_payment(&self, payment: TokenAmount) -> Result<()> {
        if !self.is_open {
            return Err(Error::AuctionNotOpen(self.id.to_string()));
        }
        if payment.is_zero() {
            return Err(Error::ZeroPayment);
        }
        let outstanding = self.amount_outstanding();
        if payment > outstanding {
            return Err(Error::Overpay {
                payment: payment.units(),
                outstanding: outstanding.units(),
            });
        }
        Ok(())
    }

    /// Whether `payment` covers everything outstanding
    pub fn would_fill(&self, payment: TokenAmount) -> bool {
        self.is_open && payment == self.amount_outstanding()
    }

    /// Reserve fraction an offer of `payment` would receive at `now`
    pub fn quote(&self, payment: TokenAmount, now: u64) -> Result<Ratio> {
        self.validate_payment(payment)?;
        self.reserve_fraction(payment, now)
    }

    /// Take an offer; `payout` runs before any state changes
    ///
    /// If `payout` fails the auction is left exactly as it was.
    pub(crate) fn take_offer<F>(&mut self, payment: TokenAmount, now: u64, payout: F) -> Result<OfferFill>
    where
        F: FnOnce(Ratio) -> Result<()>,
    {
        self.validate_payment(payment)?;

        let outstanding = self.amount_outstanding();
        let percent_on_offer = self.curve.on_offer(now);
        let reserve_fraction = self.reserve_fraction(payment, now)?;
        let fully_filled = payment == outstanding;

        let mut curve = self.curve;
        if !fully_filled {
            curve.rebase(now, payment.units(), outstanding.units())?;
        }
        let collected = self.amount_collected.try_add(payment)?;

        payout(reserve_fraction)?;

        self.curve = curve;
        self.amount_collected = collected;
        if fully_filled {
            self.close(CloseReason::FullyFilled, now);
        }

        Ok(OfferFill {
            auction_id: self.id,
            payment,
            percent_on_offer,
            reserve_fraction,
            amount_outstanding: self.amount_outstanding(),
            fully_filled,
        })
    }

    /// Close irrespective of fill state, returning the amount collected
    pub(crate) fn terminate(&mut self, now: u64) -> TokenAmount {
        self.close(CloseReason::EarlyTerminated, now);
        self.amount_collected
    }

    fn close(&mut self, reason: CloseReason, now: u64) {
        self.is_open = false;
        self.close_reason = Some(reason);
        self.closed_at = Some(now);
    }

    // percent_on_offer * payment / outstanding, floored to 1e-18
    fn reserve_fraction(&self, payment: TokenAmount, now: u64) -> Result<Ratio> {
        let scaled = mul_div_u128(
            self.curve.on_offer_scaled(now),
            payment.units() as u128,
            self.amount_outstanding().units() as u128,
        )?;
        Ok(Ratio::from_scaled(scaled))
    }
}
