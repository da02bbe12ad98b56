//! Linear depletion curve of a declining-price auction.
//!
//! The share of the reserve on offer grows linearly from zero at the
//! reference start time to one at the original end time. Partial fills move
//! the reference start time forward and raise the velocity so that the
//! deadline never moves.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::{FLOATING_POINT_DIVISOR, MAX_AUCTION_DURATION_SECS};
use crate::utils::math::{ceil_div_u128, mul_div_u128, Ratio};

/// Pricing state of one auction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingCurve {
    /// Time the auction opened
    start_time: u64,
    /// Auction length in seconds
    duration: u64,
    /// Time at which the curve currently reads zero
    reference_start_time: u64,
    /// Depletion velocity scaled by `FLOATING_POINT_DIVISOR`
    velocity: u128,
}

impl PricingCurve {
    /// Create a curve starting at `start_time` with velocity 1
    pub fn new(start_time: u64, duration: u64) -> Result<Self> {
        if duration == 0 {
            return Err(Error::DurationZero);
        }
        if duration > MAX_AUCTION_DURATION_SECS {
            return Err(Error::DurationTooLong {
                duration,
                max: MAX_AUCTION_DURATION_SECS,
            });
        }
        if start_time.checked_add(duration).is_none() {
            return Err(Error::Overflow {
                operation: format!("{} + {}", start_time, duration),
            });
        }

        Ok(Self {
            start_time,
            duration,
            reference_start_time: start_time,
            velocity: FLOATING_POINT_DIVISOR,
        })
    }

    /// Time the auction opened
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Auction length in seconds
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Current reference start time
    pub fn reference_start_time(&self) -> u64 {
        self.reference_start_time
    }

    /// Velocity as an exact ratio
    pub fn velocity(&self) -> Ratio {
        Ratio::from_scaled(self.velocity)
    }

    /// Scheduled end: the whole reserve is on offer from here on
    pub fn original_end(&self) -> u64 {
        self.start_time.saturating_add(self.duration)
    }

    /// Percentage of the reserve on offer at `now`, as an exact ratio
    ///
    /// `min(1, (now - t0) * v / D)`, with `v` in `FLOATING_POINT_DIVISOR` units.
    pub fn on_offer(&self, now: u64) -> Ratio {
        let denominator = self.denominator();
        match self.depletion(now) {
            // denominator is non-zero: duration is validated in `new`
            Some(numerator) if numerator < denominator => {
                Ratio::new(numerator, denominator).unwrap_or(Ratio::ONE)
            }
            _ => Ratio::ONE,
        }
    }

    /// Percentage on offer at `now`, floor-scaled by `FLOATING_POINT_DIVISOR`
    pub fn on_offer_scaled(&self, now: u64) -> u128 {
        match self.depletion(now) {
            Some(numerator) if self.duration > 0 => {
                (numerator / self.duration as u128).min(FLOATING_POINT_DIVISOR)
            }
            _ => FLOATING_POINT_DIVISOR,
        }
    }

    /// Re-parameterize after `paid` out of `outstanding` was collected at `now`
    ///
    /// The reference start moves forward by the paid share of the elapsed
    /// time and the velocity is recomputed (rounded up) so the curve still
    /// reaches one at [`original_end`](Self::original_end). Once the deadline
    /// has passed the curve is saturated and stays unchanged.
    pub fn rebase(&mut self, now: u64, paid: u64, outstanding: u64) -> Result<()> {
        if paid > outstanding {
            return Err(Error::Overpay {
                payment: paid,
                outstanding,
            });
        }

        let end = self.original_end();
        if now >= end {
            return Ok(());
        }

        let elapsed = now.saturating_sub(self.reference_start_time) as u128;
        let shift = mul_div_u128(elapsed, paid as u128, outstanding as u128)?;
        // shift <= elapsed, so the new reference stays at or before `now`
        let reference_start_time = self.reference_start_time + shift as u64;
        let remaining = (end - reference_start_time) as u128;
        let velocity = ceil_div_u128(self.denominator(), remaining)?;

        self.reference_start_time = reference_start_time;
        self.velocity = velocity;
        Ok(())
    }

    fn denominator(&self) -> u128 {
        self.duration as u128 * FLOATING_POINT_DIVISOR
    }

    /// `elapsed * velocity`, or `None` on overflow (fully depleted)
    fn depletion(&self, now: u64) -> Option<u128> {
        let elapsed = now.saturating_sub(self.reference_start_time) as u128;
        elapsed.checked_mul(self.velocity)
    }
}
