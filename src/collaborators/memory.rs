//! In-memory collaborators.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::collaborators::{MonitoredSubject, ProceedsRoute, ReserveClaim, SeizeError};
use crate::core::ids::{AccountId, SubjectId};
use crate::core::token::{CollateralAmount, TokenAmount};
use crate::utils::constants::PERCENT_DIVISOR;
use crate::utils::math::{mul_div_u128, Ratio};

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Reserve holding a single balance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryReserve {
    balance: u64,
    seized: HashMap<AccountId, u64>,
    failure: Option<String>,
}

impl InMemoryReserve {
    /// Create a reserve with an initial balance
    pub fn new(balance: u64) -> Self {
        Self {
            balance,
            ..Self::default()
        }
    }

    /// Remaining balance
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Total paid out to `recipient`
    pub fn seized_by(&self, recipient: &AccountId) -> u64 {
        self.seized.get(recipient).copied().unwrap_or(0)
    }

    /// Make every following seizure fail with `reason`
    pub fn fail_with(&mut self, reason: impl Into<String>) {
        self.failure = Some(reason.into());
    }

    /// Accept seizures again
    pub fn recover(&mut self) {
        self.failure = None;
    }
}

impl ReserveClaim for InMemoryReserve {
    fn seize(&mut self, fraction: Ratio, recipient: AccountId) -> Result<(), SeizeError> {
        if let Some(reason) = &self.failure {
            return Err(SeizeError::new(reason.clone()));
        }
        if fraction.numerator() > fraction.denominator() {
            return Err(SeizeError::new(format!("fraction {} exceeds the reserve", fraction)));
        }

        let amount = mul_div_u128(self.balance as u128, fraction.numerator(), fraction.denominator())
            .map_err(|e| SeizeError::new(e.to_string()))? as u64;
        self.balance -= amount;
        *self.seized.entry(recipient).or_insert(0) += amount;

        tracing::debug!(%recipient, %fraction, amount, "reserve seized");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUBJECT
// ═══════════════════════════════════════════════════════════════════════════════

/// Subject with directly settable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StubSubject {
    id: SubjectId,
    exposure_percent: u64,
    obligation: TokenAmount,
    liquidatable: bool,
    bonded: CollateralAmount,
    paid: TokenAmount,
    finalize_calls: u32,
}

impl StubSubject {
    /// Liquidatable subject with the given exposure and obligation
    pub fn new(label: &str, exposure_percent: u64, obligation: TokenAmount) -> Self {
        Self {
            id: SubjectId::from_label(label),
            exposure_percent,
            obligation,
            liquidatable: true,
            bonded: CollateralAmount::ZERO,
            paid: TokenAmount::ZERO,
            finalize_calls: 0,
        }
    }

    /// Set the bonded collateral
    pub fn with_bonded(mut self, bonded: CollateralAmount) -> Self {
        self.bonded = bonded;
        self
    }

    /// Change the reported exposure
    pub fn set_exposure(&mut self, percent: u64) {
        self.exposure_percent = percent;
    }

    /// Change whether the subject is in liquidation
    pub fn set_liquidatable(&mut self, liquidatable: bool) {
        self.liquidatable = liquidatable;
    }

    /// Remaining bonded collateral
    pub fn bonded(&self) -> CollateralAmount {
        self.bonded
    }

    /// Amount received through `finalize`
    pub fn paid(&self) -> TokenAmount {
        self.paid
    }

    /// Number of `finalize` calls
    pub fn finalize_calls(&self) -> u32 {
        self.finalize_calls
    }
}

impl MonitoredSubject for StubSubject {
    fn id(&self) -> SubjectId {
        self.id
    }

    fn bond_exposure_percent(&self) -> u64 {
        self.exposure_percent
    }

    fn outstanding_obligation(&self) -> TokenAmount {
        self.obligation
    }

    fn currently_liquidatable(&self) -> bool {
        self.liquidatable
    }

    // Releases the exposed share of the bonds; the rest stays with the subject.
    fn finalize(&mut self, payment: TokenAmount) -> CollateralAmount {
        let exposure = self.exposure_percent.min(PERCENT_DIVISOR);
        let released = (self.bonded.units() as u128 * exposure as u128 / PERCENT_DIVISOR as u128) as u64;
        let released = CollateralAmount::from_units(released);

        self.bonded = self.bonded.saturating_sub(released);
        self.paid = self.paid.saturating_add(payment);
        self.liquidatable = false;
        self.finalize_calls += 1;
        released
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROCEEDS ESCROW
// ═══════════════════════════════════════════════════════════════════════════════

/// Records proceeds per subject
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProceedsEscrow {
    received: Vec<(SubjectId, CollateralAmount)>,
    total: CollateralAmount,
}

impl ProceedsEscrow {
    /// Create an empty escrow
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposits in arrival order
    pub fn received(&self) -> &[(SubjectId, CollateralAmount)] {
        &self.received
    }

    /// Sum of all deposits
    pub fn total(&self) -> CollateralAmount {
        self.total
    }
}

impl ProceedsRoute for ProceedsEscrow {
    fn receive(&mut self, subject: SubjectId, proceeds: CollateralAmount) {
        tracing::debug!(%subject, %proceeds, "proceeds escrowed");
        self.received.push((subject, proceeds));
        self.total = self.total.saturating_add(proceeds);
    }
}
