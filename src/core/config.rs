//! Orchestrator configuration.
//!
//! Configuration is plain data: it can be built in code, loaded from a JSON
//! file, or overridden through `COVPOOL_*` environment variables. Changing it
//! after deployment is a governance concern and out of scope here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::token::TokenId;
use crate::error::{Error, Result};
use crate::utils::constants::*;

/// Environment variable overriding the auction duration (seconds)
pub const ENV_AUCTION_DURATION: &str = "COVPOOL_AUCTION_DURATION";
/// Environment variable overriding the exposure threshold (percent)
pub const ENV_EXPOSURE_THRESHOLD: &str = "COVPOOL_EXPOSURE_THRESHOLD";
/// Environment variable overriding the settlement token symbol
pub const ENV_SETTLEMENT_TOKEN: &str = "COVPOOL_SETTLEMENT_TOKEN";
/// Environment variable overriding the retained event count
pub const ENV_MAX_EVENTS: &str = "COVPOOL_MAX_EVENTS";

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATOR CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters of the liquidation orchestrator and the auctions it opens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Length of every auction in seconds
    pub auction_duration_secs: u64,

    /// Minimum bond exposure percentage before a subject can be liquidated
    pub exposure_threshold_percent: u64,

    /// Token accepted by auctions and held as surplus
    pub settlement_token: TokenId,

    /// Events kept in memory by the registry and orchestrator
    pub max_events: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auction_duration_secs: DEFAULT_AUCTION_DURATION_SECS,
            exposure_threshold_percent: DEFAULT_EXPOSURE_THRESHOLD_PERCENT,
            settlement_token: TokenId::new(DEFAULT_SETTLEMENT_TOKEN),
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl OrchestratorConfig {
    /// Set auction duration
    pub fn with_auction_duration(mut self, secs: u64) -> Self {
        self.auction_duration_secs = secs;
        self
    }

    /// Set exposure threshold
    pub fn with_threshold(mut self, percent: u64) -> Self {
        self.exposure_threshold_percent = percent;
        self
    }

    /// Set settlement token
    pub fn with_settlement_token(mut self, token: TokenId) -> Self {
        self.settlement_token = token;
        self
    }

    /// Validate parameters are consistent
    pub fn validate(&self) -> Result<()> {
        if self.auction_duration_secs == 0 {
            return Err(Error::DurationZero);
        }
        if self.auction_duration_secs > MAX_AUCTION_DURATION_SECS {
            return Err(Error::DurationTooLong {
                duration: self.auction_duration_secs,
                max: MAX_AUCTION_DURATION_SECS,
            });
        }
        if self.exposure_threshold_percent > MAX_EXPOSURE_PERCENT {
            return Err(Error::InvalidParameter {
                name: "exposure_threshold_percent".into(),
                reason: format!("must be at most {}", MAX_EXPOSURE_PERCENT),
            });
        }
        if self.settlement_token.symbol().is_empty() {
            return Err(Error::InvalidParameter {
                name: "settlement_token".into(),
                reason: "cannot be empty".into(),
            });
        }
        if self.max_events == 0 {
            return Err(Error::InvalidParameter {
                name: "max_events".into(),
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `COVPOOL_*` environment overrides on top of this configuration
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(ENV_AUCTION_DURATION) {
            self.auction_duration_secs = parse_env(ENV_AUCTION_DURATION, &value)?;
        }

        if let Ok(value) = std::env::var(ENV_EXPOSURE_THRESHOLD) {
            self.exposure_threshold_percent = parse_env(ENV_EXPOSURE_THRESHOLD, &value)?;
        }

        if let Ok(value) = std::env::var(ENV_SETTLEMENT_TOKEN) {
            self.settlement_token = TokenId::new(value);
        }

        if let Ok(value) = std::env::var(ENV_MAX_EVENTS) {
            self.max_events = parse_env(ENV_MAX_EVENTS, &value)?;
        }

        Ok(self)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| Error::Config(format!("{}: {}", name, e)))
}
