//! Identifiers for subjects, accounts and auctions.
//!
//! Subjects and accounts are 32-byte identifiers serialized as hex. Auction
//! identifiers are sequential and generated by the registry.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::constants::ID_LENGTH;

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn digest(domain: &[u8], label: &str) -> [u8; ID_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(label.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; ID_LENGTH];
    bytes.copy_from_slice(&result);
    bytes
}

fn decode(name: &str, s: &str) -> Result<[u8; ID_LENGTH]> {
    let bytes = hex::decode(s).map_err(|e| Error::InvalidParameter {
        name: name.into(),
        reason: e.to_string(),
    })?;
    if bytes.len() != ID_LENGTH {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: format!("expected {} bytes, got {}", ID_LENGTH, bytes.len()),
        });
    }
    let mut arr = [0u8; ID_LENGTH];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

fn short_hex(bytes: &[u8; ID_LENGTH]) -> String {
    let hex = hex::encode(bytes);
    format!("{}...{}", &hex[..8], &hex[hex.len() - 8..])
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUBJECT ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifier of a monitored subject (the position being liquidated)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId([u8; ID_LENGTH]);

impl SubjectId {
    /// Create from raw bytes
    pub fn new(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive a subject id from a human-readable label
    pub fn from_label(label: &str) -> Self {
        Self(digest(b"covpool/subject/", label))
    }

    /// Get the id as bytes
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        decode("subject_id", s).map(Self)
    }

    /// Short representation for display
    pub fn short(&self) -> String {
        short_hex(&self.0)
    }
}

impl Serialize for SubjectId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.short())
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifier of a bidder or payout recipient
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; ID_LENGTH]);

impl AccountId {
    /// Create from raw bytes
    pub fn new(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive an account id from a human-readable label
    pub fn from_label(label: &str) -> Self {
        Self(digest(b"covpool/account/", label))
    }

    /// Get the id as bytes
    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        decode("account_id", s).map(Self)
    }

    /// Short representation for display
    pub fn short(&self) -> String {
        short_hex(&self.0)
    }
}

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUCTION ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Registry-generated auction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuctionId(u64);

impl AuctionId {
    /// Create from a sequence number
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Sequence number
    pub fn seq(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auction#{}", self.0)
    }
}
