use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use ethereum_types::H160;
use serde::{Deserialize, Serialize};

/// A wallet address in canonical form.
///
/// Parsing accepts `0x`-prefixed hex in any letter case (checksummed or not);
/// equality is over the underlying bytes, so case variants of the same
/// address always compare equal. [`Display`] renders the canonical lowercase
/// `0x…` form used for logging and on-wire calls.
#[derive(
    Debug, Default, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(H160);

/// Error returned when an address string cannot be parsed.
#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    /// The string is not valid hex.
    #[error("invalid hex in address: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// The decoded payload is not 20 bytes long.
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl Address {
    /// Builds an address from raw bytes. Handy for tests.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(H160(bytes))
    }

    /// The raw 20-byte payload.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<H160> for Address {
    fn from(value: H160) -> Self {
        Self(value)
    }
}

impl From<Address> for H160 {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("0x");
        let bytes = hex::decode(digits)?;
        let payload: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressParseError::InvalidLength(bytes.len()))?;
        Ok(Self(H160(payload)))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

/// The contract's per-account voter record.
///
/// `vote` is only meaningful while `has_voted` is set. The zero record doubles
/// as the safe default that reads degrade to when the contract is unreachable.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// The account passed admin approval and may vote.
    pub is_registered: bool,
    /// A registration request is pending (or was pending before approval).
    pub has_requested: bool,
    /// The account already cast its single vote.
    pub has_voted: bool,
    /// Candidate id the vote went to, if any.
    pub vote: u64,
    /// Identity string submitted at registration, for manual admin review.
    pub cin: String,
}

impl VoterRecord {
    /// A voted record must also be registered; anything else indicates a
    /// corrupted read and must never be published by the sync layer.
    pub fn is_consistent(&self) -> bool {
        !self.has_voted || self.is_registered
    }
}

/// One candidate on the ballot. Ids are 1-based and contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// 1-based id, assigned by the contract in insertion order.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Number of votes received so far.
    pub vote_count: u64,
}

/// The contract's two-flag voting phase.
///
/// Only three combinations are reachable: not started, active, and ended.
/// The default (not started) is also the safe value reads degrade to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingPhase {
    /// Voting has been opened at least once this session.
    pub is_started: bool,
    /// Voting has been closed. Implies `is_started`.
    pub is_ended: bool,
}

impl VotingPhase {
    /// Votes are currently being accepted.
    pub fn is_active(&self) -> bool {
        self.is_started && !self.is_ended
    }

    /// The session has not been opened yet.
    pub fn not_started(&self) -> bool {
        !self.is_started
    }
}

impl Display for VotingPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = if self.is_active() {
            "active"
        } else if self.is_ended {
            "ended"
        } else {
            "not started"
        };
        f.write_str(name)
    }
}

/// Wallet-originated session change. Either one invalidates every cached
/// read and requires a wholesale re-acquisition of account and handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The active account set changed; empty means disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks.
    ChainChanged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUMMED: &str = "0x1183338e09ecC0FD623Abf3A00346A89ac328dae";

    #[test]
    fn address_parse_is_case_insensitive() {
        let mixed: Address = CHECKSUMMED.parse().unwrap();
        let lower: Address = CHECKSUMMED.to_lowercase().parse().unwrap();
        let upper: Address = format!("0x{}", CHECKSUMMED[2..].to_uppercase())
            .parse()
            .unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
    }

    #[test]
    fn address_displays_canonical_lowercase() {
        let addr: Address = CHECKSUMMED.parse().unwrap();
        assert_eq!(addr.to_string(), CHECKSUMMED.to_lowercase());
    }

    #[test]
    fn address_rejects_bad_input() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("not-an-address".parse::<Address>().is_err());
    }

    #[test]
    fn address_serde_round_trip() {
        let addr: Address = CHECKSUMMED.parse().unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn phase_names() {
        assert_eq!(VotingPhase::default().to_string(), "not started");
        let active = VotingPhase {
            is_started: true,
            is_ended: false,
        };
        assert!(active.is_active());
        assert_eq!(active.to_string(), "active");
        let ended = VotingPhase {
            is_started: true,
            is_ended: true,
        };
        assert!(!ended.is_active());
        assert_eq!(ended.to_string(), "ended");
    }

    #[test]
    fn zero_voter_record_is_consistent() {
        assert!(VoterRecord::default().is_consistent());
        let broken = VoterRecord {
            has_voted: true,
            ..Default::default()
        };
        assert!(!broken.is_consistent());
    }
}
