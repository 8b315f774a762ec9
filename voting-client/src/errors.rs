//! Error taxonomy and translation of raw provider error text.
//!
//! Wallet providers and nodes report failures as free-form text, so revert
//! reasons are recovered by substring matching. This is inherently tied to
//! upstream wording and kept as a legacy fallback; structured error codes
//! from the contract would replace most of it.

use thiserror::Error;
use voting_interface::Address;

/// Errors surfaced by the client core.
///
/// These never escape the access layer as panics: mutations fold them into a
/// normalized outcome, and reads degrade to safe defaults instead.
#[derive(Debug, Error)]
pub enum VotingError {
    /// The wallet or the node could not be reached.
    #[error("failed to reach the wallet or contract: {0}")]
    Connectivity(String),
    /// The wallet is locked or holds no authorized account.
    #[error("no wallet account is available; connect and unlock the wallet first")]
    NoAccount,
    /// The user dismissed the connection or transaction prompt.
    #[error("the request was rejected in the wallet")]
    UserRejected,
    /// The caller is not the contract owner.
    #[error("account {0} is not the contract owner")]
    NotAuthorized(Address),
    /// Local state disallows the requested transition.
    #[error("{0}")]
    Precondition(String),
    /// The remote call reverted.
    #[error("contract rejected the call: {0}")]
    ContractRejected(String),
}

/// Classifies raw error text from a wallet or node call.
pub(crate) fn classify(raw: &str) -> VotingError {
    if is_user_rejection(raw) {
        VotingError::UserRejected
    } else if let Some(reason) = revert_reason(raw) {
        VotingError::ContractRejected(reason.to_string())
    } else if raw.contains("revert") {
        VotingError::ContractRejected(raw.to_string())
    } else {
        VotingError::Connectivity(raw.to_string())
    }
}

/// Extracts the reason string from `… reverted: <reason>` error text, if one
/// is present. The reason runs to the next quote or the end of the text.
pub fn revert_reason(raw: &str) -> Option<&str> {
    let start = raw.find("reverted: ")? + "reverted: ".len();
    let rest = &raw[start..];
    let end = rest.find(&['"', '\n'][..]).unwrap_or(rest.len());
    let reason = rest[..end].trim().trim_end_matches(&[',', '.'][..]);
    (!reason.is_empty()).then_some(reason)
}

/// Whether raw error text reports the user dismissing a wallet prompt.
pub fn is_user_rejection(raw: &str) -> bool {
    raw.contains("User denied") || raw.contains("user rejected") || raw.contains("User rejected")
}
