//! Service traits connecting the client to the wallet and the deployed
//! contract. The method set mirrors the contract's ABI one-to-one; the
//! client layers its own precondition checks and result normalization on top.

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::{Address, Candidate, SessionEvent, VoterRecord};

/// Handle to the deployed voting contract, bound to a fixed address.
///
/// Reads are `eth_call`-style queries; writes submit a transaction with the
/// given sender and resolve once the transaction is confirmed. Implementations
/// must preserve the raw revert/error text in their error's `Display` output:
/// the client's message translation pattern-matches on it.
#[async_trait]
pub trait VotingContract: Send + Sync + 'static {
    /// The error type for failed calls.
    type Error: Debug + Display + Send + Sync;

    /// The account recorded as contract owner (admin).
    async fn owner(&self) -> Result<Address, Self::Error>;

    /// The voter record for `account`. Unknown accounts yield the zero record.
    async fn voter(&self, account: Address) -> Result<VoterRecord, Self::Error>;

    /// Whether voting has been started.
    async fn voting_started(&self) -> Result<bool, Self::Error>;

    /// Whether voting has been ended.
    async fn voting_ended(&self) -> Result<bool, Self::Error>;

    /// Number of candidates on the ballot.
    async fn candidates_count(&self) -> Result<u64, Self::Error>;

    /// The candidate with the given 1-based id.
    async fn candidate(&self, id: u64) -> Result<Candidate, Self::Error>;

    /// Pending registration requests. Called with `from` attached so the
    /// contract can enforce owner-only access on its side as well.
    async fn registration_requests(&self, from: Address) -> Result<Vec<Address>, Self::Error>;

    /// The winning candidate's name. Reverts while voting has not ended.
    async fn winner(&self) -> Result<String, Self::Error>;

    /// The identity string a pending voter submitted. Owner-scoped read.
    async fn cin_of(&self, from: Address, voter: Address) -> Result<String, Self::Error>;

    /// Submits a registration request carrying the sender's identity string.
    async fn request_voter_registration(&self, from: Address, cin: &str)
        -> Result<(), Self::Error>;

    /// Casts the sender's single vote for the given candidate id.
    async fn vote(&self, from: Address, candidate_id: u64) -> Result<(), Self::Error>;

    /// Adds a candidate to the ballot. Owner only.
    async fn add_candidate(&self, from: Address, name: &str) -> Result<(), Self::Error>;

    /// Approves a pending registration request. Owner only.
    async fn approve_voter(&self, from: Address, voter: Address) -> Result<(), Self::Error>;

    /// Rejects a pending registration request. Owner only.
    async fn reject_voter_request(&self, from: Address, voter: Address)
        -> Result<(), Self::Error>;

    /// Opens the voting session. Owner only.
    async fn start_voting(&self, from: Address) -> Result<(), Self::Error>;

    /// Closes the voting session. Owner only.
    async fn end_voting(&self, from: Address) -> Result<(), Self::Error>;

    /// Resets an ended session back to not-started. Owner only.
    async fn reset_voting(&self, from: Address) -> Result<(), Self::Error>;
}

/// Session with the wallet holding the caller's accounts.
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
    /// The error type for failed wallet calls.
    type Error: Debug + Display + Send + Sync;

    /// Requests wallet authorization and returns the authorized accounts.
    /// The first entry is the active account.
    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// The chain the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64, Self::Error>;

    /// Subscribes to account-switch and network-switch events. On either
    /// event the whole session must be re-acquired and re-synchronized.
    fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent>;
}
