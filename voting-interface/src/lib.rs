//! Shared types and service traits for the voting dapp client.
//!
//! This crate defines the two seams the rest of the workspace is built
//! against: [`VotingContract`], the fixed method surface of the deployed
//! voting contract, and [`WalletProvider`], the session with the wallet that
//! holds the caller's accounts. Adapters implement these traits; the client
//! crate is generic over them, so tests can substitute in-memory
//! implementations without a live wallet or chain.

#![deny(missing_docs)]

mod contract;
mod types;

pub use contract::{VotingContract, WalletProvider};
pub use types::{Address, AddressParseError, Candidate, SessionEvent, VoterRecord, VotingPhase};
