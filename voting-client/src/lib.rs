//! Client-side core of the voting dapp: the typed contract access layer, the
//! admin authorization gate, and the state synchronization layer.
//!
//! The control flow is always the same: a caller invokes an access-layer
//! operation, privileged operations pass through the authorization gate, the
//! remote call runs with the caller's account attached, the result is
//! normalized into a [`TxOutcome`], and — iff the mutation succeeded — the
//! synchronization layer re-reads every piece of dependent state before
//! anything is rendered. Display state is only ever set from a round-trip
//! read, never inferred from an in-flight mutation's expected outcome.

mod access;
mod app;
pub mod config;
mod connection;
mod errors;
mod gate;
mod sync;

pub use access::{ContractClient, TxOutcome};
pub use app::VotingApp;
pub use connection::{connect, run_event_loop, Session};
pub use errors::{is_user_rejection, revert_reason, VotingError};
pub use gate::is_authorized_admin;
pub use sync::{DashboardState, SyncHandle};
