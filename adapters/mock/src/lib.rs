//! In-memory stand-ins for the deployed contract and the wallet, used in
//! tests. [`MockVotingContract`] enforces the same rules the on-chain
//! contract does (owner checks, phase machine, single vote, CIN uniqueness)
//! and reverts with the same reason strings, so client-side error translation
//! and precondition logic can be exercised without a chain.

mod contract;
mod wallet;

pub use contract::MockVotingContract;
pub use wallet::MockWallet;
