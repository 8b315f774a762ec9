//! Ethereum adapter: implements the wallet and contract seams over a
//! JSON-RPC node. Transactions are signed by the node's managed accounts
//! (the wallet's job), never locally — the adapter only attaches the sender.

mod config;
mod contract;
mod provider;

pub use config::EthConnectionConfig;
pub use contract::{load_abi, EthVotingContract};
pub use provider::EthWalletProvider;
