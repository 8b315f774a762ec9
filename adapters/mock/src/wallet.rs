use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use voting_interface::{Address, SessionEvent, WalletProvider};

/// Wallet used in tests. Holds a fixed account list and lets tests trigger
/// the account-switch and network-switch events a browser wallet would emit.
#[derive(Clone)]
pub struct MockWallet {
    accounts: Arc<RwLock<Vec<Address>>>,
    chain_id: Arc<RwLock<u64>>,
    events: broadcast::Sender<SessionEvent>,
}

impl MockWallet {
    /// Creates a wallet exposing `accounts`, connected to a local dev chain.
    pub fn new(accounts: Vec<Address>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Arc::new(RwLock::new(accounts)),
            chain_id: Arc::new(RwLock::new(31337)),
            events,
        }
    }

    /// Replaces the account list and emits `accountsChanged`.
    pub async fn switch_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.write().await = accounts.clone();
        let _ = self.events.send(SessionEvent::AccountsChanged(accounts));
    }

    /// Switches networks and emits `chainChanged`.
    pub async fn switch_chain(&self, chain_id: u64) {
        *self.chain_id.write().await = chain_id;
        let _ = self.events.send(SessionEvent::ChainChanged(chain_id));
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    type Error = anyhow::Error;

    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error> {
        Ok(self.accounts.read().await.clone())
    }

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(*self.chain_id.read().await)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
