use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers_core::types::H160;
use ethers_providers::{Http, Middleware, Provider, ProviderError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use voting_interface::{Address, SessionEvent, WalletProvider};

use crate::config::EthConnectionConfig;

pub(crate) fn to_eth(address: Address) -> H160 {
    H160::from_slice(address.as_bytes())
}

pub(crate) fn from_eth(address: H160) -> Address {
    Address::new(address.0)
}

/// Wallet session over a JSON-RPC node.
///
/// `eth_requestAccounts` is issued for browser-wallet bridges; bare dev nodes
/// that only implement `eth_accounts` are handled by falling back to it. A
/// background task polls the account list and chain id and broadcasts a
/// [`SessionEvent`] whenever either changes, standing in for the push events
/// a browser wallet would emit.
pub struct EthWalletProvider {
    provider: Arc<Provider<Http>>,
    events: broadcast::Sender<SessionEvent>,
    watcher: JoinHandle<()>,
}

impl EthWalletProvider {
    /// Connects to the node named by `config` and starts the session watcher.
    pub fn new(config: &EthConnectionConfig) -> anyhow::Result<Self> {
        let interval = Duration::from_millis(config.poll_interval_ms);
        let provider = Arc::new(
            Provider::<Http>::try_from(config.rpc_address.as_str())?.interval(interval),
        );
        let (events, _) = broadcast::channel(16);
        let watcher = tokio::spawn(watch_session(provider.clone(), events.clone(), interval));
        Ok(Self {
            provider,
            events,
            watcher,
        })
    }

    /// The shared provider, also used to construct the contract handle.
    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }
}

impl Drop for EthWalletProvider {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

#[async_trait]
impl WalletProvider for EthWalletProvider {
    type Error = anyhow::Error;

    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error> {
        let requested: Result<Vec<H160>, ProviderError> =
            self.provider.request("eth_requestAccounts", ()).await;
        let accounts = match requested {
            Ok(accounts) => accounts,
            Err(err) => {
                let raw = err.to_string();
                if raw.contains("not found") || raw.contains("not supported") {
                    // Bare dev node without the wallet-prompt method.
                    self.provider.get_accounts().await?
                } else {
                    return Err(err.into());
                }
            }
        };
        Ok(accounts.into_iter().map(from_eth).collect())
    }

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(self.provider.get_chainid().await?.as_u64())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

async fn watch_session(
    provider: Arc<Provider<Http>>,
    events: broadcast::Sender<SessionEvent>,
    interval: Duration,
) {
    let mut last_accounts: Option<Vec<H160>> = None;
    let mut last_chain: Option<u64> = None;
    loop {
        tokio::time::sleep(interval).await;

        match provider.get_accounts().await {
            Ok(accounts) => {
                if last_accounts.as_ref() != Some(&accounts) {
                    if last_accounts.is_some() {
                        debug!(?accounts, "wallet account set changed");
                        let _ = events.send(SessionEvent::AccountsChanged(
                            accounts.iter().copied().map(from_eth).collect(),
                        ));
                    }
                    last_accounts = Some(accounts);
                }
            }
            Err(err) => trace!(%err, "account poll failed"),
        }

        match provider.get_chainid().await {
            Ok(chain_id) => {
                let chain_id = chain_id.as_u64();
                if last_chain != Some(chain_id) {
                    if last_chain.is_some() {
                        debug!(chain_id, "wallet chain changed");
                        let _ = events.send(SessionEvent::ChainChanged(chain_id));
                    }
                    last_chain = Some(chain_id);
                }
            }
            Err(err) => trace!(%err, "chain id poll failed"),
        }
    }
}
