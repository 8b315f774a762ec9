//! Connection provider: wallet session establishment and re-synchronization.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use voting_interface::{Address, SessionEvent, VotingContract, WalletProvider};

use crate::access::ContractClient;
use crate::errors::{classify, VotingError};
use crate::sync::SyncHandle;

/// An established wallet session. Re-acquired wholesale on every account or
/// network switch — never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// The active account, the first one the wallet authorized.
    pub account: Address,
    /// The chain the wallet is connected to.
    pub chain_id: u64,
}

/// Establishes a session: requests wallet authorization, takes the first
/// authorized account, records the chain id, and probes the contract by
/// reading its owner so a misconfigured address fails here rather than on
/// first use.
pub async fn connect<W, C>(
    wallet: &W,
    client: &ContractClient<C>,
) -> Result<Session, VotingError>
where
    W: WalletProvider,
    C: VotingContract,
{
    let accounts = wallet
        .request_accounts()
        .await
        .map_err(|err| classify(&err.to_string()))?;
    let account = *accounts.first().ok_or(VotingError::NoAccount)?;

    let chain_id = wallet
        .chain_id()
        .await
        .map_err(|err| VotingError::Connectivity(err.to_string()))?;

    let owner = client
        .contract()
        .owner()
        .await
        .map_err(|err| VotingError::Connectivity(err.to_string()))?;
    info!(%account, %owner, chain_id, "wallet session established");

    Ok(Session { account, chain_id })
}

/// Consumes the wallet's session events and, on either account-switch or
/// network-switch, re-acquires the whole session and re-runs a full refresh.
/// The resulting session (or `None` once disconnected) is published through
/// `sessions`. Returns when the wallet's event stream closes.
pub async fn run_event_loop<W, C>(
    wallet: W,
    client: ContractClient<C>,
    sync: SyncHandle<C>,
    sessions: watch::Sender<Option<Session>>,
) where
    W: WalletProvider,
    C: VotingContract,
{
    let mut events = wallet.subscribe_events();
    loop {
        let event = match events.recv().await {
            Ok(event) => Some(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "missed wallet session events; resynchronizing");
                None
            }
            Err(RecvError::Closed) => break,
        };

        if let Some(event) = &event {
            debug!(?event, "wallet session event");
            if matches!(event, SessionEvent::AccountsChanged(accounts) if accounts.is_empty()) {
                info!("wallet disconnected");
                sessions.send_replace(None);
                continue;
            }
        }

        match connect(&wallet, &client).await {
            Ok(session) => {
                sync.refresh(session.account).await;
                sessions.send_replace(Some(session));
            }
            Err(err) => {
                warn!(%err, "re-synchronization after session event failed");
                sessions.send_replace(None);
            }
        }
    }
}
