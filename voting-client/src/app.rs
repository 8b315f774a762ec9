//! Top-level orchestration: access layer plus synchronization layer.

use voting_interface::{Address, VotingContract};

use crate::access::{ContractClient, TxOutcome};
use crate::sync::{DashboardState, SyncHandle};

/// Wires the contract access layer to the synchronization layer: every
/// successful mutation is followed by a full refresh of voter status, phase
/// and candidates, so rendered state always comes from a round-trip read.
pub struct VotingApp<C> {
    client: ContractClient<C>,
    sync: SyncHandle<C>,
}

impl<C: VotingContract> VotingApp<C> {
    /// Builds the app around a contract handle.
    pub fn new(contract: C) -> Self {
        let client = ContractClient::new(contract);
        let sync = SyncHandle::new(client.clone());
        Self { client, sync }
    }

    /// The access layer, for read operations.
    pub fn client(&self) -> &ContractClient<C> {
        &self.client
    }

    /// The synchronization layer, for subscribing to snapshots.
    pub fn sync(&self) -> &SyncHandle<C> {
        &self.sync
    }

    /// Manual refresh, also used on connect.
    pub async fn refresh(&self, account: Address) -> DashboardState {
        self.sync.refresh(account).await
    }

    /// Requests voter registration, refreshing on success.
    pub async fn request_registration(&self, account: Address, cin: &str) -> TxOutcome {
        let outcome = self.client.request_registration(account, cin).await;
        self.finish(account, outcome).await
    }

    /// Casts a vote, refreshing on success.
    pub async fn submit_vote(&self, account: Address, candidate_id: &str) -> TxOutcome {
        let outcome = self.client.submit_vote(account, candidate_id).await;
        self.finish(account, outcome).await
    }

    /// Adds a candidate, refreshing on success.
    pub async fn add_candidate(&self, account: Address, name: &str) -> TxOutcome {
        let outcome = self.client.add_candidate(account, name).await;
        self.finish(account, outcome).await
    }

    /// Approves a pending voter, refreshing on success.
    pub async fn approve_voter(&self, account: Address, voter: Address) -> TxOutcome {
        let outcome = self.client.approve_voter(account, voter).await;
        self.finish(account, outcome).await
    }

    /// Rejects a pending voter, refreshing on success.
    pub async fn reject_voter(&self, account: Address, voter: Address) -> TxOutcome {
        let outcome = self.client.reject_voter(account, voter).await;
        self.finish(account, outcome).await
    }

    /// Starts the voting session, refreshing on success.
    pub async fn start_voting(&self, account: Address) -> TxOutcome {
        let outcome = self.client.start_voting(account).await;
        self.finish(account, outcome).await
    }

    /// Ends the voting session, refreshing on success.
    pub async fn end_voting(&self, account: Address) -> TxOutcome {
        let outcome = self.client.end_voting(account).await;
        self.finish(account, outcome).await
    }

    /// Resets an ended session, refreshing on success.
    pub async fn reset_voting(&self, account: Address) -> TxOutcome {
        let outcome = self.client.reset_voting(account).await;
        self.finish(account, outcome).await
    }

    async fn finish(&self, account: Address, outcome: TxOutcome) -> TxOutcome {
        if outcome.success {
            self.sync.refresh(account).await;
        }
        outcome
    }
}
