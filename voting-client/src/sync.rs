//! The synchronization layer: re-reads all dependent state after mutations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;
use voting_interface::{Address, Candidate, VoterRecord, VotingContract, VotingPhase};

use crate::access::ContractClient;

/// The full read-state a dashboard renders, captured by one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// The active account's voter record.
    pub voter: VoterRecord,
    /// The current voting phase.
    pub phase: VotingPhase,
    /// All candidates, ordered by ascending id.
    pub candidates: Vec<Candidate>,
    /// Which refresh produced this snapshot. Carries no ordering guarantee
    /// between overlapping refreshes; it exists for logging and tests.
    pub refresh_seq: u64,
}

/// Re-fetches voter status, voting phase and the candidate list together and
/// publishes the result through a watch channel.
///
/// All three pieces are always read as a unit — a single mutation is never
/// assumed to affect only one of them. Overlapping refreshes are tolerated:
/// whichever refresh resolves last overwrites the published snapshot
/// unconditionally, and superseded in-flight reads are simply discarded.
pub struct SyncHandle<C> {
    client: ContractClient<C>,
    state: watch::Sender<DashboardState>,
    next_seq: Arc<AtomicU64>,
}

impl<C> Clone for SyncHandle<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            state: self.state.clone(),
            next_seq: self.next_seq.clone(),
        }
    }
}

impl<C: VotingContract> SyncHandle<C> {
    /// Creates a handle publishing the empty snapshot until the first refresh.
    pub fn new(client: ContractClient<C>) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            client,
            state,
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Re-fetches everything for `account` and publishes the new snapshot.
    pub async fn refresh(&self, account: Address) -> DashboardState {
        let refresh_seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%account, refresh_seq, "refreshing dashboard state");
        let (voter, phase, candidates) = tokio::join!(
            self.client.voter_status(account),
            self.client.voting_phase(),
            self.client.candidates(),
        );
        let snapshot = DashboardState {
            voter,
            phase,
            candidates,
            refresh_seq,
        };
        self.state.send_replace(snapshot.clone());
        snapshot
    }

    /// Subscribes to published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }
}
