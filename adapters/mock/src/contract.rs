use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use voting_interface::{Address, Candidate, VoterRecord, VotingContract};

#[derive(Debug, Default)]
struct ContractState {
    voting_started: bool,
    voting_ended: bool,
    candidates: Vec<Candidate>,
    voters: HashMap<Address, VoterRecord>,
    pending_requests: Vec<Address>,
    used_cins: HashSet<String>,
}

/// Voting contract used in tests.
///
/// Keeps the whole contract state in memory and enforces the on-chain rule
/// set, reverting with the same reason strings the deployed contract uses.
/// Two test controls exist on top: [`set_offline`](Self::set_offline) makes
/// every call fail at the transport level, and
/// [`submitted_tx_count`](Self::submitted_tx_count) counts the write calls
/// that reached the contract, so tests can assert that locally-rejected
/// operations never submitted a transaction.
#[derive(Clone)]
pub struct MockVotingContract {
    owner: Address,
    state: Arc<RwLock<ContractState>>,
    offline: Arc<AtomicBool>,
    submitted_txs: Arc<AtomicU64>,
}

impl MockVotingContract {
    /// Creates a fresh contract owned by `owner`.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            state: Arc::new(Default::default()),
            offline: Arc::new(AtomicBool::new(false)),
            submitted_txs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// When set, every call fails as if the node were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of state-changing calls that reached the contract.
    pub fn submitted_tx_count(&self) -> u64 {
        self.submitted_txs.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> anyhow::Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused: node unreachable");
        }
        Ok(())
    }

    fn check_owner(&self, from: Address) -> anyhow::Result<()> {
        if from != self.owner {
            anyhow::bail!("execution reverted: Only owner can call this function");
        }
        Ok(())
    }

    fn record_tx(&self) {
        self.submitted_txs.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VotingContract for MockVotingContract {
    type Error = anyhow::Error;

    async fn owner(&self) -> Result<Address, Self::Error> {
        self.check_online()?;
        Ok(self.owner)
    }

    async fn voter(&self, account: Address) -> Result<VoterRecord, Self::Error> {
        self.check_online()?;
        let state = self.state.read().await;
        Ok(state.voters.get(&account).cloned().unwrap_or_default())
    }

    async fn voting_started(&self) -> Result<bool, Self::Error> {
        self.check_online()?;
        Ok(self.state.read().await.voting_started)
    }

    async fn voting_ended(&self) -> Result<bool, Self::Error> {
        self.check_online()?;
        Ok(self.state.read().await.voting_ended)
    }

    async fn candidates_count(&self) -> Result<u64, Self::Error> {
        self.check_online()?;
        Ok(self.state.read().await.candidates.len() as u64)
    }

    async fn candidate(&self, id: u64) -> Result<Candidate, Self::Error> {
        self.check_online()?;
        let state = self.state.read().await;
        state
            .candidates
            .get((id as usize).wrapping_sub(1))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("execution reverted: Invalid candidate"))
    }

    async fn registration_requests(&self, from: Address) -> Result<Vec<Address>, Self::Error> {
        self.check_online()?;
        self.check_owner(from)?;
        Ok(self.state.read().await.pending_requests.clone())
    }

    async fn winner(&self) -> Result<String, Self::Error> {
        self.check_online()?;
        let state = self.state.read().await;
        if !state.voting_ended {
            anyhow::bail!("execution reverted: Voting has not ended");
        }
        // First maximal count wins, so ties resolve to the lowest id.
        let mut winner: Option<&Candidate> = None;
        for candidate in &state.candidates {
            if winner.map_or(true, |w| candidate.vote_count > w.vote_count) {
                winner = Some(candidate);
            }
        }
        winner
            .map(|c| c.name.clone())
            .ok_or_else(|| anyhow::anyhow!("execution reverted: No candidates"))
    }

    async fn cin_of(&self, from: Address, voter: Address) -> Result<String, Self::Error> {
        self.check_online()?;
        self.check_owner(from)?;
        let state = self.state.read().await;
        state
            .voters
            .get(&voter)
            .filter(|record| record.has_requested)
            .map(|record| record.cin.clone())
            .ok_or_else(|| anyhow::anyhow!("execution reverted: No registration request"))
    }

    async fn request_voter_registration(
        &self,
        from: Address,
        cin: &str,
    ) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        let mut state = self.state.write().await;
        let record = state.voters.entry(from).or_default();
        if record.is_registered {
            anyhow::bail!("execution reverted: Already registered");
        }
        if record.has_requested {
            anyhow::bail!("execution reverted: Already requested");
        }
        if state.used_cins.contains(cin) {
            anyhow::bail!("execution reverted: CIN already used");
        }
        let record = state.voters.entry(from).or_default();
        record.has_requested = true;
        record.cin = cin.to_string();
        state.pending_requests.push(from);
        state.used_cins.insert(cin.to_string());
        Ok(())
    }

    async fn vote(&self, from: Address, candidate_id: u64) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        let mut state = self.state.write().await;
        if !state.voting_started || state.voting_ended {
            anyhow::bail!("execution reverted: Voting is not active");
        }
        let record = state.voters.get(&from).cloned().unwrap_or_default();
        if !record.is_registered {
            anyhow::bail!("execution reverted: Not a registered voter");
        }
        if record.has_voted {
            anyhow::bail!("execution reverted: Already voted");
        }
        let index = (candidate_id as usize)
            .checked_sub(1)
            .filter(|i| *i < state.candidates.len())
            .ok_or_else(|| anyhow::anyhow!("execution reverted: Invalid candidate"))?;
        state.candidates[index].vote_count += 1;
        let record = state.voters.get_mut(&from).expect("record exists");
        record.has_voted = true;
        record.vote = candidate_id;
        Ok(())
    }

    async fn add_candidate(&self, from: Address, name: &str) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        self.check_owner(from)?;
        let mut state = self.state.write().await;
        if state.voting_started && !state.voting_ended {
            anyhow::bail!("execution reverted: Voting already started");
        }
        let id = state.candidates.len() as u64 + 1;
        state.candidates.push(Candidate {
            id,
            name: name.to_string(),
            vote_count: 0,
        });
        Ok(())
    }

    async fn approve_voter(&self, from: Address, voter: Address) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        self.check_owner(from)?;
        let mut state = self.state.write().await;
        let record = state
            .voters
            .get_mut(&voter)
            .filter(|record| record.has_requested)
            .ok_or_else(|| anyhow::anyhow!("execution reverted: No registration request"))?;
        if record.is_registered {
            anyhow::bail!("execution reverted: Already registered");
        }
        record.is_registered = true;
        state.pending_requests.retain(|a| *a != voter);
        Ok(())
    }

    async fn reject_voter_request(&self, from: Address, voter: Address) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        self.check_owner(from)?;
        let mut state = self.state.write().await;
        let record = state
            .voters
            .get_mut(&voter)
            .filter(|record| record.has_requested && !record.is_registered)
            .ok_or_else(|| anyhow::anyhow!("execution reverted: No registration request"))?;
        record.has_requested = false;
        let cin = std::mem::take(&mut record.cin);
        state.used_cins.remove(&cin);
        state.pending_requests.retain(|a| *a != voter);
        Ok(())
    }

    async fn start_voting(&self, from: Address) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        self.check_owner(from)?;
        let mut state = self.state.write().await;
        if state.voting_ended {
            anyhow::bail!("execution reverted: Voting has ended");
        }
        if state.voting_started {
            anyhow::bail!("execution reverted: Voting already started");
        }
        state.voting_started = true;
        Ok(())
    }

    async fn end_voting(&self, from: Address) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        self.check_owner(from)?;
        let mut state = self.state.write().await;
        if !state.voting_started {
            anyhow::bail!("execution reverted: Voting has not started");
        }
        if state.voting_ended {
            anyhow::bail!("execution reverted: Voting already ended");
        }
        state.voting_ended = true;
        Ok(())
    }

    async fn reset_voting(&self, from: Address) -> Result<(), Self::Error> {
        self.check_online()?;
        self.record_tx();
        self.check_owner(from)?;
        let mut state = self.state.write().await;
        if !state.voting_ended {
            anyhow::bail!("execution reverted: Voting has not ended");
        }
        state.voting_started = false;
        state.voting_ended = false;
        for candidate in &mut state.candidates {
            candidate.vote_count = 0;
        }
        state.voters.clear();
        state.pending_requests.clear();
        state.used_cins.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = Address::new([1; 20]);
    const VOTER: Address = Address::new([2; 20]);
    const OTHER: Address = Address::new([3; 20]);

    #[tokio::test]
    async fn fresh_contract_is_empty() {
        let contract = MockVotingContract::new(ADMIN);
        assert_eq!(contract.owner().await.unwrap(), ADMIN);
        assert_eq!(contract.candidates_count().await.unwrap(), 0);
        assert!(!contract.voting_started().await.unwrap());
        assert!(!contract.voting_ended().await.unwrap());
        assert_eq!(contract.voter(VOTER).await.unwrap(), VoterRecord::default());
    }

    #[tokio::test]
    async fn only_owner_may_administer() {
        let contract = MockVotingContract::new(ADMIN);
        let err = contract.add_candidate(OTHER, "Alice").await.unwrap_err();
        assert!(err.to_string().contains("Only owner"));
        let err = contract.start_voting(OTHER).await.unwrap_err();
        assert!(err.to_string().contains("Only owner"));
        let err = contract.registration_requests(OTHER).await.unwrap_err();
        assert!(err.to_string().contains("Only owner"));
    }

    #[tokio::test]
    async fn candidate_ids_are_contiguous_from_one() {
        let contract = MockVotingContract::new(ADMIN);
        contract.add_candidate(ADMIN, "Alice").await.unwrap();
        contract.add_candidate(ADMIN, "Bob").await.unwrap();
        assert_eq!(contract.candidates_count().await.unwrap(), 2);
        assert_eq!(contract.candidate(1).await.unwrap().name, "Alice");
        assert_eq!(contract.candidate(2).await.unwrap().name, "Bob");
        assert!(contract.candidate(3).await.is_err());
        assert!(contract.candidate(0).await.is_err());
    }

    #[tokio::test]
    async fn cin_cannot_be_reused() {
        let contract = MockVotingContract::new(ADMIN);
        contract
            .request_voter_registration(VOTER, "ABC1234")
            .await
            .unwrap();
        let err = contract
            .request_voter_registration(OTHER, "ABC1234")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("CIN already used"));

        // Rejection frees the CIN again.
        contract.reject_voter_request(ADMIN, VOTER).await.unwrap();
        contract
            .request_voter_registration(OTHER, "ABC1234")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn approval_clears_the_queue() {
        let contract = MockVotingContract::new(ADMIN);
        contract
            .request_voter_registration(VOTER, "ABC1234")
            .await
            .unwrap();
        assert_eq!(
            contract.registration_requests(ADMIN).await.unwrap(),
            vec![VOTER]
        );
        assert_eq!(contract.cin_of(ADMIN, VOTER).await.unwrap(), "ABC1234");

        contract.approve_voter(ADMIN, VOTER).await.unwrap();
        assert!(contract
            .registration_requests(ADMIN)
            .await
            .unwrap()
            .is_empty());
        let record = contract.voter(VOTER).await.unwrap();
        assert!(record.is_registered);
        assert!(record.is_consistent());
    }

    #[tokio::test]
    async fn voting_requires_active_phase_and_registration() {
        let contract = MockVotingContract::new(ADMIN);
        contract.add_candidate(ADMIN, "Alice").await.unwrap();

        let err = contract.vote(VOTER, 1).await.unwrap_err();
        assert!(err.to_string().contains("Voting is not active"));

        contract.start_voting(ADMIN).await.unwrap();
        let err = contract.vote(VOTER, 1).await.unwrap_err();
        assert!(err.to_string().contains("Not a registered voter"));

        contract
            .request_voter_registration(VOTER, "ABC1234")
            .await
            .unwrap();
        contract.approve_voter(ADMIN, VOTER).await.unwrap();
        contract.vote(VOTER, 1).await.unwrap();
        assert_eq!(contract.candidate(1).await.unwrap().vote_count, 1);

        let err = contract.vote(VOTER, 1).await.unwrap_err();
        assert!(err.to_string().contains("Already voted"));
    }

    #[tokio::test]
    async fn phase_machine_transitions() {
        let contract = MockVotingContract::new(ADMIN);
        assert!(contract.end_voting(ADMIN).await.is_err());
        assert!(contract.reset_voting(ADMIN).await.is_err());

        contract.start_voting(ADMIN).await.unwrap();
        let err = contract.start_voting(ADMIN).await.unwrap_err();
        assert!(err.to_string().contains("Voting already started"));
        let err = contract.add_candidate(ADMIN, "Late").await.unwrap_err();
        assert!(err.to_string().contains("Voting already started"));

        contract.end_voting(ADMIN).await.unwrap();
        let err = contract.start_voting(ADMIN).await.unwrap_err();
        assert!(err.to_string().contains("Voting has ended"));
    }

    #[tokio::test]
    async fn winner_is_gated_on_voting_end_and_ties_go_to_lowest_id() {
        let contract = MockVotingContract::new(ADMIN);
        contract.add_candidate(ADMIN, "Alice").await.unwrap();
        contract.add_candidate(ADMIN, "Bob").await.unwrap();
        contract.start_voting(ADMIN).await.unwrap();

        let err = contract.winner().await.unwrap_err();
        assert!(err.to_string().contains("Voting has not ended"));

        contract.end_voting(ADMIN).await.unwrap();
        assert_eq!(contract.winner().await.unwrap(), "Alice");
    }

    #[tokio::test]
    async fn reset_preserves_candidates_and_zeroes_counts() {
        let contract = MockVotingContract::new(ADMIN);
        contract.add_candidate(ADMIN, "Alice").await.unwrap();
        contract.start_voting(ADMIN).await.unwrap();
        contract
            .request_voter_registration(VOTER, "ABC1234")
            .await
            .unwrap();
        contract.approve_voter(ADMIN, VOTER).await.unwrap();
        contract.vote(VOTER, 1).await.unwrap();
        contract.end_voting(ADMIN).await.unwrap();

        contract.reset_voting(ADMIN).await.unwrap();
        assert!(!contract.voting_started().await.unwrap());
        assert!(!contract.voting_ended().await.unwrap());
        assert_eq!(contract.candidate(1).await.unwrap().vote_count, 0);
        assert_eq!(contract.candidate(1).await.unwrap().name, "Alice");
        // Voter state starts over, including CIN uniqueness.
        assert_eq!(contract.voter(VOTER).await.unwrap(), VoterRecord::default());
        contract
            .request_voter_registration(VOTER, "ABC1234")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn offline_contract_fails_every_call() {
        let contract = MockVotingContract::new(ADMIN);
        contract.set_offline(true);
        assert!(contract.owner().await.is_err());
        assert!(contract.voting_started().await.is_err());
        let before = contract.submitted_tx_count();
        assert!(contract.start_voting(ADMIN).await.is_err());
        assert_eq!(contract.submitted_tx_count(), before);

        contract.set_offline(false);
        assert!(contract.owner().await.is_ok());
    }
}
