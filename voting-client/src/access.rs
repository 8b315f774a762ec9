//! Typed wrappers around the contract operations.
//!
//! Reads degrade to safe defaults (empty lists, zero records, not-started
//! phase) so read-only views stay renderable through transient failures.
//! Mutations validate local preconditions first, pass privileged calls
//! through the authorization gate, and normalize every result into a
//! [`TxOutcome`] carrying one fixed user-facing message per known failure.
//! Nothing here retries: a prior attempt may have partially succeeded
//! on-chain, so a failed mutation waits for explicit user re-initiation.

use std::sync::Arc;

use tracing::{debug, info, warn};
use voting_interface::{Address, Candidate, VoterRecord, VotingContract, VotingPhase};

use crate::errors::{is_user_rejection, revert_reason};
use crate::gate::is_authorized_admin;

/// Minimum CIN length after trimming.
const MIN_CIN_LEN: usize = 6;

const NOT_OWNER_MESSAGE: &str =
    "Current account is not the contract owner. Please switch to the admin account in MetaMask.";
const WALLET_REJECTED_MESSAGE: &str = "Transaction was rejected in MetaMask.";

/// Normalized result of a state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// Whether the transaction was submitted and confirmed.
    pub success: bool,
    /// Fixed user-facing message describing the outcome.
    pub message: String,
}

impl TxOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// The contract access layer: one method per contract operation, with the
/// caller's account threaded through every call.
pub struct ContractClient<C> {
    contract: Arc<C>,
}

impl<C> Clone for ContractClient<C> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
        }
    }
}

impl<C: VotingContract> ContractClient<C> {
    /// Wraps a contract handle.
    pub fn new(contract: C) -> Self {
        Self {
            contract: Arc::new(contract),
        }
    }

    /// The underlying handle.
    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// The voter record for `account`, or the zero record if the read fails.
    pub async fn voter_status(&self, account: Address) -> VoterRecord {
        match self.contract.voter(account).await {
            Ok(record) => record,
            Err(err) => {
                warn!(%account, %err, "voter status read failed, returning zero record");
                VoterRecord::default()
            }
        }
    }

    /// The current voting phase, defaulting to not-started if a read fails.
    pub async fn voting_phase(&self) -> VotingPhase {
        let (started, ended) =
            tokio::join!(self.contract.voting_started(), self.contract.voting_ended());
        match (started, ended) {
            (Ok(is_started), Ok(is_ended)) => VotingPhase {
                is_started,
                is_ended,
            },
            (Err(err), _) | (_, Err(err)) => {
                warn!(%err, "voting phase read failed, returning not-started");
                VotingPhase::default()
            }
        }
    }

    /// All candidates ordered by ascending id, fetched by iterating ids
    /// `1..=count`. Returns an empty list if any read fails.
    pub async fn candidates(&self) -> Vec<Candidate> {
        let count = match self.contract.candidates_count().await {
            Ok(count) => count,
            Err(err) => {
                warn!(%err, "candidate count read failed, returning empty list");
                return Vec::new();
            }
        };
        let mut candidates = Vec::with_capacity(count as usize);
        for id in 1..=count {
            match self.contract.candidate(id).await {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => {
                    warn!(id, %err, "candidate read failed, returning empty list");
                    return Vec::new();
                }
            }
        }
        candidates
    }

    /// Pending registration requests, visible to the admin only.
    ///
    /// Any failure — including a non-admin caller — degrades to an empty
    /// list: failures here mean "nothing to show", not a fatal error.
    pub async fn registration_requests(&self, account: Address) -> Vec<Address> {
        match is_authorized_admin(self.contract(), account).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(%account, "registration requests queried by non-admin account");
                return Vec::new();
            }
            Err(err) => {
                warn!(%err, "admin check failed while listing registration requests");
                return Vec::new();
            }
        }
        match self.contract.registration_requests(account).await {
            Ok(requests) => requests,
            Err(err) => {
                warn!(%err, "registration request read failed, returning empty list");
                Vec::new()
            }
        }
    }

    /// Pending registration requests paired with each requester's CIN, for
    /// the admin review view. A failed CIN read leaves that entry blank.
    pub async fn registration_requests_with_cins(
        &self,
        account: Address,
    ) -> Vec<(Address, String)> {
        let requests = self.registration_requests(account).await;
        let mut entries = Vec::with_capacity(requests.len());
        for voter in requests {
            let cin = match self.contract.cin_of(account, voter).await {
                Ok(cin) => cin,
                Err(err) => {
                    warn!(%voter, %err, "CIN read failed for pending request");
                    String::new()
                }
            };
            entries.push((voter, cin));
        }
        entries
    }

    /// The winner's name, or a descriptive sentinel while voting has not
    /// ended. Never errors; the result is display text either way.
    pub async fn winner(&self) -> String {
        match self.contract.winner().await {
            Ok(name) => name,
            Err(err) => {
                let raw = err.to_string();
                if raw.contains("Voting has not ended") {
                    "Voting has not ended yet.".to_string()
                } else {
                    warn!(%raw, "winner read failed");
                    "Failed to get winner.".to_string()
                }
            }
        }
    }

    /// Submits a registration request carrying the caller's CIN.
    pub async fn request_registration(&self, account: Address, cin: &str) -> TxOutcome {
        let cin = cin.trim();
        if cin.is_empty() {
            return TxOutcome::fail("Please provide a valid CIN number.");
        }
        if cin.len() < MIN_CIN_LEN || !cin.chars().all(|c| c.is_ascii_alphanumeric()) {
            return TxOutcome::fail(format!(
                "CIN must be at least {MIN_CIN_LEN} letters or digits."
            ));
        }

        // Fresh read right before submission, to avoid paying for a
        // transaction the contract would reject anyway.
        let status = self.voter_status(account).await;
        if status.is_registered {
            return TxOutcome::fail("You are already registered as a voter.");
        }
        if status.has_requested {
            return TxOutcome::fail("You have already submitted a registration request.");
        }

        debug!(%account, "submitting registration request");
        match self.contract.request_voter_registration(account, cin).await {
            Ok(()) => {
                info!(%account, "registration request submitted");
                TxOutcome::ok("Registration request sent successfully.")
            }
            Err(err) => TxOutcome::fail(registration_error_message(&err.to_string())),
        }
    }

    /// Casts the caller's vote. `candidate_id` is the raw user input; empty
    /// or non-numeric ids are rejected before any remote call.
    pub async fn submit_vote(&self, account: Address, candidate_id: &str) -> TxOutcome {
        let candidate_id = candidate_id.trim();
        if candidate_id.is_empty() {
            return TxOutcome::fail("Please select a candidate to vote for.");
        }
        let candidate_id: u64 = match candidate_id.parse() {
            Ok(id) => id,
            Err(_) => return TxOutcome::fail("Invalid candidate ID format."),
        };

        let status = self.voter_status(account).await;
        if status.has_voted {
            return TxOutcome::fail("You have already cast your vote.");
        }

        debug!(%account, candidate_id, "submitting vote");
        match self.contract.vote(account, candidate_id).await {
            Ok(()) => {
                info!(%account, candidate_id, "vote submitted");
                TxOutcome::ok("Vote cast successfully.")
            }
            Err(err) => TxOutcome::fail(vote_error_message(&err.to_string())),
        }
    }

    /// Adds a candidate to the ballot. Admin only; rejected locally while
    /// voting is in progress so the user gets a fast answer.
    pub async fn add_candidate(&self, account: Address, name: &str) -> TxOutcome {
        let name = name.trim();
        if name.is_empty() {
            return TxOutcome::fail("Please provide a candidate name.");
        }
        if let Err(outcome) = self.require_admin(account).await {
            return outcome;
        }
        let phase = self.voting_phase().await;
        if phase.is_active() {
            return TxOutcome::fail("Candidates cannot be added while voting is in progress.");
        }

        match self.contract.add_candidate(account, name).await {
            Ok(()) => {
                info!(%account, name, "candidate added");
                TxOutcome::ok("Candidate added successfully.")
            }
            Err(err) => TxOutcome::fail(admin_error_message(
                "Failed to add candidate.",
                &err.to_string(),
            )),
        }
    }

    /// Approves a pending registration request. Admin only.
    pub async fn approve_voter(&self, account: Address, voter: Address) -> TxOutcome {
        if let Err(outcome) = self.require_admin(account).await {
            return outcome;
        }
        match self.contract.approve_voter(account, voter).await {
            Ok(()) => {
                info!(%account, %voter, "voter approved");
                TxOutcome::ok("Voter approved successfully.")
            }
            Err(err) => TxOutcome::fail(admin_error_message(
                "Failed to approve voter.",
                &err.to_string(),
            )),
        }
    }

    /// Rejects a pending registration request. Admin only.
    pub async fn reject_voter(&self, account: Address, voter: Address) -> TxOutcome {
        if let Err(outcome) = self.require_admin(account).await {
            return outcome;
        }
        match self.contract.reject_voter_request(account, voter).await {
            Ok(()) => {
                info!(%account, %voter, "voter rejected");
                TxOutcome::ok("Voter rejected successfully.")
            }
            Err(err) => TxOutcome::fail(admin_error_message(
                "Failed to reject voter.",
                &err.to_string(),
            )),
        }
    }

    /// Opens the voting session. Admin only; an ended session cannot be
    /// restarted without an explicit reset.
    pub async fn start_voting(&self, account: Address) -> TxOutcome {
        if let Err(outcome) = self.require_admin(account).await {
            return outcome;
        }
        let phase = self.voting_phase().await;
        if phase.is_started && phase.is_ended {
            return TxOutcome::fail(
                "Voting has ended. Reset the election to start another voting session.",
            );
        }

        match self.contract.start_voting(account).await {
            Ok(()) => {
                info!(%account, "voting started");
                TxOutcome::ok("Voting started successfully.")
            }
            Err(err) => {
                let raw = err.to_string();
                if raw.contains("Voting already started") {
                    return TxOutcome::fail(
                        "Voting has already been started and is still in progress.",
                    );
                }
                TxOutcome::fail(admin_error_message("Failed to start voting.", &raw))
            }
        }
    }

    /// Closes the voting session. Admin only.
    pub async fn end_voting(&self, account: Address) -> TxOutcome {
        if let Err(outcome) = self.require_admin(account).await {
            return outcome;
        }
        let phase = self.voting_phase().await;
        if !phase.is_started {
            return TxOutcome::fail("Voting has not started yet.");
        }
        if phase.is_ended {
            return TxOutcome::fail("Voting has already ended.");
        }

        match self.contract.end_voting(account).await {
            Ok(()) => {
                info!(%account, "voting ended");
                TxOutcome::ok("Voting ended successfully.")
            }
            Err(err) => TxOutcome::fail(admin_error_message(
                "Failed to end voting.",
                &err.to_string(),
            )),
        }
    }

    /// Resets an ended session: phase back to not-started, candidates kept,
    /// vote counts zeroed. Admin only.
    pub async fn reset_voting(&self, account: Address) -> TxOutcome {
        if let Err(outcome) = self.require_admin(account).await {
            return outcome;
        }
        let phase = self.voting_phase().await;
        if !phase.is_ended {
            return TxOutcome::fail("Voting must be ended before it can be reset.");
        }

        match self.contract.reset_voting(account).await {
            Ok(()) => {
                info!(%account, "voting reset");
                TxOutcome::ok("Voting has been reset successfully.")
            }
            Err(err) => TxOutcome::fail(admin_error_message(
                "Failed to reset voting.",
                &err.to_string(),
            )),
        }
    }

    /// Runs the authorization gate, folding both a negative answer and a
    /// gate failure into the normalized outcome a mutation returns.
    async fn require_admin(&self, account: Address) -> Result<(), TxOutcome> {
        match is_authorized_admin(self.contract(), account).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(TxOutcome::fail(NOT_OWNER_MESSAGE)),
            Err(err) => Err(TxOutcome::fail(err.to_string())),
        }
    }
}

fn registration_error_message(raw: &str) -> String {
    if is_user_rejection(raw) {
        return WALLET_REJECTED_MESSAGE.to_string();
    }
    if raw.contains("CIN already used") {
        return "This CIN has already been used for registration.".to_string();
    }
    if raw.contains("Already registered") {
        return "You are already registered as a voter.".to_string();
    }
    if raw.contains("Already requested") {
        return "You have already submitted a registration request.".to_string();
    }
    if let Some(reason) = revert_reason(raw) {
        return format!("Registration failed: {reason}");
    }
    format!("Failed to send registration request. ({raw})")
}

fn vote_error_message(raw: &str) -> String {
    if is_user_rejection(raw) {
        return WALLET_REJECTED_MESSAGE.to_string();
    }
    if raw.contains("Not a registered voter") {
        return "You are not registered to vote. Please request registration first.".to_string();
    }
    if raw.contains("Already voted") {
        return "You have already cast your vote.".to_string();
    }
    if raw.contains("Invalid candidate") {
        return "The candidate ID you entered is invalid.".to_string();
    }
    if raw.contains("Voting is not active") {
        return "Voting is not currently active.".to_string();
    }
    if let Some(reason) = revert_reason(raw) {
        return format!("Smart contract error: {reason}");
    }
    format!("Failed to cast vote. ({raw})")
}

fn admin_error_message(fallback: &str, raw: &str) -> String {
    if is_user_rejection(raw) {
        return WALLET_REJECTED_MESSAGE.to_string();
    }
    if raw.contains("Only owner") {
        return NOT_OWNER_MESSAGE.to_string();
    }
    if raw.contains("insufficient funds") {
        return "Your wallet has insufficient funds for this transaction.".to_string();
    }
    if let Some(reason) = revert_reason(raw) {
        return format!("Contract error: {reason}");
    }
    if raw.contains("revert") {
        return "Transaction was reverted by the contract.".to_string();
    }
    format!("{fallback} ({raw})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_messages_cover_known_reverts() {
        assert_eq!(
            registration_error_message("execution reverted: CIN already used"),
            "This CIN has already been used for registration."
        );
        assert_eq!(
            registration_error_message("execution reverted: Already requested"),
            "You have already submitted a registration request."
        );
        assert_eq!(
            registration_error_message("execution reverted: Quota exceeded"),
            "Registration failed: Quota exceeded"
        );
        assert!(registration_error_message("connection refused").contains("connection refused"));
    }

    #[test]
    fn vote_messages_cover_known_reverts() {
        assert_eq!(
            vote_error_message("execution reverted: Not a registered voter"),
            "You are not registered to vote. Please request registration first."
        );
        assert_eq!(
            vote_error_message("execution reverted: Voting is not active"),
            "Voting is not currently active."
        );
        assert_eq!(
            vote_error_message("User denied transaction signature"),
            WALLET_REJECTED_MESSAGE
        );
    }

    #[test]
    fn admin_messages_cover_known_reverts() {
        assert_eq!(
            admin_error_message("Failed to add candidate.", "execution reverted: Only owner can call this function"),
            NOT_OWNER_MESSAGE
        );
        assert_eq!(
            admin_error_message("Failed to start voting.", "insufficient funds for gas * price + value"),
            "Your wallet has insufficient funds for this transaction."
        );
        assert_eq!(
            admin_error_message("Failed to end voting.", "something odd"),
            "Failed to end voting. (something odd)"
        );
    }
}
