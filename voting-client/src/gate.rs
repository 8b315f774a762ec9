//! The authorization gate run before every privileged operation.

use tracing::{debug, warn};
use voting_interface::{Address, VotingContract};

use crate::errors::VotingError;

/// Whether `account` is the contract owner.
///
/// The owner address is read fresh on every call — admin status is never
/// cached, since the active account can change at any time through the
/// wallet. Addresses compare in canonical form, so checksum case variants of
/// the owner account pass the gate. If the owner cannot be read the gate
/// fails closed: the caller gets a connectivity error, never a silent grant.
pub async fn is_authorized_admin<C: VotingContract>(
    contract: &C,
    account: Address,
) -> Result<bool, VotingError> {
    match contract.owner().await {
        Ok(owner) => {
            let is_admin = owner == account;
            debug!(%account, %owner, is_admin, "admin check");
            Ok(is_admin)
        }
        Err(err) => {
            warn!(%account, %err, "could not read contract owner for admin check");
            Err(VotingError::Connectivity(err.to_string()))
        }
    }
}
