use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use ethers_contract::BaseContract;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{TransactionRequest, H160, U256, U64};
use ethers_providers::{Http, Middleware, Provider};
use tracing::{debug, info};
use voting_interface::{Address, Candidate, VoterRecord, VotingContract};

use crate::provider::{from_eth, to_eth};

/// The contract's interface description, shipped with the client. A different
/// deployment's ABI can be loaded from disk with [`load_abi`].
const VOTING_CONTRACT_ABI: &str = include_str!("abi/voting_contract.json");

/// Reads an ABI description from a JSON file.
pub fn load_abi(path: impl AsRef<Path>) -> anyhow::Result<Abi> {
    let abi_json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&abi_json)?)
}

/// Handle to the deployed voting contract, bound to a fixed address.
///
/// Reads go through `eth_call`; writes are submitted as node-signed
/// transactions with the caller attached as sender, and a mined receipt with
/// zero status is reported as a revert. Raw node error text is passed through
/// unchanged so the client's message translation can match on it.
#[derive(Debug, Clone)]
pub struct EthVotingContract {
    provider: Arc<Provider<Http>>,
    address: H160,
    abi: BaseContract,
}

impl EthVotingContract {
    /// Binds the embedded interface description to `address`.
    pub fn new(provider: Arc<Provider<Http>>, address: Address) -> Self {
        let abi: Abi =
            serde_json::from_str(VOTING_CONTRACT_ABI).expect("embedded ABI is valid JSON");
        Self::with_abi(provider, address, abi)
    }

    /// Binds a caller-supplied interface description to `address`.
    pub fn with_abi(provider: Arc<Provider<Http>>, address: Address, abi: Abi) -> Self {
        Self {
            provider,
            address: to_eth(address),
            abi: BaseContract::from(abi),
        }
    }

    async fn call<T, D>(&self, from: Option<Address>, name: &str, args: T) -> anyhow::Result<D>
    where
        T: Tokenize + Send + Sync,
        D: Detokenize,
    {
        let data = self.abi.encode(name, args)?;
        let mut tx = TransactionRequest::new().to(self.address).data(data);
        if let Some(from) = from {
            tx = tx.from(to_eth(from));
        }
        let tx: TypedTransaction = tx.into();
        debug!(method = name, "contract read");
        let output = self.provider.call(&tx, None).await?;
        Ok(self.abi.decode_output(name, output)?)
    }

    async fn send<T>(&self, from: Address, name: &str, args: T) -> anyhow::Result<()>
    where
        T: Tokenize + Send + Sync,
    {
        let data = self.abi.encode(name, args)?;
        let tx = TransactionRequest::new()
            .to(self.address)
            .from(to_eth(from))
            .data(data);
        debug!(method = name, %from, "submitting transaction");
        let pending = self.provider.send_transaction(tx, None).await?;
        let receipt = pending
            .await?
            .ok_or_else(|| anyhow::anyhow!("transaction dropped from the mempool"))?;
        if receipt.status == Some(U64::zero()) {
            anyhow::bail!(
                "execution reverted (transaction {:?})",
                receipt.transaction_hash
            );
        }
        info!(method = name, tx_hash = ?receipt.transaction_hash, "transaction confirmed");
        Ok(())
    }
}

#[async_trait]
impl VotingContract for EthVotingContract {
    type Error = anyhow::Error;

    async fn owner(&self) -> Result<Address, Self::Error> {
        let owner: H160 = self.call(None, "owner", ()).await?;
        Ok(from_eth(owner))
    }

    async fn voter(&self, account: Address) -> Result<VoterRecord, Self::Error> {
        let (is_registered, has_requested, has_voted, vote, cin): (bool, bool, bool, U256, String) =
            self.call(None, "voters", to_eth(account)).await?;
        Ok(VoterRecord {
            is_registered,
            has_requested,
            has_voted,
            vote: vote.as_u64(),
            cin,
        })
    }

    async fn voting_started(&self) -> Result<bool, Self::Error> {
        self.call(None, "votingStarted", ()).await
    }

    async fn voting_ended(&self) -> Result<bool, Self::Error> {
        self.call(None, "votingEnded", ()).await
    }

    async fn candidates_count(&self) -> Result<u64, Self::Error> {
        let count: U256 = self.call(None, "candidatesCount", ()).await?;
        Ok(count.as_u64())
    }

    async fn candidate(&self, id: u64) -> Result<Candidate, Self::Error> {
        let (id, name, vote_count): (U256, String, U256) =
            self.call(None, "candidates", U256::from(id)).await?;
        Ok(Candidate {
            id: id.as_u64(),
            name,
            vote_count: vote_count.as_u64(),
        })
    }

    async fn registration_requests(&self, from: Address) -> Result<Vec<Address>, Self::Error> {
        let requests: Vec<H160> = self
            .call(Some(from), "getRegistrationRequests", ())
            .await?;
        Ok(requests.into_iter().map(from_eth).collect())
    }

    async fn winner(&self) -> Result<String, Self::Error> {
        self.call(None, "getWinner", ()).await
    }

    async fn cin_of(&self, from: Address, voter: Address) -> Result<String, Self::Error> {
        self.call(Some(from), "getCIN", to_eth(voter)).await
    }

    async fn request_voter_registration(
        &self,
        from: Address,
        cin: &str,
    ) -> Result<(), Self::Error> {
        self.send(from, "requestVoterRegistration", cin.to_string())
            .await
    }

    async fn vote(&self, from: Address, candidate_id: u64) -> Result<(), Self::Error> {
        self.send(from, "vote", U256::from(candidate_id)).await
    }

    async fn add_candidate(&self, from: Address, name: &str) -> Result<(), Self::Error> {
        self.send(from, "addCandidate", name.to_string()).await
    }

    async fn approve_voter(&self, from: Address, voter: Address) -> Result<(), Self::Error> {
        self.send(from, "approveVoter", to_eth(voter)).await
    }

    async fn reject_voter_request(&self, from: Address, voter: Address) -> Result<(), Self::Error> {
        self.send(from, "rejectVoterRequest", to_eth(voter)).await
    }

    async fn start_voting(&self, from: Address) -> Result<(), Self::Error> {
        self.send(from, "startVoting", ()).await
    }

    async fn end_voting(&self, from: Address) -> Result<(), Self::Error> {
        self.send(from, "endVoting", ()).await
    }

    async fn reset_voting(&self, from: Address) -> Result<(), Self::Error> {
        self.send(from, "resetVoting", ()).await
    }
}

#[cfg(test)]
mod tests {
    use ethers_core::abi::Token;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;

    const CONTRACT: Address = Address::new([0xaa; 20]);

    fn contract_at(uri: &str) -> EthVotingContract {
        let provider = Arc::new(Provider::<Http>::try_from(uri).unwrap());
        EthVotingContract::new(provider, CONTRACT)
    }

    #[test]
    fn embedded_abi_parses_and_encodes() {
        let contract = contract_at("http://localhost:8545");
        // Selector of the standard `owner()` accessor.
        let data = contract.abi.encode("owner", ()).unwrap();
        assert_eq!(&data[..4], [0x8d, 0xa5, 0xcb, 0x5b]);

        // One word of calldata after the selector.
        let data = contract.abi.encode("vote", U256::from(1)).unwrap();
        assert_eq!(data.len(), 4 + 32);
    }

    #[test]
    fn voter_record_output_decodes() {
        let contract = contract_at("http://localhost:8545");
        let encoded = ethers_core::abi::encode(&[
            Token::Bool(true),
            Token::Bool(true),
            Token::Bool(false),
            Token::Uint(U256::zero()),
            Token::String("ABC1234".to_string()),
        ]);
        let (is_registered, has_requested, has_voted, vote, cin): (bool, bool, bool, U256, String) =
            contract.abi.decode_output("voters", encoded).unwrap();
        assert!(is_registered);
        assert!(has_requested);
        assert!(!has_voted);
        assert_eq!(vote, U256::zero());
        assert_eq!(cin, "ABC1234");
    }

    #[derive(Debug, serde::Deserialize)]
    struct BasicJsonRpcRequest {
        id: u64,
        method: String,
    }

    #[tokio::test]
    async fn owner_read_goes_through_eth_call() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        let owner = Address::new([0x11; 20]);
        let result = format!("0x{:0>64}", hex::encode(owner.as_bytes()));
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(move |req: &Request| {
                let request: BasicJsonRpcRequest = serde_json::from_slice(&req.body).unwrap();
                assert_eq!(request.method, "eth_call");
                ResponseTemplate::new(200)
                    .append_header("Content-Type", "application/json")
                    .set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": request.id,
                        "result": result,
                    }))
            })
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        let contract = contract_at(&mock_server.uri());
        assert_eq!(contract.owner().await?, owner);
        Ok(())
    }

    #[tokio::test]
    async fn revert_text_is_preserved() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(|req: &Request| {
                let request: BasicJsonRpcRequest = serde_json::from_slice(&req.body).unwrap();
                ResponseTemplate::new(200)
                    .append_header("Content-Type", "application/json")
                    .set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": request.id,
                        "error": {
                            "code": 3,
                            "message": "execution reverted: Voting has not ended",
                        },
                    }))
            })
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        let contract = contract_at(&mock_server.uri());
        let err = contract.winner().await.unwrap_err();
        assert!(err.to_string().contains("Voting has not ended"));
        Ok(())
    }
}
