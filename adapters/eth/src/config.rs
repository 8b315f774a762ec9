use std::path::PathBuf;

/// Runtime configuration for the node connection.
///
/// No request timeout is configured on purpose: the only bound on a remote
/// call is whatever the wallet side imposes, such as the user dismissing a
/// transaction prompt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct EthConnectionConfig {
    /// The address of the JSON-RPC node
    #[serde(default = "default_rpc_addr")]
    pub rpc_address: String,
    /// Interval for transaction-confirmation and session-event polling, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Optional path to an ABI file overriding the embedded one
    #[serde(default)]
    pub abi_path: Option<PathBuf>,
}

fn default_rpc_addr() -> String {
    "http://localhost:8545/".into()
}

const fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for EthConnectionConfig {
    fn default() -> Self {
        Self {
            rpc_address: default_rpc_addr(),
            poll_interval_ms: default_poll_interval_ms(),
            abi_path: None,
        }
    }
}
