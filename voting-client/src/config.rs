//! Application configuration, loaded from a TOML file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use voting_eth_adapter::EthConnectionConfig;
use voting_interface::Address;

/// Application configuration: the fixed contract address plus the node
/// connection parameters. The contract address is supplied, not discovered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Address of the deployed voting contract.
    pub contract_address: Address,
    /// Node/wallet connection parameters.
    #[serde(default)]
    pub connection: EthConnectionConfig,
}

/// Reads and parses a TOML config file.
pub fn from_toml_path<P: AsRef<Path>, R: DeserializeOwned>(path: P) -> anyhow::Result<R> {
    let mut contents = String::new();
    {
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
    }

    let result: R = toml::from_str(&contents)?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_config_from(content: &str) -> NamedTempFile {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file.write_all(content.as_bytes()).unwrap();
        config_file
    }

    #[test]
    fn test_correct_config() {
        let config = r#"
            contract_address = "0x1183338e09ecC0FD623Abf3A00346A89ac328dae"
            [connection]
            rpc_address = "http://localhost:8545/"
            poll_interval_ms = 500
        "#;

        let config_file = create_config_from(config);

        let config: AppConfig = from_toml_path(config_file.path()).unwrap();
        let expected = AppConfig {
            contract_address: "0x1183338e09ecc0fd623abf3a00346a89ac328dae"
                .parse()
                .unwrap(),
            connection: EthConnectionConfig {
                rpc_address: "http://localhost:8545/".to_string(),
                poll_interval_ms: 500,
                abi_path: None,
            },
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn test_connection_defaults() {
        let config = r#"
            contract_address = "0x1183338e09ecC0FD623Abf3A00346A89ac328dae"
        "#;

        let config_file = create_config_from(config);

        let config: AppConfig = from_toml_path(config_file.path()).unwrap();
        assert_eq!(config.connection, EthConnectionConfig::default());
    }
}
