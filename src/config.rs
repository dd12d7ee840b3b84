//! Deployment configuration, loaded from a TOML file next to the
//! deployment scripts.

use std::path::{
    Path,
    PathBuf,
};

use alloy::primitives::Address;
use serde::Deserialize;
use thiserror::Error;

/// Errors from loading the deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything the client needs to reach a deployment: the RPC endpoint,
/// the pool contract, and the circuit artifacts for the CLI prover.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP RPC endpoint URL
    pub rpc_url: String,
    /// Deployed pool contract address
    pub pool_address: Address,
    /// Directory holding the circuit artifacts (wasm + zkey per circuit)
    pub artifacts_dir: PathBuf,
}

impl Config {
    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let raw = r#"
            rpc_url = "http://localhost:8545"
            pool_address = "0xdc64a140aa3e981100a9beca4e685f962f0cf6c9"
            artifacts_dir = "./artifacts/circuits"
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(
            config.pool_address,
            "0xdc64a140aa3e981100a9beca4e685f962f0cf6c9"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(config.artifacts_dir, PathBuf::from("./artifacts/circuits"));
    }

    #[test]
    fn test_missing_field_is_a_parse_error() {
        let raw = r#"rpc_url = "http://localhost:8545""#;
        assert!(toml::from_str::<Config>(raw).is_err());
    }
}
