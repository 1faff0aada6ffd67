use std::{env, path::PathBuf, str::FromStr, time::Duration};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use serde::Deserialize;
use tracing::info;

use crate::error::GreeterError;

/// Environment variables that must be set before anything else happens,
/// checked in this order
pub const REQUIRED_ENV_VARS: [&str; 3] = ["PRIVATE_KEY", "L2RPC", "L1RPC"];

/// Inbox of the default local nitro dev node
pub const DEFAULT_INBOX_ADDRESS: &str = "0xff4a24b22f94979e9ba5f3eb35838aa814bad6f1";

/// Foundry output of the L1 greeter
pub const DEFAULT_L1_ARTIFACT: &str = "./l1/out/GreeterL1.sol/GreeterL1.json";

/// Init code written by `cargo stylus` for the L2 greeter
pub const DEFAULT_L2_BYTECODE: &str = "./l2/out/deployment_tx_data";

/// Solidity interface exported for the L2 greeter
pub const DEFAULT_L2_ABI: &str = "./l2/out/abi";

/// Optional settings, layered from the environment over defaults
#[derive(Debug, Deserialize)]
struct Settings {
    inbox_address: String,
    l1_artifact: PathBuf,
    l2_bytecode: PathBuf,
    l2_abi: PathBuf,
    poll_interval_ms: u64,
    message_timeout_secs: u64,
}

/// Paths of the compiled contracts
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub l1_artifact: PathBuf,
    pub l2_bytecode: PathBuf,
    pub l2_abi: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            l1_artifact: PathBuf::from(DEFAULT_L1_ARTIFACT),
            l2_bytecode: PathBuf::from(DEFAULT_L2_BYTECODE),
            l2_abi: PathBuf::from(DEFAULT_L2_ABI),
        }
    }
}

/// Demo configuration
///
/// Holds the signer used on both chains, the two RPC endpoints and the knobs
/// of the retryable status polling.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key used to sign on both L1 and L2
    pub signer: PrivateKeySigner,

    /// L1 RPC endpoint URL
    pub l1_rpc_url: String,

    /// L2 RPC endpoint URL
    pub l2_rpc_url: String,

    /// Delayed inbox of the rollup on L1
    pub inbox_address: Address,

    /// Where the compiled contracts are read from
    pub artifacts: ArtifactPaths,

    /// Delay between two lookups of the retryable creation receipt
    pub poll_interval: Duration,

    /// How long to wait for the retryable to show up on L2
    pub message_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A `.env` file is read first when present. The required variables are
    /// checked before anything is parsed, so a missing one is always reported
    /// by name.
    ///
    /// # Environment Variables
    ///
    /// * `PRIVATE_KEY` - Hex private key of the account used on both chains
    /// * `L2RPC` - L2 RPC URL
    /// * `L1RPC` - L1 RPC URL
    /// * `INBOX_ADDRESS` - Rollup inbox on L1 (default: local dev node inbox)
    /// * `L1_ARTIFACT`, `L2_BYTECODE`, `L2_ABI` - Artifact paths
    /// * `POLL_INTERVAL_MS` - Status polling interval (default: 1000)
    /// * `MESSAGE_TIMEOUT_SECS` - Status polling timeout (default: 1800)
    pub fn from_env() -> Result<Self, GreeterError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv();

        require_env_vars(&REQUIRED_ENV_VARS)?;

        let signer = PrivateKeySigner::from_str(env_var("PRIVATE_KEY")?.trim())
            .map_err(|e| GreeterError::Config(format!("PRIVATE_KEY is not a valid key: {e}")))?;

        let settings = load_settings()?;
        let inbox_address = Address::from_str(&settings.inbox_address).map_err(|e| {
            GreeterError::Config(format!(
                "INBOX_ADDRESS {} is not an address: {e}",
                settings.inbox_address
            ))
        })?;

        Ok(Config {
            signer,
            l1_rpc_url: env_var("L1RPC")?,
            l2_rpc_url: env_var("L2RPC")?,
            inbox_address,
            artifacts: ArtifactPaths {
                l1_artifact: settings.l1_artifact,
                l2_bytecode: settings.l2_bytecode,
                l2_abi: settings.l2_abi,
            },
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            message_timeout: Duration::from_secs(settings.message_timeout_secs),
        })
    }
}

/// Checks that every listed variable is set to a non-empty value
pub fn require_env_vars(names: &[&'static str]) -> Result<(), GreeterError> {
    for name in names {
        env_var(*name)?;
    }
    info!("Environmental variables properly set");
    Ok(())
}

fn env_var(name: &'static str) -> Result<String, GreeterError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(GreeterError::MissingEnv(name)),
    }
}

fn load_settings() -> Result<Settings, GreeterError> {
    let to_config_err = |e: ::config::ConfigError| GreeterError::Config(e.to_string());

    ::config::Config::builder()
        .set_default("inbox_address", DEFAULT_INBOX_ADDRESS)
        .and_then(|b| b.set_default("l1_artifact", DEFAULT_L1_ARTIFACT))
        .and_then(|b| b.set_default("l2_bytecode", DEFAULT_L2_BYTECODE))
        .and_then(|b| b.set_default("l2_abi", DEFAULT_L2_ABI))
        .and_then(|b| b.set_default("poll_interval_ms", 1000_i64))
        .and_then(|b| b.set_default("message_timeout_secs", 1800_i64))
        .map_err(to_config_err)?
        .add_source(::config::Environment::default())
        .build()
        .map_err(to_config_err)?
        .try_deserialize()
        .map_err(to_config_err)
}
