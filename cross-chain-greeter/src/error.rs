use std::{path::PathBuf, time::Duration};

use alloy::primitives::B256;
use thiserror::Error;

use crate::models::retryable::MessageStatus;

/// Greeter-specific error types
///
/// This enum defines the failures the demo reports itself. Errors coming out of
/// alloy are carried as `eyre` reports with context instead.
#[derive(Error, Debug)]
pub enum GreeterError {
    /// A required environment variable is unset or empty
    #[error("Error: set your '{0}' environmental variable")]
    MissingEnv(&'static str),

    /// An environment value could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A compiled contract artifact is absent
    #[error("You must compile the {layer} contract before executing this script (missing {})", path.display())]
    MissingArtifact {
        /// "L1" or "L2"
        layer: &'static str,
        /// First path found missing
        path: PathBuf,
    },

    /// An artifact exists but its contents are unusable
    #[error("Invalid artifact {}: {reason}", path.display())]
    Artifact { path: PathBuf, reason: String },

    /// Error talking to a node
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A creation transaction did not produce a contract
    #[error("Deployment failed: {0}")]
    Deployment(String),

    /// A transaction was mined but reverted
    #[error("{what} failed in transaction {tx_hash}")]
    TransactionFailed { what: String, tx_hash: B256 },

    /// Inbox message payload could not be decoded
    #[error("Malformed retryable message data: {0}")]
    MessageData(String),

    /// The L1 receipt carries no retryable ticket
    #[error("No retryable message found in L1 transaction {0}")]
    NoRetryableMessage(B256),

    /// The retryable was not created on L2 in time
    #[error("Timed out after {0:?} waiting for retryable ticket {1} on L2")]
    Timeout(Duration, B256),

    /// The message was redeemed but the L2 state does not reflect it
    #[error("Retryable ticket {status} but L2 greeting is \"{actual}\" instead of \"{expected}\"")]
    GreetingMismatch {
        status: MessageStatus,
        expected: String,
        actual: String,
    },
}
