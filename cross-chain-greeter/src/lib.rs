// Export modules for the binary and the integration tests
pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod error;
pub mod estimator;
pub mod greeter;
pub mod logging;
pub mod message;
pub mod models;
pub mod rpc;
