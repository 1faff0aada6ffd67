//! Data models used throughout the application
//!
//! This module contains the data structures describing L1 to L2 retryable
//! messages and the logic to decode and identify them.

// Retryable ticket payloads, ids and statuses
pub mod retryable;
