use std::fmt;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};
use serde::Serialize;

use crate::error::GreeterError;

/// EIP-2718 type byte of the rollup's submit-retryable transaction
pub const SUBMIT_RETRYABLE_TX_TYPE: u8 = 0x69;

/// Number of 32-byte words preceding the calldata in an inbox retryable payload
const HEADER_WORDS: usize = 9;

const WORD: usize = 32;

/// Parameters of a retryable ticket as submitted to the L1 inbox
///
/// Decoded from the `data` field of an `InboxMessageDelivered` event. The inbox
/// packs nine words followed by the calldata of the L2 call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryableMessageParams {
    /// L2 call target
    pub dest_address: Address,

    /// Value forwarded to the L2 call
    pub l2_call_value: U256,

    /// Total value deposited on L1 (the `deposit` of the estimate)
    pub l1_value: U256,

    /// Maximum submission fee the ticket may pay
    pub max_submission_fee: U256,

    /// Receives the unused part of the deposit
    pub excess_fee_refund_address: Address,

    /// Receives the call value if the ticket is cancelled or expires
    pub call_value_refund_address: Address,

    /// L2 gas limit of the auto-redeem
    pub gas_limit: U256,

    /// L2 gas price bid of the auto-redeem
    pub max_fee_per_gas: U256,

    /// Calldata of the L2 call
    pub data: Bytes,
}

impl RetryableMessageParams {
    /// Parse the packed payload of an `InboxMessageDelivered` event
    ///
    /// # Arguments
    ///
    /// * `event_data` - The `data` field of the event
    ///
    /// # Returns
    ///
    /// * `Result<Self, GreeterError>` - Decoded parameters, or an error if the
    ///   payload is shorter than its header or than the calldata it announces
    pub fn parse(event_data: &[u8]) -> Result<Self, GreeterError> {
        let header_len = HEADER_WORDS * WORD;
        if event_data.len() < header_len {
            return Err(GreeterError::MessageData(format!(
                "payload is {} bytes, expected at least {header_len}",
                event_data.len()
            )));
        }

        let uint = |i: usize| U256::from_be_slice(word(event_data, i));
        let addr = |i: usize| Address::from_slice(&word(event_data, i)[WORD - 20..]);

        let data_length = usize::try_from(uint(8))
            .map_err(|_| GreeterError::MessageData("calldata length overflows".to_string()))?;
        let available = event_data.len() - header_len;
        if data_length > available {
            return Err(GreeterError::MessageData(format!(
                "calldata length is {data_length} but only {available} bytes follow the header"
            )));
        }

        // The calldata is the tail of the payload
        let data = Bytes::copy_from_slice(&event_data[event_data.len() - data_length..]);

        Ok(Self {
            dest_address: addr(0),
            l2_call_value: uint(1),
            l1_value: uint(2),
            max_submission_fee: uint(3),
            excess_fee_refund_address: addr(4),
            call_value_refund_address: addr(5),
            gas_limit: uint(6),
            max_fee_per_gas: uint(7),
            data,
        })
    }
}

fn word(data: &[u8], index: usize) -> &[u8] {
    &data[index * WORD..(index + 1) * WORD]
}

/// Compute the L2 hash of the transaction that creates a retryable ticket
///
/// The hash doubles as the ticket id. It is the keccak of the type byte
/// followed by the RLP list of the submit-retryable fields.
///
/// # Arguments
///
/// * `l2_chain_id` - Chain id of the rollup
/// * `message_number` - Index of the message in the bridge's delayed inbox
/// * `from` - Sender as seen on L2 (already aliased by the bridge)
/// * `l1_base_fee` - L1 base fee recorded with the message
/// * `params` - Decoded ticket parameters
pub fn retryable_creation_id(
    l2_chain_id: u64,
    message_number: U256,
    from: Address,
    l1_base_fee: U256,
    params: &RetryableMessageParams,
) -> B256 {
    let request_id = B256::from(message_number);
    let no_dest = Bytes::new();
    let dest: &dyn Encodable = if params.dest_address.is_zero() {
        &no_dest
    } else {
        &params.dest_address
    };

    let fields: [&dyn Encodable; 13] = [
        &l2_chain_id,
        &request_id,
        &from,
        &l1_base_fee,
        &params.l1_value,
        &params.max_fee_per_gas,
        &params.gas_limit,
        dest,
        &params.l2_call_value,
        &params.call_value_refund_address,
        &params.max_submission_fee,
        &params.excess_fee_refund_address,
        &params.data,
    ];

    let payload_length: usize = fields.iter().map(|field| field.length()).sum();
    let header = Header {
        list: true,
        payload_length,
    };

    let mut encoded = Vec::with_capacity(1 + header.length() + payload_length);
    encoded.push(SUBMIT_RETRYABLE_TX_TYPE);
    header.encode(&mut encoded);
    for field in fields {
        field.encode(&mut encoded);
    }

    keccak256(&encoded)
}

/// Lifecycle of an L1 to L2 retryable message as observed from L2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    /// The ticket creation has not been executed on L2 yet
    NotYetCreated = 1,
    /// The ticket creation transaction failed
    CreationFailed = 2,
    /// The ticket exists but no redeem succeeded so far
    FundsDepositedOnL2 = 3,
    /// A redeem of the ticket succeeded
    Redeemed = 4,
    /// The ticket is gone without a successful redeem
    Expired = 5,
}

impl MessageStatus {
    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::NotYetCreated => "NOT_YET_CREATED",
            MessageStatus::CreationFailed => "CREATION_FAILED",
            MessageStatus::FundsDepositedOnL2 => "FUNDS_DEPOSITED_ON_L2",
            MessageStatus::Redeemed => "REDEEMED",
            MessageStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
