use std::{collections::HashMap, time::Duration};

use alloy::{
    network::ReceiptResponse,
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::{
        json_rpc::ErrorPayload,
        types::{Filter, Log, TransactionReceipt},
    },
    sol_types::SolEvent,
};
use eyre::Result;
use tracing::{debug, info, instrument, warn};

use crate::{
    contracts::{
        ArbRetryableTx, IBridge, IInbox, ARB_RETRYABLE_TX_ADDRESS,
        L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX,
    },
    error::GreeterError,
    models::retryable::{retryable_creation_id, MessageStatus, RetryableMessageParams},
    rpc::L2Client,
};

/// A retryable ticket submitted on L1
#[derive(Debug, Clone)]
pub struct RetryableMessage {
    /// Chain id of the rollup the ticket targets
    pub l2_chain_id: u64,
    /// Index of the message in the bridge's delayed inbox
    pub message_number: U256,
    /// Sender as seen on L2 (aliased for contracts)
    pub sender: Address,
    /// L1 base fee recorded by the bridge
    pub l1_base_fee: U256,
    /// Decoded ticket parameters
    pub params: RetryableMessageParams,
    /// Ticket id, also the hash of the L2 creation transaction
    pub ticket_id: B256,
}

impl RetryableMessage {
    /// Collect the retryable tickets created by an L1 transaction
    pub fn from_receipt(
        receipt: &TransactionReceipt,
        l2_chain_id: u64,
        inbox: Address,
        bridge: Address,
    ) -> Result<Vec<Self>, GreeterError> {
        Self::from_logs(receipt.inner.logs(), l2_chain_id, inbox, bridge)
    }

    /// Collect retryable tickets from L1 logs
    ///
    /// Every `MessageDelivered` emitted by `bridge` for `inbox` with the
    /// submit-retryable kind is paired with the `InboxMessageDelivered` that
    /// `inbox` emitted for the same index. Logs of other kinds or from other
    /// contracts are ignored.
    pub fn from_logs(
        logs: &[Log],
        l2_chain_id: u64,
        inbox: Address,
        bridge: Address,
    ) -> Result<Vec<Self>, GreeterError> {
        let mut inbox_payloads = HashMap::new();
        for log in logs {
            if log.address() != inbox
                || log.topic0() != Some(&IInbox::InboxMessageDelivered::SIGNATURE_HASH)
            {
                continue;
            }
            let event = log
                .log_decode::<IInbox::InboxMessageDelivered>()
                .map_err(|e| GreeterError::MessageData(format!("InboxMessageDelivered: {e}")))?;
            inbox_payloads.insert(event.inner.data.messageNum, event.inner.data.data.clone());
        }

        let mut messages = Vec::new();
        for log in logs {
            if log.address() != bridge
                || log.topic0() != Some(&IBridge::MessageDelivered::SIGNATURE_HASH)
            {
                continue;
            }
            let delivered = log
                .log_decode::<IBridge::MessageDelivered>()
                .map_err(|e| GreeterError::MessageData(format!("MessageDelivered: {e}")))?
                .inner
                .data;
            if delivered.inbox != inbox || delivered.kind != L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX {
                continue;
            }

            let payload = inbox_payloads.get(&delivered.messageIndex).ok_or_else(|| {
                GreeterError::MessageData(format!(
                    "no inbox payload for message {}",
                    delivered.messageIndex
                ))
            })?;
            let params = RetryableMessageParams::parse(payload)?;
            let ticket_id = retryable_creation_id(
                l2_chain_id,
                delivered.messageIndex,
                delivered.sender,
                delivered.baseFeeL1,
                &params,
            );

            messages.push(Self {
                l2_chain_id,
                message_number: delivered.messageIndex,
                sender: delivered.sender,
                l1_base_fee: delivered.baseFeeL1,
                params,
                ticket_id,
            });
        }
        Ok(messages)
    }
}

/// Outcome of a retryable ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageResult {
    pub status: MessageStatus,
    /// Successful redeem transaction, set when `status` is `Redeemed`
    pub redeem_tx_hash: Option<B256>,
}

impl MessageResult {
    fn status(status: MessageStatus) -> Self {
        Self {
            status,
            redeem_tx_hash: None,
        }
    }
}

/// Follows retryable tickets on the rollup
pub struct MessageTracker<'a> {
    l2_client: &'a L2Client,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a> MessageTracker<'a> {
    pub fn new(l2_client: &'a L2Client, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            l2_client,
            poll_interval,
            timeout,
        }
    }

    /// Current status of a ticket
    #[instrument(skip_all, fields(ticket = %message.ticket_id), err)]
    pub async fn status(&self, message: &RetryableMessage) -> Result<MessageResult> {
        let provider = &self.l2_client.provider;
        let Some(creation) = provider.get_transaction_receipt(message.ticket_id).await? else {
            return Ok(MessageResult::status(MessageStatus::NotYetCreated));
        };
        if !creation.status() {
            return Ok(MessageResult::status(MessageStatus::CreationFailed));
        }

        let from_block = creation.block_number().unwrap_or_default();
        if let Some(redeem_tx_hash) = self.successful_redeem(message.ticket_id, from_block).await? {
            return Ok(MessageResult {
                status: MessageStatus::Redeemed,
                redeem_tx_hash: Some(redeem_tx_hash),
            });
        }

        if self.ticket_exists(message.ticket_id).await? {
            Ok(MessageResult::status(MessageStatus::FundsDepositedOnL2))
        } else {
            Ok(MessageResult::status(MessageStatus::Expired))
        }
    }

    /// Wait for the ticket to be created on L2, then report its status
    ///
    /// Polls the creation receipt every `poll_interval` and gives up after
    /// `timeout`.
    #[instrument(skip_all, fields(ticket = %message.ticket_id), err)]
    pub async fn wait_for_status(&self, message: &RetryableMessage) -> Result<MessageResult> {
        let provider = &self.l2_client.provider;
        let wait_for_creation = async {
            loop {
                if provider.get_transaction_receipt(message.ticket_id).await?.is_some() {
                    return Ok::<_, eyre::Report>(());
                }
                debug!("Retryable ticket not created yet, retrying in {:?}", self.poll_interval);
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        match tokio::time::timeout(self.timeout, wait_for_creation).await {
            Ok(created) => created?,
            Err(_) => {
                return Err(GreeterError::Timeout(self.timeout, message.ticket_id).into())
            }
        }
        info!("Retryable ticket {} created on L2", message.ticket_id);

        self.status(message).await
    }

    /// First successful redeem of the ticket scheduled from `from_block` on
    async fn successful_redeem(&self, ticket_id: B256, from_block: u64) -> Result<Option<B256>> {
        let provider = &self.l2_client.provider;
        let filter = Filter::new()
            .address(ARB_RETRYABLE_TX_ADDRESS)
            .event_signature(ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH)
            .topic1(ticket_id)
            .from_block(from_block);

        for log in provider.get_logs(&filter).await? {
            let scheduled = log.log_decode::<ArbRetryableTx::RedeemScheduled>()?.inner.data;
            match provider.get_transaction_receipt(scheduled.retryTxHash).await? {
                Some(receipt) if receipt.status() => return Ok(Some(scheduled.retryTxHash)),
                Some(_) => warn!("Redeem attempt {} failed", scheduled.retryTxHash),
                None => debug!("Redeem attempt {} not mined yet", scheduled.retryTxHash),
            }
        }
        Ok(None)
    }

    /// Whether the ticket is still held by ArbRetryableTx
    async fn ticket_exists(&self, ticket_id: B256) -> Result<bool> {
        let retryables = ArbRetryableTx::new(ARB_RETRYABLE_TX_ADDRESS, self.l2_client.provider.clone());
        match retryables.getTimeout(ticket_id).call().await {
            Ok(timeout) => {
                debug!("Ticket {} times out at {}", ticket_id, timeout._0);
                Ok(true)
            }
            // NoTicketWithID: the ticket is gone
            Err(alloy::contract::Error::TransportError(e))
                if e.as_error_resp().is_some_and(is_revert) =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether a JSON-RPC error reports a reverted call
///
/// Nodes answer reverted `eth_call`s with code 3 or an "execution reverted"
/// message. Any other error (rate limits, unknown blocks) says nothing about
/// the call itself.
pub fn is_revert(error: &ErrorPayload) -> bool {
    error.code == 3 || error.message.contains("revert")
}
