use alloy::primitives::{utils::parse_ether, Address, Bytes, U256};
use eyre::Result;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::{
    contracts::{IInbox, NodeInterface, NODE_INTERFACE_ADDRESS},
    error::GreeterError,
    rpc::{L1Client, L2Client},
};

/// Default increase applied to the submission fee (300%)
pub const DEFAULT_SUBMISSION_FEE_PERCENT_INCREASE: u64 = 300;

/// Default increase applied to the L2 gas price (500%)
pub const DEFAULT_GAS_PRICE_PERCENT_INCREASE: u64 = 500;

/// Default increase applied to the L2 gas limit
pub const DEFAULT_GAS_LIMIT_PERCENT_INCREASE: u64 = 0;

/// Plain override of one estimated value
///
/// When `base` is set the remote estimate is skipped and `base` is used instead.
/// `percent_increase` is always applied on top.
#[derive(Debug, Clone, Default)]
pub struct PercentIncrease {
    pub base: Option<U256>,
    pub percent_increase: Option<U256>,
}

/// Override of the gas limit, which can also be floored
#[derive(Debug, Clone, Default)]
pub struct GasLimitOverride {
    pub base: Option<U256>,
    pub min: Option<U256>,
    pub percent_increase: Option<U256>,
}

/// Overrides for [`RetryableGasEstimator::estimate_all`]
#[derive(Debug, Clone, Default)]
pub struct GasOverrides {
    pub gas_limit: GasLimitOverride,
    pub max_submission_fee: PercentIncrease,
    pub max_fee_per_gas: PercentIncrease,
    /// Replaces the computed deposit entirely
    pub deposit: Option<U256>,
}

/// An L1 to L2 call whose costs need estimating
#[derive(Debug, Clone)]
pub struct RetryableRequest {
    /// L1 sender of the message
    pub from: Address,
    /// L2 call target
    pub to: Address,
    /// Value forwarded to the L2 call
    pub l2_call_value: U256,
    pub excess_fee_refund_address: Address,
    pub call_value_refund_address: Address,
    /// Calldata of the L2 call
    pub data: Bytes,
}

/// Values to submit a retryable ticket with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableGasParams {
    /// L2 gas limit of the auto-redeem
    pub gas_limit: U256,
    /// Maximum fee to pay for the ticket submission
    pub max_submission_cost: U256,
    /// L2 gas price the deposit was computed with
    pub max_fee_per_gas: U256,
    /// Total value to send with the L1 transaction
    pub deposit: U256,
}

/// Increase `value` by `percent` percent
pub fn percent_increase(value: U256, percent: U256) -> U256 {
    value + value * percent / U256::from(100)
}

/// Gas and fee estimator for retryable tickets
///
/// The numbers themselves come from the chains: the submission fee from the
/// rollup inbox on L1, the gas limit from the rollup's NodeInterface and the
/// gas price from the L2 node. This type only combines them with overrides.
#[derive(Clone)]
pub struct RetryableGasEstimator {
    /// Rollup client
    pub l2_client: Arc<L2Client>,
}

impl RetryableGasEstimator {
    /// Creates a new estimator querying the given rollup
    pub fn new(l2_client: Arc<L2Client>) -> Self {
        Self { l2_client }
    }

    /// Maximum submission fee of a ticket carrying `data_length` bytes
    ///
    /// # Arguments
    ///
    /// * `l1_client` - Base chain client
    /// * `inbox` - Rollup inbox on L1
    /// * `data_length` - Length of the L2 calldata
    /// * `l1_base_fee` - Base fee the fee is computed against
    /// * `options` - Override of the estimate
    #[instrument(skip(self, l1_client, options), err)]
    pub async fn estimate_submission_fee(
        &self,
        l1_client: &L1Client,
        inbox: Address,
        data_length: usize,
        l1_base_fee: U256,
        options: &PercentIncrease,
    ) -> Result<U256> {
        let base = match options.base {
            Some(base) => base,
            None => {
                IInbox::new(inbox, l1_client.provider.clone())
                    .calculateRetryableSubmissionFee(U256::from(data_length), l1_base_fee)
                    .call()
                    .await?
                    ._0
            }
        };
        let increase = options
            .percent_increase
            .unwrap_or(U256::from(DEFAULT_SUBMISSION_FEE_PERCENT_INCREASE));
        debug!("Submission fee base: {}, increase: {}%", base, increase);

        Ok(percent_increase(base, increase))
    }

    /// L2 gas price bid for the auto-redeem
    #[instrument(skip(self, options), err)]
    pub async fn estimate_max_fee_per_gas(&self, options: &PercentIncrease) -> Result<U256> {
        let base = match options.base {
            Some(base) => base,
            None => self.l2_client.gas_price().await?,
        };
        let increase = options
            .percent_increase
            .unwrap_or(U256::from(DEFAULT_GAS_PRICE_PERCENT_INCREASE));
        debug!("Max fee per gas base: {}, increase: {}%", base, increase);

        Ok(percent_increase(base, increase))
    }

    /// L2 gas limit the ticket's auto-redeem needs
    ///
    /// The rollup estimates the whole ticket execution when asked to estimate
    /// a call to `NodeInterface.estimateRetryableTicket`.
    ///
    /// # Arguments
    ///
    /// * `request` - The L1 to L2 call
    /// * `sender_deposit` - Deposit the estimate assumes, defaults to 1 ether
    ///   plus the L2 call value
    /// * `options` - Override of the estimate
    #[instrument(skip(self, request, options), err)]
    pub async fn estimate_gas_limit(
        &self,
        request: &RetryableRequest,
        sender_deposit: Option<U256>,
        options: &GasLimitOverride,
    ) -> Result<U256> {
        let base = match options.base {
            Some(base) => base,
            None => {
                let deposit = match sender_deposit {
                    Some(deposit) => deposit,
                    None => parse_ether("1")? + request.l2_call_value,
                };
                let node_interface =
                    NodeInterface::new(NODE_INTERFACE_ADDRESS, self.l2_client.provider.clone());
                let gas = node_interface
                    .estimateRetryableTicket(
                        request.from,
                        deposit,
                        request.to,
                        request.l2_call_value,
                        request.excess_fee_refund_address,
                        request.call_value_refund_address,
                        request.data.clone(),
                    )
                    .estimate_gas()
                    .await
                    .map_err(|e| {
                        error!("Retryable ticket estimation failed with error: {}", e);
                        GreeterError::Rpc(format!("estimateRetryableTicket failed: {e}"))
                    })?;
                U256::from(gas)
            }
        };
        let increase = options
            .percent_increase
            .unwrap_or(U256::from(DEFAULT_GAS_LIMIT_PERCENT_INCREASE));
        let min = options.min.unwrap_or(U256::ZERO);
        debug!("Gas limit base: {}, increase: {}%, min: {}", base, increase, min);

        Ok(percent_increase(base, increase).max(min))
    }

    /// Estimate every value needed to submit a retryable ticket
    ///
    /// # Arguments
    ///
    /// * `request` - The L1 to L2 call
    /// * `l1_base_fee` - Current L1 base fee
    /// * `l1_client` - Base chain client
    /// * `inbox` - Rollup inbox on L1
    /// * `overrides` - Values replacing or adjusting the estimates
    ///
    /// # Returns
    ///
    /// * `Result<RetryableGasParams>` - Gas limit, submission cost, fee per gas
    ///   and the deposit covering all of them plus the call value
    #[instrument(skip_all, fields(to = %request.to), err)]
    pub async fn estimate_all(
        &self,
        request: &RetryableRequest,
        l1_base_fee: U256,
        l1_client: &L1Client,
        inbox: Address,
        overrides: &GasOverrides,
    ) -> Result<RetryableGasParams> {
        let max_fee_per_gas = self
            .estimate_max_fee_per_gas(&overrides.max_fee_per_gas)
            .await?;
        let max_submission_cost = self
            .estimate_submission_fee(
                l1_client,
                inbox,
                request.data.len(),
                l1_base_fee,
                &overrides.max_submission_fee,
            )
            .await?;
        let gas_limit = self
            .estimate_gas_limit(request, None, &overrides.gas_limit)
            .await?;

        let deposit = overrides.deposit.unwrap_or_else(|| {
            total_deposit(gas_limit, max_fee_per_gas, max_submission_cost, request.l2_call_value)
        });

        Ok(RetryableGasParams {
            gas_limit,
            max_submission_cost,
            max_fee_per_gas,
            deposit,
        })
    }
}

/// Value an L1 sender must deposit to fund the ticket and its auto-redeem
pub fn total_deposit(
    gas_limit: U256,
    max_fee_per_gas: U256,
    max_submission_cost: U256,
    l2_call_value: U256,
) -> U256 {
    gas_limit * max_fee_per_gas + max_submission_cost + l2_call_value
}
