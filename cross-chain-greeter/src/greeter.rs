//! The cross-chain greeter walkthrough
//!
//! Deploys GreeterL1 and GreeterL2, links them, then updates the L2 greeting
//! from L1 through a retryable ticket and reads it back.

use std::sync::Arc;

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, SolConstructor},
};
use eyre::{Result, WrapErr};
use tracing::{debug, info, instrument, warn};

use crate::{
    artifacts::Artifacts,
    config::Config,
    contracts::{
        apply_l1_to_l2_alias, ArbWasm, GreeterL1, GreeterL2, IInbox, ARB_WASM_ADDRESS,
    },
    error::GreeterError,
    estimator::{
        GasLimitOverride, GasOverrides, PercentIncrease, RetryableGasEstimator, RetryableRequest,
    },
    logging,
    message::{MessageTracker, RetryableMessage},
    models::retryable::MessageStatus,
    rpc::{confirm, L1Client, L2Client},
};

/// Greeting the L1 greeter is deployed with
pub const INITIAL_L1_GREETING: &str = "Hello world in L1";

/// Greeting sent from L1 to L2
pub const NEW_GREETING: &str = "Greeting from far, far away";

/// What a completed run observed
#[derive(Debug, Clone)]
pub struct GreetingOutcome {
    pub l1_greeter: Address,
    pub l2_greeter: Address,
    pub status: MessageStatus,
    pub l2_greeting: String,
}

/// Overrides used for the demo's ticket: a 30% buffer on everything and a
/// floor of 10000 gas
pub fn demo_gas_overrides() -> GasOverrides {
    GasOverrides {
        gas_limit: GasLimitOverride {
            base: None,
            min: Some(U256::from(10_000)),
            percent_increase: Some(U256::from(30)),
        },
        max_submission_fee: PercentIncrease {
            base: None,
            percent_increase: Some(U256::from(30)),
        },
        max_fee_per_gas: PercentIncrease {
            base: None,
            percent_increase: Some(U256::from(30)),
        },
        deposit: None,
    }
}

/// Run the whole walkthrough
///
/// # Arguments
///
/// * `config` - Endpoints, key and polling settings
/// * `artifacts` - Compiled greeters
///
/// # Returns
///
/// * `Result<GreetingOutcome>` - Deployed addresses, final ticket status and
///   the L2 greeting read back at the end
pub async fn run(config: &Config, artifacts: &Artifacts) -> Result<GreetingOutcome> {
    logging::banner("Cross-chain Greeter");

    let l1_client = L1Client::connect(&config.l1_rpc_url, config.signer.clone()).await?;
    let l2_client = Arc::new(L2Client::connect(&config.l2_rpc_url, config.signer.clone()).await?);

    let bridge = IInbox::new(config.inbox_address, l1_client.provider.clone())
        .bridge()
        .call()
        .await
        .wrap_err("reading the bridge address from the inbox")?
        ._0;
    debug!("Using inbox {} and bridge {}", config.inbox_address, bridge);

    logging::title("Deploy contracts");
    let (l1_greeter, l2_greeter) = deploy_greeters(&l1_client, &l2_client, config, artifacts).await?;

    activate_program(&l2_client, l2_greeter).await;

    link_greeters(&l1_client, &l2_client, l1_greeter, l2_greeter).await?;

    logging::title("Setting a new L2 greeting, by sending it from L1");
    let l2_greeter_contract = GreeterL2::new(l2_greeter, l2_client.provider.clone());
    let current_greeting = l2_greeter_contract.greet().call().await?._0;
    info!("Current L2 greeting: \"{}\"", current_greeting);

    let status = send_greeting(
        &l1_client,
        l2_client.clone(),
        config,
        bridge,
        l1_greeter,
        l2_greeter,
    )
    .await?;

    // GreeterL2 only accepts the greeting from the alias of GreeterL1
    debug!("L1 greeter acts on L2 as {}", apply_l1_to_l2_alias(l1_greeter));

    let l2_greeting = l2_greeter_contract.greet().call().await?._0;
    info!("Updated L2 greeting: \"{}\"", l2_greeting);

    check_greeting(status, NEW_GREETING, &l2_greeting)?;

    Ok(GreetingOutcome {
        l1_greeter,
        l2_greeter,
        status,
        l2_greeting,
    })
}

/// Fail when a redeemed ticket did not leave `expected` as the L2 greeting
///
/// Any other status means the greeting was never applied, so there is nothing
/// to compare.
pub fn check_greeting(
    status: MessageStatus,
    expected: &str,
    actual: &str,
) -> Result<(), GreeterError> {
    if status == MessageStatus::Redeemed && actual != expected {
        return Err(GreeterError::GreetingMismatch {
            status,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Deploy GreeterL1 on L1 and GreeterL2 on L2
#[instrument(skip_all, err)]
async fn deploy_greeters(
    l1_client: &L1Client,
    l2_client: &L2Client,
    config: &Config,
    artifacts: &Artifacts,
) -> Result<(Address, Address)> {
    let constructor_args = GreeterL1::constructorCall {
        _greeting: INITIAL_L1_GREETING.to_string(),
        _l2Target: Address::ZERO,
        _inbox: config.inbox_address,
    }
    .abi_encode();
    let l1_init_code: Bytes = [artifacts.l1.bytecode.as_ref(), constructor_args.as_slice()]
        .concat()
        .into();

    let l1_greeter = l1_client
        .deploy(l1_init_code)
        .await
        .wrap_err("deploying GreeterL1")?;
    info!("L1 Greeter deployed to {}", l1_greeter);

    let l2_greeter = l2_client
        .deploy(artifacts.l2.init_code.clone())
        .await
        .wrap_err("deploying GreeterL2")?;
    info!("L2 Greeter deployed to {}", l2_greeter);

    Ok((l1_greeter, l2_greeter))
}

/// Activate the Stylus program
///
/// Activation fails when the same bytecode was activated before, which is
/// harmless, so failures are only logged.
async fn activate_program(l2_client: &L2Client, program: Address) {
    let arb_wasm = ArbWasm::new(ARB_WASM_ADDRESS, l2_client.provider.clone());
    let activation = async {
        let receipt = arb_wasm
            .activateProgram(program)
            .send()
            .await?
            .get_receipt()
            .await?;
        confirm(&receipt, "program activation")?;
        Ok::<_, eyre::Report>(())
    };

    match activation.await {
        Ok(()) => info!("L2 Greeter program successfully activated"),
        Err(e) => {
            debug!("Activation error: {:#}", e);
            info!("L2 Greeter program is already activated");
        }
    }
}

/// Point each greeter at its counterpart
#[instrument(skip(l1_client, l2_client), err)]
async fn link_greeters(
    l1_client: &L1Client,
    l2_client: &L2Client,
    l1_greeter: Address,
    l2_greeter: Address,
) -> Result<()> {
    let receipt = GreeterL1::new(l1_greeter, l1_client.provider.clone())
        .updateL2Target(l2_greeter)
        .send()
        .await?
        .get_receipt()
        .await?;
    confirm(&receipt, "GreeterL1.updateL2Target")?;

    let receipt = GreeterL2::new(l2_greeter, l2_client.provider.clone())
        .updateL1Target(l1_greeter)
        .send()
        .await?
        .get_receipt()
        .await?;
    confirm(&receipt, "GreeterL2.updateL1Target")?;

    info!("Counterpart contract addresses set in both greeters");
    Ok(())
}

/// Submit the new greeting on L1 and follow the resulting ticket on L2
async fn send_greeting(
    l1_client: &L1Client,
    l2_client: Arc<L2Client>,
    config: &Config,
    bridge: Address,
    l1_greeter: Address,
    l2_greeter: Address,
) -> Result<MessageStatus> {
    // The ticket's size depends on the calldata of the L2 call
    let calldata = GreeterL2::setGreetingCall {
        greeting: NEW_GREETING.to_string(),
    }
    .abi_encode();

    let request = RetryableRequest {
        from: l1_greeter,
        to: l2_greeter,
        l2_call_value: U256::ZERO,
        excess_fee_refund_address: l2_client.signer_address,
        call_value_refund_address: l2_client.signer_address,
        data: calldata.into(),
    };

    let estimator = RetryableGasEstimator::new(l2_client.clone());
    let l1_base_fee = l1_client.base_fee().await?;
    let gas_params = estimator
        .estimate_all(
            &request,
            l1_base_fee,
            l1_client,
            config.inbox_address,
            &demo_gas_overrides(),
        )
        .await?;
    info!(
        "Current retryable base submission price is: {}",
        gas_params.max_submission_cost
    );

    let gas_price_bid = l2_client.gas_price().await?;
    info!("L2 gas price: {}", gas_price_bid);

    info!(
        "Sending greeting to L2 with {} callValue for L2 fees",
        gas_params.deposit
    );
    let receipt = GreeterL1::new(l1_greeter, l1_client.provider.clone())
        .setGreetingInL2(
            NEW_GREETING.to_string(),
            gas_params.max_submission_cost,
            gas_params.gas_limit,
            gas_price_bid,
        )
        .value(gas_params.deposit)
        .send()
        .await?
        .get_receipt()
        .await?;
    confirm(&receipt, "GreeterL1.setGreetingInL2")?;
    info!("Greeting txn confirmed on L1: {}", receipt.transaction_hash);

    let l2_chain_id = l2_client.chain_id().await?;
    let message = RetryableMessage::from_receipt(&receipt, l2_chain_id, config.inbox_address, bridge)?
        .into_iter()
        .next()
        .ok_or(GreeterError::NoRetryableMessage(receipt.transaction_hash))?;
    debug!(
        "Retryable ticket {} with params {}",
        message.ticket_id,
        serde_json::to_string(&message.params)?
    );

    info!("Waiting for the L2 execution of the transaction. This may take up to 10-15 minutes.");
    let tracker = MessageTracker::new(&l2_client, config.poll_interval, config.message_timeout);
    let result = tracker.wait_for_status(&message).await?;

    match (result.status, result.redeem_tx_hash) {
        (MessageStatus::Redeemed, Some(redeem_tx_hash)) => {
            info!("L2 retryable ticket is executed: {}", redeem_tx_hash)
        }
        (status, _) => warn!("L2 retryable ticket failed with status {}", status),
    }

    Ok(result.status)
}
