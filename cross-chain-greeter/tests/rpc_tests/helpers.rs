use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::Duration;

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, B256, U256},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use cross_chain_greeter::{
    contracts::{ArbRetryableTx, ARB_RETRYABLE_TX_ADDRESS},
    rpc::L1Client,
};

/// First prefunded anvil account
pub const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Creation code returning a 10 byte runtime that returns 42
pub const RETURN_42_INIT_CODE: &str = "0x600a600c600039600a6000f3602a60005260206000f3";

/// Creation code that reverts
pub const REVERTING_INIT_CODE: &str = "0x60006000fd";

/// ArbRetryableTx stand-in whose `getTimeout` answers 1
///
/// A call with exactly 128 bytes of calldata logs them as four topics with 128
/// zero bytes of data instead.
pub const RETRYABLES_WITH_TICKET: &str =
    "0x36608014601157600160005260206000f35b6080600060003760605160405160205160005160806080a400";

/// ArbRetryableTx stand-in whose `getTimeout` reverts, logging like
/// [`RETRYABLES_WITH_TICKET`]
pub const RETRYABLES_WITHOUT_TICKET: &str =
    "0x36608014600c5760006000fd5b6080600060003760605160405160205160005160806080a400";

/// Anvil process killed on drop
pub struct Anvil {
    child: Child,
    pub rpc_url: String,
}

impl Drop for Anvil {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Spawns an Anvil process on a free port.
///
/// # Panics
///
/// Panics if it fails to bind to a free port or spawn Anvil.
pub fn spawn_anvil() -> Anvil {
    // Bind to a free port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Could not bind to port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let rpc_url = format!("http://127.0.0.1:{}", port);

    let child = Command::new("anvil")
        .arg("-p")
        .arg(port.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn anvil");

    // Wait a moment to ensure Anvil is up and running
    sleep(Duration::from_secs(1));

    Anvil { child, rpc_url }
}

pub fn signer() -> PrivateKeySigner {
    ANVIL_KEY.parse().expect("valid anvil key")
}

/// Replace the code at `address`
pub async fn set_code(client: &L1Client, address: Address, code: &str) {
    let code: Bytes = code.parse().unwrap();
    client
        .provider
        .raw_request::<_, serde_json::Value>("anvil_setCode".into(), (address, code))
        .await
        .expect("anvil_setCode");
}

async fn mined(client: &L1Client, tx: TransactionRequest) -> TransactionReceipt {
    client
        .provider
        .send_transaction(tx.with_from(client.signer_address))
        .await
        .expect("transaction sent")
        .get_receipt()
        .await
        .expect("transaction mined")
}

/// Hash of a mined, successful value transfer
pub async fn successful_tx(client: &L1Client) -> B256 {
    let tx = TransactionRequest::default()
        .with_to(Address::repeat_byte(0x42))
        .with_value(U256::from(1));
    let receipt = mined(client, tx).await;
    assert!(receipt.status());
    receipt.transaction_hash
}

/// Hash of a mined, reverted contract creation
pub async fn reverted_tx(client: &L1Client) -> B256 {
    let gas_price = client.provider.get_gas_price().await.unwrap();
    // Explicit gas skips estimation, which would refuse a reverting call
    let tx = TransactionRequest::default()
        .with_deploy_code(REVERTING_INIT_CODE.parse::<Bytes>().unwrap())
        .with_gas_limit(100_000)
        .with_gas_price(gas_price * 2);
    let receipt = mined(client, tx).await;
    assert!(!receipt.status());
    receipt.transaction_hash
}

/// Have the stand-in at the ArbRetryableTx address log `RedeemScheduled`
pub async fn schedule_redeem(client: &L1Client, ticket_id: B256, retry_tx_hash: B256) {
    let mut topics = Vec::with_capacity(128);
    topics.extend_from_slice(ArbRetryableTx::RedeemScheduled::SIGNATURE_HASH.as_slice());
    topics.extend_from_slice(ticket_id.as_slice());
    topics.extend_from_slice(retry_tx_hash.as_slice());
    topics.extend_from_slice(B256::with_last_byte(1).as_slice());

    let tx = TransactionRequest::default()
        .with_to(ARB_RETRYABLE_TX_ADDRESS)
        .with_input(Bytes::from(topics));
    let receipt = mined(client, tx).await;
    assert!(receipt.status());
    assert_eq!(receipt.inner.logs().len(), 1);
}
