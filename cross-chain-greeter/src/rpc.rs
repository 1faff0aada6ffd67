use alloy::{
    network::{AnyNetwork, Ethereum, EthereumWallet, Network, ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{BlockId, BlockNumberOrTag},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::{Result, WrapErr};
use tracing::{debug, info, instrument};

use crate::error::GreeterError;

/// Client of the base chain
pub type L1Client = ChainClient<Ethereum>;

/// Client of the rollup; `AnyNetwork` keeps its extra transaction and receipt
/// types deserializable
pub type L2Client = ChainClient<AnyNetwork>;

/// Wallet-backed RPC client for one chain
///
/// Every transaction sent through `provider` is signed by the configured key.
#[derive(Clone)]
pub struct ChainClient<N: Network> {
    /// Typed provider with nonce, gas, chain id and wallet fillers
    pub provider: DynProvider<N>,

    /// Address of the signing key
    pub signer_address: Address,

    /// Name used in logs
    label: &'static str,
}

impl ChainClient<Ethereum> {
    /// Create a base chain client with an HTTP provider
    ///
    /// The connection is verified by fetching the latest block number.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - URL of the L1 RPC endpoint
    /// * `signer` - Key signing the L1 transactions
    pub async fn connect(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self> {
        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .network::<Ethereum>()
            .wallet(EthereumWallet::from(signer))
            .on_http(rpc_url.parse::<Url>().wrap_err_with(|| format!("bad L1 RPC URL {rpc_url}"))?);

        Self::verified(provider.erased(), signer_address, "L1").await
    }
}

impl ChainClient<AnyNetwork> {
    /// Create a rollup client with an HTTP provider
    ///
    /// The connection is verified by fetching the latest block number.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - URL of the L2 RPC endpoint
    /// * `signer` - Key signing the L2 transactions
    pub async fn connect(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self> {
        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .network::<AnyNetwork>()
            .wallet(EthereumWallet::from(signer))
            .on_http(rpc_url.parse::<Url>().wrap_err_with(|| format!("bad L2 RPC URL {rpc_url}"))?);

        Self::verified(provider.erased(), signer_address, "L2").await
    }
}

impl<N: Network> ChainClient<N> {
    async fn verified(
        provider: DynProvider<N>,
        signer_address: Address,
        label: &'static str,
    ) -> Result<Self> {
        // Test the connection by fetching the latest block number
        let block_number = provider
            .get_block_number()
            .await
            .map_err(|e| GreeterError::Rpc(format!("cannot reach {label} node: {e}")))?;
        info!("Connected to {label}! Latest block number: {block_number}");

        Ok(Self {
            provider,
            signer_address,
            label,
        })
    }

    /// Name of the chain in logs
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Fetch the latest block
    pub async fn latest_block(&self) -> Result<N::BlockResponse> {
        let maybe_block = self
            .provider
            .get_block(BlockId::Number(BlockNumberOrTag::Latest))
            .await?;

        let block = maybe_block.ok_or_else(|| eyre::eyre!("No latest block returned"))?;
        Ok(block)
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    /// Current gas price reported by the node
    pub async fn gas_price(&self) -> Result<U256> {
        Ok(U256::from(self.provider.get_gas_price().await?))
    }

    /// Deploy a contract and wait for it to be mined
    ///
    /// # Arguments
    ///
    /// * `init_code` - Creation bytecode, constructor arguments included
    ///
    /// # Returns
    ///
    /// * `Result<Address>` - Address of the created contract
    #[instrument(skip(self, init_code), fields(chain = self.label, code_len = init_code.len()), err)]
    pub async fn deploy(&self, init_code: Bytes) -> Result<Address> {
        let tx = N::TransactionRequest::default()
            .with_from(self.signer_address)
            .with_deploy_code(init_code);

        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .wrap_err_with(|| format!("sending {} deployment", self.label))?
            .get_receipt()
            .await?;
        debug!("Deployment mined in transaction {}", receipt.transaction_hash());

        confirm(&receipt, "contract deployment")?;
        let address = receipt.contract_address().ok_or_else(|| {
            GreeterError::Deployment(format!(
                "no contract address in receipt {}",
                receipt.transaction_hash()
            ))
        })?;
        Ok(address)
    }
}

impl ChainClient<Ethereum> {
    /// Base fee of the latest block
    pub async fn base_fee(&self) -> Result<U256> {
        let block = self.latest_block().await?;
        let base_fee = block
            .header
            .base_fee_per_gas
            .ok_or_else(|| GreeterError::Rpc(format!("{} block has no base fee", self.label)))?;
        Ok(U256::from(base_fee))
    }
}

/// Fail when a mined receipt reports a reverted transaction
pub fn confirm<R: ReceiptResponse>(receipt: &R, what: &str) -> Result<(), GreeterError> {
    if receipt.status() {
        Ok(())
    } else {
        Err(GreeterError::TransactionFailed {
            what: what.to_string(),
            tx_hash: receipt.transaction_hash(),
        })
    }
}
