use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use color_eyre::Result;
use submitter_chain_client_interface::{
    ChainClient, ChainReceipt, ChainRecord, ReceiptStatus, SignedTransaction, TransactionParams,
};
use tracing::{debug, info, warn};
use url::Url;

pub mod clients;
pub mod conversion;
pub mod error;
pub mod types;


pub use crate::error::EthereumClientError;
use crate::conversion::encode_insert_user_history;
use crate::types::DefaultHttpProvider;

#[derive(Clone)]
pub struct EthereumChainClientValidatedArgs {
    pub rpc_url: Url,

    pub private_key: String,

    pub contract_address: Address,
}

// The signing key never reaches the logs.
impl fmt::Debug for EthereumChainClientValidatedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthereumChainClientValidatedArgs")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .finish()
    }
}

/// Parses a hex encoded secp256k1 key, with or without the `0x` prefix.
pub fn parse_private_key(private_key: &str) -> Result<PrivateKeySigner, EthereumClientError> {
    let private_key = private_key.trim();
    let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);
    if private_key.is_empty() {
        return Err(EthereumClientError::EmptyPrivateKey);
    }
    Ok(PrivateKeySigner::from_str(private_key)?)
}

pub struct EthereumChainClient {
    provider: Arc<DefaultHttpProvider>,
    wallet: EthereumWallet,
    wallet_address: Address,
    contract_address: Address,
}

impl EthereumChainClient {
    pub fn new_with_args(chain_cfg: &EthereumChainClientValidatedArgs) -> Result<Self, EthereumClientError> {
        let signer = parse_private_key(&chain_cfg.private_key)?;
        let wallet_address = signer.address();
        let wallet = EthereumWallet::from(signer);

        // Nonce, gas price and chain id are resolved by the caller, so the provider carries no fillers.
        let provider = Arc::new(DefaultHttpProvider::new_http(chain_cfg.rpc_url.clone()));

        info!(
            wallet_address = %wallet_address,
            contract_address = %chain_cfg.contract_address,
            "Ethereum chain client initialised."
        );

        Ok(EthereumChainClient { provider, wallet, wallet_address, contract_address: chain_cfg.contract_address })
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    fn build_request(&self, records: &[ChainRecord], params: &TransactionParams) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.wallet_address)
            .with_to(self.contract_address)
            .with_input(encode_insert_user_history(records))
            .with_value(U256::ZERO)
            .with_nonce(params.nonce)
            .with_chain_id(params.chain_id)
            .with_gas_limit(params.gas_limit)
            .with_gas_price(params.gas_price)
    }
}

#[async_trait]
impl ChainClient for EthereumChainClient {
    async fn get_nonce(&self) -> Result<u64> {
        let nonce = self.provider.get_transaction_count(self.wallet_address).pending().await?;
        Ok(nonce)
    }

    async fn get_gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn get_chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    /// Signs a legacy transaction calling `insertUserHistory` on the ledger contract.
    async fn sign_transaction(&self, records: Vec<ChainRecord>, params: TransactionParams) -> Result<SignedTransaction> {
        let request = self.build_request(&records, &params);
        let envelope = request.build(&self.wallet).await?;
        let tx_hash = envelope.tx_hash().to_string();
        debug!(
            tx_hash = %tx_hash,
            nonce = params.nonce,
            records = records.len(),
            "Signed usage ledger transaction."
        );
        Ok(SignedTransaction { tx_hash, raw: envelope.encoded_2718() })
    }

    async fn send_transaction(&self, tx: SignedTransaction) -> Result<Option<String>> {
        let pending_transaction = self.provider.send_raw_transaction(&tx.raw).await?;
        let accepted_hash = *pending_transaction.tx_hash();

        if accepted_hash.is_zero() {
            warn!(tx_hash = %tx.tx_hash, "Node accepted the transaction without returning a hash.");
            return Ok(None);
        }
        let accepted_hash = accepted_hash.to_string();
        if accepted_hash != tx.tx_hash {
            warn!(
                local_tx_hash = %tx.tx_hash,
                node_tx_hash = %accepted_hash,
                "Node returned a different transaction hash than the one signed locally."
            );
        }
        Ok(Some(accepted_hash))
    }

    async fn get_receipt(&self, tx_hash: &str) -> Result<Option<ChainReceipt>> {
        let tx_hash = B256::from_str(tx_hash)?;
        let maybe_receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(maybe_receipt.map(|receipt| ChainReceipt {
            tx_hash: receipt.transaction_hash.to_string(),
            status: if receipt.status() { ReceiptStatus::Success } else { ReceiptStatus::Failure },
            block_number: receipt.block_number,
        }))
    }
}
