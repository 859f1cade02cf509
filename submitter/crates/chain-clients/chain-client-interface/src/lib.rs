use alloy_primitives::U256;
use async_trait::async_trait;
use color_eyre::eyre::Result;
use mockall::automock;

/// A usage record in contract-native form, one entry of an `insertUserHistory` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRecord {
    pub user_id: String,
    pub job_id: String,
    pub duration_seconds: u64,
    /// Consumer reward scaled by 10^18.
    pub consumer_reward_fixed: U256,
    /// Content owner reward scaled by 10^18.
    pub owner_reward_fixed: U256,
}

/// Per-transaction values the caller resolves before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionParams {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub chain_id: u64,
}

/// A transaction that has been signed locally but not yet transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_hash: String,
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Failure,
}

/// The inclusion result of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
    pub tx_hash: String,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
}

impl ChainReceipt {
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Trait for every chain the usage ledger can be committed to
#[automock]
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Should return the pending transaction count of the signing account.
    async fn get_nonce(&self) -> Result<u64>;

    /// Should return the gas price suggested by the node.
    async fn get_gas_price(&self) -> Result<u128>;

    /// Should return the numeric chain identifier used for replay protection.
    async fn get_chain_id(&self) -> Result<u64>;

    /// Should encode the contract call for `records` and sign it with `params`.
    async fn sign_transaction(&self, records: Vec<ChainRecord>, params: TransactionParams) -> Result<SignedTransaction>;

    /// Should broadcast a signed transaction and return the hash the node accepted.
    /// `None` means the node answered without a transaction handle.
    async fn send_transaction(&self, tx: SignedTransaction) -> Result<Option<String>>;

    /// Should return the receipt for `tx_hash`, or `None` while it is not yet included.
    async fn get_receipt(&self, tx_hash: &str) -> Result<Option<ChainReceipt>>;
}
