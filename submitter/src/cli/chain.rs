use std::fmt;

use clap::Args;
use url::Url;

use crate::core::engine::DEFAULT_GAS_LIMIT;

#[derive(Clone, Args)]
pub struct ChainCliArgs {
    /// The URL of the chain's JSON-RPC node.
    #[arg(env = "USAGE_SUBMITTER_RPC_URL", long)]
    pub rpc_url: Option<Url>,

    /// The hex encoded private key of the signing account, with or without `0x`.
    /// Resolved from the secret store when omitted.
    #[arg(env = "USAGE_SUBMITTER_PRIVATE_KEY", long, hide_env_values = true)]
    pub private_key: Option<String>,

    /// The address of the usage ledger contract.
    #[arg(env = "USAGE_SUBMITTER_CONTRACT_ADDRESS", long)]
    pub contract_address: Option<String>,

    /// Gas limit of every batch transaction.
    #[arg(env = "USAGE_SUBMITTER_GAS_LIMIT", long, default_value_t = DEFAULT_GAS_LIMIT)]
    pub gas_limit: u64,
}

// The signing key never reaches the logs.
impl fmt::Debug for ChainCliArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCliArgs")
            .field("rpc_url", &self.rpc_url.as_ref().map(Url::as_str))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("contract_address", &self.contract_address)
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}
