use alloy::signers::local::LocalSignerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EthereumClientError {
    #[error("Invalid signing key: {0}")]
    InvalidPrivateKey(#[from] LocalSignerError),

    #[error("Signing key is empty")]
    EmptyPrivateKey,
}
