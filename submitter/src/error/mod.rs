pub mod config;
pub mod transform;

use submitter_ethereum_chain_client::EthereumClientError;
use thiserror::Error;

use crate::core::client::secrets::SecretError;
use crate::core::client::source::SourceError;
pub use config::ConfigError;
pub use transform::{FixedPointError, TransformError};

/// Result type for submitter operations
pub type SubmitterResult<T> = Result<T, SubmitterError>;

/// Error types for the submitter. Every variant aborts the run; per-batch failures
/// are recorded in the run report instead.
#[derive(Error, Debug)]
pub enum SubmitterError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Record source error: {0}")]
    SourceError(#[from] SourceError),

    #[error("Secret store error: {0}")]
    SecretError(#[from] SecretError),

    #[error("Record transform error: {0}")]
    TransformError(#[from] TransformError),

    /// Building the chain client failed (bad signing key, ...)
    #[error("Chain client error: {0}")]
    ChainClientError(#[from] EthereumClientError),

    /// A per-run value could not be read from the chain before the first batch
    #[error("Failed to resolve {step} from the chain: {reason}")]
    ChainSetupError { step: &'static str, reason: String },

    /// Raised by the binary only when partial failure is configured as fatal
    #[error("{failed} of {total} batches were not confirmed")]
    PartialFailure { failed: usize, total: usize },
}
