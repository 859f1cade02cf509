use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingArgument(&'static str),

    #[error("Batch size must be greater than zero")]
    ZeroBatchSize,

    #[error("Gas limit must be greater than zero")]
    ZeroGasLimit,

    #[error("Receipt poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("Maximum confirmation attempts must be greater than zero")]
    ZeroConfirmationAttempts,

    #[error("Invalid contract address {address}: {reason}")]
    InvalidContractAddress { address: String, reason: String },
}
