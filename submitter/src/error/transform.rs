use bigdecimal::BigDecimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    #[error("value {0} is negative and cannot be stored as uint256")]
    Negative(BigDecimal),

    #[error("value {0} exceeds the uint256 range once scaled by 10^18")]
    Overflow(BigDecimal),
}

/// A usage record holds a reward the contract cannot represent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record {index} (user {user_id}, job {job_id}) has an invalid {field}: {source}")]
pub struct TransformError {
    pub index: usize,
    pub user_id: String,
    pub job_id: String,
    pub field: &'static str,
    #[source]
    pub source: FixedPointError,
}
