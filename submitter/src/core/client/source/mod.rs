pub mod error;
pub mod json_file;

use async_trait::async_trait;
pub use error::SourceError;
pub use json_file::JsonFileRecordSource;

use crate::types::UsageRecord;

/// Trait defining where computed usage records come from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns every record of the run, in the order they should be committed.
    async fn fetch_records(&self) -> Result<Vec<UsageRecord>, SourceError>;
}
