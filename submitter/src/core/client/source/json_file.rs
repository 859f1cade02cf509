use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::core::client::source::{RecordSource, SourceError};
use crate::types::UsageRecord;

/// Reads records from a JSON array exported by the usage query.
#[derive(Debug, Clone)]
pub struct JsonFileRecordSource {
    path: PathBuf,
}

impl JsonFileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for JsonFileRecordSource {
    async fn fetch_records(&self) -> Result<Vec<UsageRecord>, SourceError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::ReadError { path: self.path.clone(), source })?;
        let records: Vec<UsageRecord> = serde_json::from_slice(&raw)
            .map_err(|source| SourceError::ParseError { path: self.path.clone(), source })?;

        info!(records = records.len(), path = %self.path.display(), "Usage records loaded.");
        Ok(records)
    }
}
