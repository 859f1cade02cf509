use std::path::{Path, PathBuf};

use serde::Serialize;
use submitter_chain_client_interface::ChainRecord;
use tracing::{error, info};

pub const DEFAULT_FAILURE_ARTIFACT: &str = "failed_batches.json";

/// One entry of the failure artifact. Reward amounts stay in their 10^18 scaled form.
///
/// The field names differ from the usage export columns, so the record source
/// refuses an artifact instead of scaling its rewards a second time.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureEntry<'a> {
    user_id: &'a str,
    job_id: &'a str,
    duration_seconds: u64,
    consumer_reward_fixed: String,
    owner_reward_fixed: String,
}

impl<'a> From<&'a ChainRecord> for FailureEntry<'a> {
    fn from(record: &'a ChainRecord) -> Self {
        Self {
            user_id: &record.user_id,
            job_id: &record.job_id,
            duration_seconds: record.duration_seconds,
            consumer_reward_fixed: record.consumer_reward_fixed.to_string(),
            owner_reward_fixed: record.owner_reward_fixed.to_string(),
        }
    }
}

/// Renders records as a two-space indented JSON array terminated by a newline.
pub fn render_failure_artifact(records: &[ChainRecord]) -> serde_json::Result<String> {
    let entries: Vec<FailureEntry<'_>> = records.iter().map(FailureEntry::from).collect();
    let mut document = serde_json::to_string_pretty(&entries)?;
    document.push('\n');
    Ok(document)
}

/// Writes the records of unconfirmed batches to a well-known file for out-of-band reprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureSink {
    path: PathBuf,
}

impl Default for FailureSink {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_ARTIFACT)
    }
}

impl FailureSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the artifact with `records` and returns its path.
    /// Nothing is written for an empty set. Write errors are logged and yield `None`.
    pub async fn persist(&self, records: &[ChainRecord]) -> Option<PathBuf> {
        if records.is_empty() {
            return None;
        }

        let document = match render_failure_artifact(records) {
            Ok(document) => document,
            Err(err) => {
                error!(error = %err, "Failed to serialize failed records.");
                return None;
            }
        };

        match tokio::fs::write(&self.path, document).await {
            Ok(()) => {
                info!(records = records.len(), path = %self.path.display(), "Failed records written.");
                Some(self.path.clone())
            }
            Err(err) => {
                error!(
                    error = %err,
                    path = %self.path.display(),
                    records = records.len(),
                    "Failed to write failed records."
                );
                None
            }
        }
    }
}
