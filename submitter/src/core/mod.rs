pub mod client;
pub mod engine;
pub mod failure_sink;
pub mod nonce;
pub mod transformer;
pub mod waiter;

use tracing::info;

pub use engine::{BatchSubmissionEngine, EngineSettings};
pub use failure_sink::FailureSink;
pub use waiter::ConfirmationPolicy;

use crate::core::client::source::RecordSource;
use crate::error::SubmitterResult;
use crate::types::RunReport;

/// Loads, transforms and submits one run of usage records.
pub async fn run_submission(source: &dyn RecordSource, engine: &BatchSubmissionEngine) -> SubmitterResult<RunReport> {
    let usage_records = source.fetch_records().await?;
    info!(log_type = "starting", category = "transform", records = usage_records.len(), "Transforming usage records.");
    let chain_records = transformer::transform_records(&usage_records)?;
    engine.submit(chain_records).await
}
