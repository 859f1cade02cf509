use std::num::NonZeroUsize;
use std::sync::Arc;

use color_eyre::Report;
use submitter_chain_client_interface::{ChainClient, ChainRecord, TransactionParams};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::core::failure_sink::FailureSink;
use crate::core::nonce::NonceSequencer;
use crate::core::waiter::{ConfirmationPolicy, ConfirmationWaiter, WaitOutcome};
use crate::error::{ConfigError, SubmitterError, SubmitterResult};
use crate::types::{partition, Batch, BatchOutcome, RunReport, TransactionAttempt};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;

/// Validated knobs of a submission run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub batch_size: NonZeroUsize,
    pub gas_limit: u64,
    pub confirmation: ConfirmationPolicy,
}

impl EngineSettings {
    pub fn new(batch_size: usize, gas_limit: u64, confirmation: ConfirmationPolicy) -> Result<Self, ConfigError> {
        let batch_size = NonZeroUsize::new(batch_size).ok_or(ConfigError::ZeroBatchSize)?;
        if gas_limit == 0 {
            return Err(ConfigError::ZeroGasLimit);
        }
        if confirmation.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if confirmation.max_attempts == Some(0) {
            return Err(ConfigError::ZeroConfirmationAttempts);
        }
        Ok(Self { batch_size, gas_limit, confirmation })
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            gas_limit: DEFAULT_GAS_LIMIT,
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

/// Values read from the chain once per run and shared by every batch.
#[derive(Debug, Clone, Copy)]
struct RunContext {
    nonce: u64,
    gas_price: u128,
    chain_id: u64,
}

/// Commits transformed records to the ledger contract, one transaction per batch,
/// strictly one batch at a time.
pub struct BatchSubmissionEngine {
    client: Arc<dyn ChainClient>,
    settings: EngineSettings,
    sink: FailureSink,
    cancellation: CancellationToken,
}

impl BatchSubmissionEngine {
    pub fn new(
        client: Arc<dyn ChainClient>,
        settings: EngineSettings,
        sink: FailureSink,
        cancellation: CancellationToken,
    ) -> Self {
        Self { client, settings, sink, cancellation }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Submits every record exactly once and reports what happened to each batch.
    ///
    /// Returns an error only when the run cannot start. Batches that do not confirm are
    /// recorded in the report and their records written to the failure artifact.
    pub async fn submit(&self, records: Vec<ChainRecord>) -> SubmitterResult<RunReport> {
        let batch_size = self.settings.batch_size;
        let mut report = RunReport {
            total_records: records.len(),
            total_batches: records.len().div_ceil(batch_size.get()),
            ..Default::default()
        };

        if records.is_empty() {
            info!("No usage records to submit.");
            return Ok(report);
        }

        let context = self.resolve_run_context().await?;
        let mut nonces = NonceSequencer::new(context.nonce);
        report.start_nonce = Some(nonces.start());

        info!(
            log_type = "starting",
            category = "submission_run",
            records = report.total_records,
            batches = report.total_batches,
            batch_size = batch_size.get(),
            chain_id = context.chain_id,
            gas_price = context.gas_price,
            start_nonce = context.nonce,
            "Submission run started."
        );

        let waiter = ConfirmationWaiter::new(self.client.as_ref(), &self.settings.confirmation, &self.cancellation);
        let mut failed_records: Vec<ChainRecord> = Vec::new();
        let mut batches = partition(&records, batch_size);

        while let Some(batch) = batches.next() {
            if self.cancellation.is_cancelled() {
                let skipped: Vec<Batch<'_>> = std::iter::once(batch).chain(batches.by_ref()).collect();
                report.skipped_batches = skipped.len();
                failed_records.extend(skipped.iter().flat_map(|batch| batch.records.iter().cloned()));
                warn!(
                    skipped_batches = report.skipped_batches,
                    first_skipped = batch.index,
                    "Run cancelled, remaining batches not attempted."
                );
                break;
            }

            let span = info_span!("batch", batch_index = batch.index);
            let attempt = async {
                let attempt = self.attempt_batch(&batch, &waiter, nonces.next(), &context).await;
                self.reconcile_nonce(&mut nonces, attempt.outcome).await;
                attempt
            }
            .instrument(span)
            .await;

            if !attempt.outcome.is_confirmed() {
                failed_records.extend_from_slice(batch.records);
            }
            report.attempts.push(attempt);
        }

        report.next_nonce = Some(nonces.next());
        report.failed_records = failed_records.len();
        report.failure_artifact = self.sink.persist(&failed_records).await;
        Ok(report)
    }

    async fn resolve_run_context(&self) -> SubmitterResult<RunContext> {
        let nonce = self.client.get_nonce().await.map_err(|err| setup_error("initial nonce", err))?;
        let gas_price = self.client.get_gas_price().await.map_err(|err| setup_error("gas price", err))?;
        let chain_id = self.client.get_chain_id().await.map_err(|err| setup_error("chain id", err))?;
        Ok(RunContext { nonce, gas_price, chain_id })
    }

    /// Drives one batch through signing, sending and confirmation. Never fails the run.
    async fn attempt_batch(
        &self,
        batch: &Batch<'_>,
        waiter: &ConfirmationWaiter<'_>,
        nonce: u64,
        context: &RunContext,
    ) -> TransactionAttempt {
        let mut attempt = TransactionAttempt::built(batch, nonce, context.gas_price);
        let params = TransactionParams {
            nonce,
            gas_price: context.gas_price,
            gas_limit: self.settings.gas_limit,
            chain_id: context.chain_id,
        };

        let signed = match self.client.sign_transaction(batch.records.to_vec(), params).await {
            Ok(signed) => signed,
            Err(err) => {
                let reason = format!("failed to sign transaction: {err:#}");
                warn!(nonce, reason = %reason, "Batch not sent.");
                return attempt.finish(BatchOutcome::SendFailed, Some(reason));
            }
        };

        let tx_hash = match self.client.send_transaction(signed).await {
            Ok(Some(tx_hash)) => tx_hash,
            Ok(None) => {
                let reason = "node returned no transaction hash".to_string();
                warn!(nonce, reason = %reason, "Batch not sent.");
                return attempt.finish(BatchOutcome::SendFailed, Some(reason));
            }
            Err(err) => {
                let reason = format!("failed to send transaction: {err:#}");
                warn!(nonce, reason = %reason, "Batch not sent.");
                return attempt.finish(BatchOutcome::SendFailed, Some(reason));
            }
        };
        attempt.tx_hash = Some(tx_hash.clone());

        info!(
            log_type = "submitted",
            category = "batch",
            nonce,
            tx_hash = %tx_hash,
            records = batch.len(),
            "Batch sent, waiting for receipt."
        );

        match waiter.wait(&tx_hash).await {
            WaitOutcome::Included(receipt) if receipt.is_success() => {
                info!(
                    log_type = "completed",
                    category = "batch",
                    nonce,
                    tx_hash = %tx_hash,
                    block_number = ?receipt.block_number,
                    "Batch confirmed."
                );
                attempt.finish(BatchOutcome::Confirmed, None)
            }
            WaitOutcome::Included(receipt) => {
                warn!(nonce, tx_hash = %tx_hash, block_number = ?receipt.block_number, "Batch reverted on chain.");
                let reason = match receipt.block_number {
                    Some(block_number) => format!("transaction reverted in block {block_number}"),
                    None => "transaction reverted".to_string(),
                };
                attempt.finish(BatchOutcome::Reverted, Some(reason))
            }
            WaitOutcome::TransportError(err) => {
                warn!(nonce, tx_hash = %tx_hash, error = %err, "Failed while waiting for receipt.");
                attempt.finish(BatchOutcome::WaitFailed, Some(format!("failed to fetch receipt: {err}")))
            }
            WaitOutcome::TimedOut { attempts, elapsed } => {
                warn!(nonce, tx_hash = %tx_hash, attempts, elapsed = ?elapsed, "Gave up waiting for receipt.");
                attempt.finish(
                    BatchOutcome::TimedOut,
                    Some(format!("no receipt after {attempts} polls in {elapsed:?}")),
                )
            }
            WaitOutcome::Cancelled => {
                warn!(nonce, tx_hash = %tx_hash, "Run cancelled while waiting for receipt.");
                attempt.finish(BatchOutcome::Cancelled, Some("run cancelled while waiting for receipt".to_string()))
            }
        }
    }

    /// Moves the local nonce according to what the network has seen of the last attempt.
    async fn reconcile_nonce(&self, nonces: &mut NonceSequencer, outcome: BatchOutcome) {
        match outcome {
            // mined, so the slot is spent whatever the status
            BatchOutcome::Confirmed | BatchOutcome::Reverted => nonces.advance(),
            // never left the process
            BatchOutcome::SendFailed => {}
            // no more batches follow
            BatchOutcome::Cancelled => {}
            BatchOutcome::WaitFailed | BatchOutcome::TimedOut => match self.client.get_nonce().await {
                Ok(observed) => nonces.resync(observed),
                Err(err) => warn!(
                    nonce = nonces.next(),
                    error = %format!("{err:#}"),
                    "Failed to re-query pending nonce, keeping local value."
                ),
            },
        }
    }
}

fn setup_error(step: &'static str, err: Report) -> SubmitterError {
    SubmitterError::ChainSetupError { step, reason: format!("{err:#}") }
}
