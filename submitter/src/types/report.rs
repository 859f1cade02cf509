use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::types::batch::Batch;

/// Terminal state of one batch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchOutcome {
    /// Included with a success receipt.
    Confirmed,
    /// Included with a failure receipt.
    Reverted,
    /// Never left the process: signing failed, the node rejected it or returned no hash.
    SendFailed,
    /// A transport error occurred while polling for the receipt.
    WaitFailed,
    /// The confirmation budget ran out before a receipt appeared.
    TimedOut,
    /// The run was cancelled while waiting for the receipt.
    Cancelled,
}

impl BatchOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BatchOutcome::Confirmed)
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchOutcome::Confirmed => "confirmed",
            BatchOutcome::Reverted => "reverted",
            BatchOutcome::SendFailed => "send_failed",
            BatchOutcome::WaitFailed => "wait_failed",
            BatchOutcome::TimedOut => "timed_out",
            BatchOutcome::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// The single transaction a run spends on a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAttempt {
    pub batch_index: usize,
    pub start: usize,
    pub end: usize,
    pub nonce: u64,
    pub gas_price: u128,
    /// Present once the node accepted the transaction.
    pub tx_hash: Option<String>,
    pub outcome: BatchOutcome,
    pub reason: Option<String>,
}

impl TransactionAttempt {
    /// An attempt for a freshly built batch. Its outcome is overwritten by [`Self::finish`].
    pub(crate) fn built(batch: &Batch<'_>, nonce: u64, gas_price: u128) -> Self {
        Self {
            batch_index: batch.index,
            start: batch.start,
            end: batch.end(),
            nonce,
            gas_price,
            tx_hash: None,
            outcome: BatchOutcome::SendFailed,
            reason: None,
        }
    }

    pub(crate) fn finish(mut self, outcome: BatchOutcome, reason: Option<String>) -> Self {
        self.outcome = outcome;
        self.reason = reason;
        self
    }

    pub fn record_count(&self) -> usize {
        self.end - self.start
    }
}

/// What a run did, returned to the caller so it can decide how to treat partial failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub total_records: usize,
    pub total_batches: usize,
    pub attempts: Vec<TransactionAttempt>,
    /// Batches never attempted because the run was cancelled.
    pub skipped_batches: usize,
    /// Records written to the failure artifact.
    pub failed_records: usize,
    pub start_nonce: Option<u64>,
    pub next_nonce: Option<u64>,
    pub failure_artifact: Option<PathBuf>,
}

impl RunReport {
    pub fn confirmed_batches(&self) -> usize {
        self.attempts.iter().filter(|attempt| attempt.outcome.is_confirmed()).count()
    }

    /// Batches that did not reach confirmed success, skipped ones included.
    pub fn failed_batches(&self) -> usize {
        self.failures().count() + self.skipped_batches
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransactionAttempt> {
        self.attempts.iter().filter(|attempt| !attempt.outcome.is_confirmed())
    }

    pub fn is_fully_confirmed(&self) -> bool {
        self.failed_batches() == 0
    }

    pub fn log_summary(&self) {
        info!(
            log_type = "completed",
            category = "submission_run",
            total_records = self.total_records,
            total_batches = self.total_batches,
            confirmed_batches = self.confirmed_batches(),
            failed_batches = self.failed_batches(),
            skipped_batches = self.skipped_batches,
            start_nonce = ?self.start_nonce,
            next_nonce = ?self.next_nonce,
            "Submission run finished."
        );

        for attempt in self.failures() {
            warn!(
                batch_index = attempt.batch_index,
                records = %format!("{}..{}", attempt.start, attempt.end),
                nonce = attempt.nonce,
                outcome = %attempt.outcome,
                tx_hash = attempt.tx_hash.as_deref().unwrap_or("-"),
                reason = attempt.reason.as_deref().unwrap_or("-"),
                "Batch not confirmed."
            );
        }

        if let Some(path) = &self.failure_artifact {
            warn!(
                failed_records = self.failed_records,
                path = %path.display(),
                "Records of unconfirmed batches saved for reprocessing."
            );
        }
    }
}
