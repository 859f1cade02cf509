use std::time::Duration;

use submitter_chain_client_interface::{ChainClient, ChainReceipt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long the waiter keeps polling for a receipt. With neither bound set it
/// polls until the transaction is included, a transport error occurs or the run is cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub max_attempts: Option<u64>,
    pub max_wait: Option<Duration>,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, max_attempts: None, max_wait: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Included(ChainReceipt),
    TransportError(String),
    TimedOut { attempts: u64, elapsed: Duration },
    Cancelled,
}

pub struct ConfirmationWaiter<'a> {
    client: &'a dyn ChainClient,
    policy: &'a ConfirmationPolicy,
    cancellation: &'a CancellationToken,
}

impl<'a> ConfirmationWaiter<'a> {
    pub fn new(client: &'a dyn ChainClient, policy: &'a ConfirmationPolicy, cancellation: &'a CancellationToken) -> Self {
        Self { client, policy, cancellation }
    }

    /// Polls for the receipt of `tx_hash` until it resolves or the policy gives up.
    /// The last sleep is shortened so one final poll happens right at `max_wait`.
    pub async fn wait(&self, tx_hash: &str) -> WaitOutcome {
        let started = Instant::now();
        let mut attempts: u64 = 0;

        loop {
            if self.cancellation.is_cancelled() {
                return WaitOutcome::Cancelled;
            }

            attempts += 1;
            let polled = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => return WaitOutcome::Cancelled,
                polled = self.client.get_receipt(tx_hash) => polled,
            };

            match polled {
                Ok(Some(receipt)) => return WaitOutcome::Included(receipt),
                Ok(None) => {}
                Err(err) => return WaitOutcome::TransportError(format!("{err:#}")),
            }

            if self.policy.max_attempts.is_some_and(|max_attempts| attempts >= max_attempts) {
                return WaitOutcome::TimedOut { attempts, elapsed: started.elapsed() };
            }

            let mut sleep_for = self.policy.poll_interval;
            if let Some(max_wait) = self.policy.max_wait {
                let elapsed = started.elapsed();
                if elapsed >= max_wait {
                    return WaitOutcome::TimedOut { attempts, elapsed };
                }
                sleep_for = sleep_for.min(max_wait - elapsed);
            }

            debug!(tx_hash, attempts, "Receipt not available yet, polling again in {:?}.", sleep_for);
            tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => return WaitOutcome::Cancelled,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }
    }
}
