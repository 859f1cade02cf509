use tracing::{debug, warn};

/// Local view of the signing account's next usable transaction sequence number.
///
/// Reading the value with [`NonceSequencer::next`] does not consume it. The engine
/// calls [`NonceSequencer::advance`] once a transaction is known to have reached
/// the network, and [`NonceSequencer::resync`] when the local view may be stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceSequencer {
    start: u64,
    current: u64,
}

impl NonceSequencer {
    /// Starts from the account's pending transaction count observed at run start.
    pub fn new(start: u64) -> Self {
        Self { start, current: start }
    }

    pub fn next(&self) -> u64 {
        self.current
    }

    pub fn advance(&mut self) {
        self.current += 1;
        debug!(nonce = self.current, "Nonce advanced.");
    }

    /// Replaces the local counter with a value re-queried from the chain.
    pub fn resync(&mut self, observed: u64) {
        if observed < self.current {
            warn!(local = self.current, observed, "Chain reports a lower pending nonce than the local counter.");
        } else if observed != self.current {
            debug!(local = self.current, observed, "Nonce resynced from chain.");
        }
        self.current = observed;
    }

    pub fn start(&self) -> u64 {
        self.start
    }
}
