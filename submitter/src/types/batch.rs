use std::num::NonZeroUsize;

use submitter_chain_client_interface::ChainRecord;

/// A contiguous slice of the transformed record list, committed in one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    pub index: usize,
    /// Position of the first record in the full list.
    pub start: usize,
    pub records: &'a [ChainRecord],
}

impl Batch<'_> {
    /// Position one past the last record in the full list.
    pub fn end(&self) -> usize {
        self.start + self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Partitions `records` into ordered, non-overlapping batches of at most `batch_size`.
pub fn partition(records: &[ChainRecord], batch_size: NonZeroUsize) -> impl Iterator<Item = Batch<'_>> {
    records.chunks(batch_size.get()).enumerate().map(move |(index, records)| Batch {
        index,
        start: index * batch_size.get(),
        records,
    })
}
