pub mod batch;
pub mod record;
pub mod report;

pub use batch::{partition, Batch};
pub use record::UsageRecord;
pub use report::{BatchOutcome, RunReport, TransactionAttempt};
pub use submitter_chain_client_interface::ChainRecord;
