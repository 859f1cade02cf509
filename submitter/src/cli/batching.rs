use clap::Args;

use crate::core::engine::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone, Args)]
pub struct BatchingCliArgs {
    /// Maximum number of records committed in one transaction.
    #[arg(env = "USAGE_SUBMITTER_BATCH_SIZE", long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}
