use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct ConfirmationCliArgs {
    /// Seconds between two receipt queries.
    #[arg(env = "USAGE_SUBMITTER_POLL_INTERVAL_SECS", long, default_value_t = 2)]
    pub poll_interval_secs: u64,

    /// Stop waiting for a receipt after this many queries. Unbounded when unset.
    #[arg(env = "USAGE_SUBMITTER_MAX_CONFIRMATION_ATTEMPTS", long)]
    pub max_confirmation_attempts: Option<u64>,

    /// Stop waiting for a receipt after this many seconds. Unbounded when unset.
    #[arg(env = "USAGE_SUBMITTER_MAX_CONFIRMATION_WAIT_SECS", long)]
    pub max_confirmation_wait_secs: Option<u64>,
}
