use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::failure_sink::DEFAULT_FAILURE_ARTIFACT;

pub mod batching;
pub mod chain;
pub mod confirmation;
pub mod secrets;
pub mod source;

#[derive(Parser, Debug)]
#[command(
    name = "usage-submitter",
    about = "Commits computed usage records to the usage ledger contract, one batch per transaction",
    after_help = "Examples:\n  \
    usage-submitter run --records-file usage.json --rpc-url http://localhost:8545 \\\n    \
    --contract-address 0x5FbDB2315678afecb367f032d93F642f64180aa3\n  \
    usage-submitter run --records-file usage.json --aws-secret-id prod/usage-submitter --fail-on-partial"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit one run of usage records
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RunCmd {
    #[clap(flatten)]
    pub source_args: source::SourceCliArgs,

    #[clap(flatten)]
    pub chain_args: chain::ChainCliArgs,

    #[clap(flatten)]
    pub batching_args: batching::BatchingCliArgs,

    #[clap(flatten)]
    pub confirmation_args: confirmation::ConfirmationCliArgs,

    #[clap(flatten)]
    pub secrets_args: secrets::SecretsCliArgs,

    /// Where the records of unconfirmed batches are written.
    #[arg(env = "USAGE_SUBMITTER_FAILURE_ARTIFACT", long, value_name = "PATH", default_value = DEFAULT_FAILURE_ARTIFACT)]
    pub failure_artifact: PathBuf,

    /// Exit with an error when any batch is not confirmed.
    #[arg(env = "USAGE_SUBMITTER_FAIL_ON_PARTIAL", long, default_value_t = false)]
    pub fail_on_partial: bool,
}
