use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct SourceCliArgs {
    /// JSON file holding the computed usage records.
    #[arg(env = "USAGE_SUBMITTER_RECORDS_FILE", long, value_name = "PATH")]
    pub records_file: Option<PathBuf>,
}
