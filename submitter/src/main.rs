use std::sync::Arc;

use clap::Parser as _;
use dotenvy::dotenv;
use submitter_ethereum_chain_client::EthereumChainClient;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use usage_submitter::cli::{Cli, Commands, RunCmd};
use usage_submitter::config::SubmitterConfig;
use usage_submitter::core::client::source::JsonFileRecordSource;
use usage_submitter::core::{run_submission, BatchSubmissionEngine, FailureSink};
use usage_submitter::types::RunReport;
use usage_submitter::utils::logging::init_logging;
use usage_submitter::utils::signal_handler::SignalHandler;
use usage_submitter::{SubmitterError, SubmitterResult};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    info!("Starting usage submitter");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { run_command } => {
            info!("Executing run command with args: {:?}", run_command);
            match run_submitter(run_command).await {
                Ok(report) => {
                    info!(
                        confirmed_batches = report.confirmed_batches(),
                        total_batches = report.total_batches,
                        "Usage submission completed"
                    );
                }
                Err(e) => {
                    error!(
                        error = %e,
                        error_chain = ?e,
                        "Usage submission failed"
                    );
                    panic!("Usage submission failed: {}", e);
                }
            }
        }
    }
}

async fn run_submitter(run_cmd: &RunCmd) -> SubmitterResult<RunReport> {
    let config = SubmitterConfig::from_run_cmd(run_cmd).await?;
    debug!(chain = ?config.chain, engine = ?config.engine, "Configuration initialized");

    let client = Arc::new(EthereumChainClient::new_with_args(&config.chain)?);
    let source = JsonFileRecordSource::new(&config.records_path);

    let cancellation = CancellationToken::new();
    let signal_listener = SignalHandler::new(cancellation.clone()).spawn();

    let engine = BatchSubmissionEngine::new(
        client,
        config.engine.clone(),
        FailureSink::new(&config.failure_artifact_path),
        cancellation.clone(),
    );
    let result = run_submission(&source, &engine).await;

    // Releases the signal listener once the run is over.
    cancellation.cancel();
    if let Err(err) = signal_listener.await {
        debug!(error = %err, "Signal listener task ended abnormally");
    }

    let report = result?;
    report.log_summary();

    if config.fail_on_partial && !report.is_fully_confirmed() {
        return Err(SubmitterError::PartialFailure { failed: report.failed_batches(), total: report.total_batches });
    }
    Ok(report)
}
