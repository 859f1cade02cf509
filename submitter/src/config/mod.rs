use std::path::PathBuf;
use std::str::FromStr as _;
use std::time::Duration;

use alloy::primitives::Address;
use submitter_ethereum_chain_client::EthereumChainClientValidatedArgs;
use tracing::info;

use crate::cli::batching::BatchingCliArgs;
use crate::cli::confirmation::ConfirmationCliArgs;
use crate::cli::secrets::SecretsCliArgs;
use crate::cli::RunCmd;
use crate::core::client::secrets::{AwsSecretsManagerStore, EnvSecretStore, SecretError, SecretStore};
use crate::core::engine::EngineSettings;
use crate::core::waiter::ConfirmationPolicy;
use crate::error::{ConfigError, SubmitterResult};

/// Everything a run needs, validated once at startup.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    pub chain: EthereumChainClientValidatedArgs,
    pub engine: EngineSettings,
    pub records_path: PathBuf,
    pub failure_artifact_path: PathBuf,
    pub fail_on_partial: bool,
}

impl SubmitterConfig {
    /// Validates the command line and resolves the signing key, from the secret store if
    /// it was not given directly.
    pub async fn from_run_cmd(run_cmd: &RunCmd) -> SubmitterResult<Self> {
        let private_key = match &run_cmd.chain_args.private_key {
            Some(private_key) => private_key.clone(),
            None => {
                let store = secret_store(&run_cmd.secrets_args).await;
                resolve_private_key(store.as_ref(), &run_cmd.secrets_args.private_key_secret_name).await?
            }
        };
        Ok(Self::build(run_cmd, private_key)?)
    }

    pub fn build(run_cmd: &RunCmd, private_key: String) -> Result<Self, ConfigError> {
        let chain_args = &run_cmd.chain_args;
        let rpc_url = chain_args.rpc_url.clone().ok_or(ConfigError::MissingArgument("RPC URL"))?;
        let contract_address =
            chain_args.contract_address.as_deref().ok_or(ConfigError::MissingArgument("Contract address"))?;
        let contract_address = Address::from_str(contract_address.trim()).map_err(|err| {
            ConfigError::InvalidContractAddress { address: contract_address.to_string(), reason: err.to_string() }
        })?;
        let records_path =
            run_cmd.source_args.records_file.clone().ok_or(ConfigError::MissingArgument("Records file"))?;

        let engine = EngineSettings::try_from((&run_cmd.batching_args, chain_args.gas_limit, &run_cmd.confirmation_args))?;

        Ok(Self {
            chain: EthereumChainClientValidatedArgs { rpc_url, private_key, contract_address },
            engine,
            records_path,
            failure_artifact_path: run_cmd.failure_artifact.clone(),
            fail_on_partial: run_cmd.fail_on_partial,
        })
    }
}

impl TryFrom<&ConfirmationCliArgs> for ConfirmationPolicy {
    type Error = ConfigError;

    fn try_from(args: &ConfirmationCliArgs) -> Result<Self, Self::Error> {
        if args.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(Self {
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            max_attempts: args.max_confirmation_attempts,
            max_wait: args.max_confirmation_wait_secs.map(Duration::from_secs),
        })
    }
}

impl TryFrom<(&BatchingCliArgs, u64, &ConfirmationCliArgs)> for EngineSettings {
    type Error = ConfigError;

    fn try_from(
        (batching_args, gas_limit, confirmation_args): (&BatchingCliArgs, u64, &ConfirmationCliArgs),
    ) -> Result<Self, Self::Error> {
        EngineSettings::new(batching_args.batch_size, gas_limit, ConfirmationPolicy::try_from(confirmation_args)?)
    }
}

/// AWS Secrets Manager when a secret id is configured, process environment otherwise.
pub async fn secret_store(args: &SecretsCliArgs) -> Box<dyn SecretStore> {
    match &args.aws_secret_id {
        Some(secret_id) => {
            info!(secret_id = %secret_id, region = %args.aws_region, "Resolving secrets from AWS Secrets Manager.");
            Box::new(AwsSecretsManagerStore::new(&args.aws_region, secret_id.clone()).await)
        }
        None => {
            info!("Resolving secrets from the environment.");
            Box::new(EnvSecretStore::default())
        }
    }
}

pub async fn resolve_private_key(store: &dyn SecretStore, name: &str) -> Result<String, SecretError> {
    let private_key = store.get_secret(name).await?;
    info!(secret = name, "Signing key resolved.");
    Ok(private_key)
}
