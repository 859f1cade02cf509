use clap::Args;

#[derive(Debug, Clone, Args)]
pub struct SecretsCliArgs {
    /// AWS Secrets Manager secret holding the signing key, usually `<environment>/<application>`.
    /// The key is read from the environment when unset.
    #[arg(env = "USAGE_SUBMITTER_AWS_SECRET_ID", long)]
    pub aws_secret_id: Option<String>,

    /// Region of the AWS Secrets Manager secret.
    #[arg(env = "USAGE_SUBMITTER_AWS_REGION", long, default_value = "us-east-1")]
    pub aws_region: String,

    /// Name of the signing key inside the secret store.
    #[arg(env = "USAGE_SUBMITTER_PRIVATE_KEY_SECRET_NAME", long, default_value = "DEPLOYER_PRIVATE_KEY")]
    pub private_key_secret_name: String,
}
