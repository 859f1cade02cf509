pub mod aws;
pub mod env;
pub mod error;

use async_trait::async_trait;
pub use aws::AwsSecretsManagerStore;
pub use env::EnvSecretStore;
pub use error::SecretError;

/// Trait defining a lookup of credentials and signing key material by name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;
}
