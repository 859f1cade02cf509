use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::Client;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::client::secrets::{SecretError, SecretStore};

const CURRENT_VERSION_STAGE: &str = "AWSCURRENT";

/// Resolves keys of a single JSON secret held in AWS Secrets Manager.
#[derive(Clone, Debug)]
pub struct AwsSecretsManagerStore {
    client: Client,
    secret_id: String,
}

impl AwsSecretsManagerStore {
    pub async fn new(region: &str, secret_id: impl Into<String>) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string())).load().await;
        Self { client: Client::new(&aws_config), secret_id: secret_id.into() }
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    async fn fetch_payload(&self) -> Result<String, SecretError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(&self.secret_id)
            .version_stage(CURRENT_VERSION_STAGE)
            .send()
            .await
            .map_err(|err| SecretError::FetchError {
                secret_id: self.secret_id.clone(),
                reason: DisplayErrorContext(err).to_string(),
            })?;

        if let Some(payload) = output.secret_string() {
            return Ok(payload.to_string());
        }
        match output.secret_binary() {
            Some(blob) => String::from_utf8(blob.as_ref().to_vec())
                .map_err(|_| SecretError::NonUtf8Payload(self.secret_id.clone())),
            None => Err(SecretError::MissingPayload(self.secret_id.clone())),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let payload = self.fetch_payload().await?;
        debug!(secret_id = %self.secret_id, key = name, "Fetched secret payload.");
        extract_secret_value(&self.secret_id, &payload, name)
    }
}

/// Picks `key` out of a secret whose payload is a flat JSON object.
/// Non-string values are returned in their JSON text form.
pub fn extract_secret_value(secret_id: &str, payload: &str, key: &str) -> Result<String, SecretError> {
    let values: Map<String, Value> = serde_json::from_str(payload)
        .map_err(|source| SecretError::InvalidPayload { secret_id: secret_id.to_string(), source })?;

    let value = match values.get(key) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Null) | None => return Err(SecretError::NotFound(format!("{secret_id}/{key}"))),
        Some(other) => other.to_string(),
    };
    if value.trim().is_empty() {
        return Err(SecretError::Empty(format!("{secret_id}/{key}")));
    }
    Ok(value)
}
