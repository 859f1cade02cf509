use async_trait::async_trait;

use crate::core::client::secrets::{SecretError, SecretStore};

/// Resolves secrets from process environment variables, optionally namespaced by a prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    fn variable_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let variable = self.variable_name(name);
        let value = std::env::var(&variable).map_err(|_| SecretError::NotFound(variable.clone()))?;
        if value.trim().is_empty() {
            return Err(SecretError::Empty(variable));
        }
        Ok(value)
    }
}
