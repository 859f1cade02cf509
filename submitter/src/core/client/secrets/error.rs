use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Secret {0} is not set")]
    NotFound(String),

    #[error("Secret {0} is empty")]
    Empty(String),

    /// AWS Secrets Manager error
    #[error("Failed to fetch secret {secret_id}: {reason}")]
    FetchError { secret_id: String, reason: String },

    #[error("Secret {0} has neither a string nor a binary payload")]
    MissingPayload(String),

    #[error("Secret {0} binary payload is not valid UTF-8")]
    NonUtf8Payload(String),

    #[error("Secret {secret_id} payload is not a JSON object: {source}")]
    InvalidPayload {
        secret_id: String,
        #[source]
        source: serde_json::Error,
    },
}
