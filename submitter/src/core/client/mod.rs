pub mod secrets;
pub mod source;

pub use secrets::{SecretError, SecretStore};
pub use source::{RecordSource, SourceError};
