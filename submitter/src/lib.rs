pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod types;
pub mod utils;


// Re-export commonly used item
pub use error::{SubmitterError, SubmitterResult};
