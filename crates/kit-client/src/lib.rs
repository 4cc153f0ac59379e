//! Kit Rental Backend Client
//!
//! HTTP access to the rental request lists the scan workflow searches.

pub mod config;
pub mod directory;

pub use config::{load_config, ClientConfig};
pub use directory::HttpRequestDirectory;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for kit_core::CoreError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Config(msg) | ClientError::InvalidUrl(msg) => kit_core::CoreError::Config(msg),
            ClientError::Status { status: 404, url } => kit_core::CoreError::NotFound(url),
            other => kit_core::CoreError::Transport(other.to_string()),
        }
    }
}
