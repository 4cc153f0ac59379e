//! Client configuration
//!
//! Values come from a TOML file when one is given, otherwise from the
//! `KIT_API_*` environment variables with local development defaults.

use crate::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the REST API, e.g. `https://rental.example.edu/api`
    pub base_url: String,

    /// Bearer token of the operator account
    pub api_token: Option<String>,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// User agent string
    pub user_agent: String,

    /// Route requests through the proxy named by `HTTP(S)_PROXY`
    pub use_system_proxy: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("KIT_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            api_token: std::env::var("KIT_API_TOKEN").ok().filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("KIT_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            user_agent: format!("kit-scan/{}", env!("CARGO_PKG_VERSION")),
            use_system_proxy: true,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn without_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)?;
        load_config(&content)
    }

    /// Base URL with a trailing slash so relative endpoints append to it
    pub fn api_root(&self) -> ClientResult<Url> {
        let mut base = self.base_url.trim().to_string();
        if base.is_empty() {
            return Err(ClientError::Config("base_url is empty".to_string()));
        }
        if !base.ends_with('/') {
            base.push('/');
        }

        let url = Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::InvalidUrl(format!("unsupported scheme '{}'", other))),
        }
    }
}

/// Parse a TOML configuration
///
/// Missing keys fall back to [`ClientConfig::default`].
pub fn load_config(toml_content: &str) -> ClientResult<ClientConfig> {
    let config: ClientConfig =
        toml::from_str(toml_content).map_err(|e| ClientError::Config(e.to_string()))?;
    config.api_root()?;
    Ok(config)
}
