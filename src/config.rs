//! Connector configuration
//!
//! Configuration is supplied as a JSON document (file or inline), following
//! the convention of extraction connectors. Only `auth_token` is required;
//! everything else has a sensible default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default GraphQL endpoint for the monday.com API
pub const DEFAULT_API_URL: &str = "https://api.monday.com/v2";

/// Default number of boards requested per page
pub const DEFAULT_BOARD_LIMIT: u32 = 25;

/// Connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// API token used for the Authorization header (required)
    pub auth_token: String,

    /// GraphQL endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Page size for board queries
    #[serde(default = "default_board_limit")]
    pub board_limit: u32,

    /// Optional User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum retry attempts for retryable failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Exponential backoff factor
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_board_limit() -> u32 {
    DEFAULT_BOARD_LIMIT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    20
}

fn default_backoff_factor() -> u32 {
    2
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

impl ConnectorConfig {
    /// Create a config with the given token and all defaults
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            api_url: default_api_url(),
            board_limit: default_board_limit(),
            user_agent: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration, failing fast on a missing token
    pub fn validate(&self) -> Result<()> {
        if self.auth_token.trim().is_empty() {
            return Err(Error::missing_field("auth_token"));
        }
        url::Url::parse(&self.api_url)?;
        if self.board_limit == 0 {
            return Err(Error::config("board_limit must be greater than zero"));
        }
        Ok(())
    }

    /// Override the API endpoint (used by tests against a mock server)
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Override the board page size
    #[must_use]
    pub fn with_board_limit(mut self, limit: u32) -> Self {
        self.board_limit = limit;
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }
}
