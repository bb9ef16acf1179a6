//! Error types for tap-monday
//!
//! This module defines the error hierarchy for the whole connector.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Failures fall into three classes that drive the control flow:
//! fatal (propagated immediately), retryable (handled by [`crate::retry`]),
//! and connection-level (the pagination driver restarts the sequence).

use thiserror::Error;

/// The HTTP status treated as a retryable timeout rather than a client error.
pub const REQUEST_TIMEOUT: u16 = 408;

/// The main error type for tap-monday
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Max retries ({max_retries}) exceeded: {last_error}")]
    MaxRetriesExceeded { max_retries: u32, last_error: String },

    // ============================================================================
    // GraphQL / Pagination Errors
    // ============================================================================
    #[error("GraphQL error: {message}")]
    GraphQl { message: String },

    #[error("Loop detected in pagination: token {token} is identical to the prior token")]
    PaginationLoop { token: String },

    // ============================================================================
    // Record Processing Errors
    // ============================================================================
    #[error("Failed to extract records at '{path}': {message}")]
    RecordExtraction { path: String, message: String },

    #[error("Failed to coerce field '{field}' to {target}: got {value}")]
    Coercion {
        field: String,
        target: &'static str,
        value: String,
    },

    #[error("Missing required context key: {key}")]
    MissingContextKey { key: String },

    #[error("Record for stream '{stream}' failed schema validation: {message}")]
    Schema { stream: String, message: String },

    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a GraphQL error
    pub fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQl {
            message: message.into(),
        }
    }

    /// Create a record extraction error
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordExtraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a coercion error
    pub fn coercion(
        field: impl Into<String>,
        target: &'static str,
        value: impl std::fmt::Display,
    ) -> Self {
        Self::Coercion {
            field: field.into(),
            target,
            value: value.to_string(),
        }
    }

    /// Create a schema validation error
    pub fn schema(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Check if this error should be retried by the backoff policy.
    ///
    /// Connection failures are deliberately excluded: the pagination driver
    /// restarts the whole sequence for those instead of retrying one page.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this is a connection-level failure
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

/// Check if an HTTP status code is retryable: the designated request-timeout
/// status plus the whole server-error range.
fn is_retryable_status(status: u16) -> bool {
    status == REQUEST_TIMEOUT || (500..=599).contains(&status)
}

/// Result type alias for tap-monday
pub type Result<T> = std::result::Result<T, Error>;
