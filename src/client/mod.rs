//! GraphQL request issuer
//!
//! Builds exactly one outbound request per page: auth headers, rendered query
//! plus variables, a single POST, and a classified outcome. Retry decisions
//! belong to [`crate::retry`]; restart decisions to [`crate::pagination`].
//!
//! Outcome classification:
//! - 2xx with a clean body → the parsed response payload
//! - 400–499 (except 408) → fatal [`Error::HttpStatus`]
//! - 408 and 500–599 → retryable [`Error::HttpStatus`]
//! - read timeout → retryable [`Error::Timeout`]
//! - connection-level failure → [`Error::Connection`]


use crate::config::ConnectorConfig;
use crate::cost::{CallType, SyncCost};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

/// HTTP client for the monday.com GraphQL endpoint
pub struct GraphqlClient {
    http: Client,
    endpoint: String,
    timeout: Duration,
    cost: SyncCost,
}

impl GraphqlClient {
    /// Create a client from the connector configuration.
    ///
    /// Fails fast when the auth token is missing or the endpoint is not a
    /// valid URL.
    pub fn new(config: &ConnectorConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&config.auth_token)
                .map_err(|_| Error::config("auth_token contains invalid header characters"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(agent) = &config.user_agent {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(agent)
                    .map_err(|_| Error::config("user_agent contains invalid header characters"))?,
            );
        }

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let http = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.api_url.clone(),
            timeout,
            cost: SyncCost::new(),
        })
    }

    /// The configured GraphQL endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The sync-cost accumulator owned by this client
    pub fn cost(&self) -> &SyncCost {
        &self.cost
    }

    /// Execute one GraphQL query and return the parsed response payload.
    pub async fn execute(&self, query: &str, variables: Map<String, Value>) -> Result<Value> {
        self.cost.record(CallType::Graphql);

        let body = json!({
            "query": query,
            "variables": Value::Object(variables),
        });

        let response = match self.http.post(&self.endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(Error::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            Err(e) if e.is_connect() => {
                return Err(Error::connection(e.to_string()));
            }
            Err(e) => return Err(Error::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let payload: Value = response.json().await.map_err(Error::Http)?;

        // monday.com reports query failures as a 200 with an errors array.
        if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .map(|e| {
                        e.get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown error")
                            .to_string()
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(Error::graphql(message));
            }
        }

        debug!(endpoint = %self.endpoint, "GraphQL request succeeded");
        Ok(payload)
    }
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("cost", &self.cost.snapshot())
            .finish_non_exhaustive()
    }
}
