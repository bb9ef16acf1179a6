//! Page tokens, contexts, and the pagination driver
//!
//! The driver owns the control loop every resource shares: issue one
//! retry-wrapped request per page, normalize and collect the page's records,
//! compute the next token, and stop when the token comes back empty. Two
//! consecutive equal non-empty tokens mean the API is looping and abort the
//! sync for that resource/context pair.
//!
//! A connection-level failure restarts the whole sequence from the first
//! page rather than retrying the failing one; a dropped connection may leave
//! server-side pagination state inconsistent, and downstream consumption is
//! keyed on primary keys, so re-emitting earlier pages is safe. Restarts are
//! paced by the retry policy's initial backoff.

#[cfg(test)]
mod tests;

use crate::client::GraphqlClient;
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::resource::{Record, Resource};
use crate::retry::RetryPolicy;
use serde_json::Value;
use tracing::{debug, trace, warn};

// ============================================================================
// Page Token
// ============================================================================

/// Opaque continuation marker for a paginated resource.
///
/// The driver only ever compares tokens for equality and threads them back
/// into the resource; the 1-based page number inside is a detail of the
/// monday.com API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageToken(i64);

impl PageToken {
    /// Token for the first page
    pub fn first() -> Self {
        Self(1)
    }

    /// Token for the page after this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The page number this token encodes
    pub fn page(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Context
// ============================================================================

/// Key/value data passed from a parent resource's record into a child
/// resource's fetch parameters.
///
/// Created once per parent record, consumed by exactly one child fetch cycle.
/// Top-level resources run against the empty root context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: serde_json::Map<String, Value>,
}

impl Context {
    /// The empty context used for top-level resources
    pub fn root() -> Self {
        Self::default()
    }

    /// Add a value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a raw value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get an integer value, erroring when the key is absent
    pub fn require_i64(&self, key: &str) -> Result<i64> {
        self.values
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::MissingContextKey {
                key: key.to_string(),
            })
    }

    /// Whether this is the empty root context
    pub fn is_root(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Driver
// ============================================================================

/// States of the pagination loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Ready to issue the request for the current token
    AwaitingNextPage,
    /// A page has been fetched and is being normalized
    HasPage,
    /// The computed next token was empty
    Done,
}

/// Drives the complete ordered record sequence for one resource/context pair
pub struct PageDriver<'a> {
    client: &'a GraphqlClient,
    retry: &'a RetryPolicy,
    config: &'a ConnectorConfig,
}

impl<'a> PageDriver<'a> {
    /// Create a driver borrowing the shared client, retry policy, and config
    pub fn new(
        client: &'a GraphqlClient,
        retry: &'a RetryPolicy,
        config: &'a ConnectorConfig,
    ) -> Self {
        Self {
            client,
            retry,
            config,
        }
    }

    /// Fetch every page of `resource` under `context` and return the records
    /// in page order.
    pub async fn read_records(
        &self,
        resource: &dyn Resource,
        context: &Context,
    ) -> Result<Vec<Record>> {
        loop {
            match self.paginate(resource, context).await {
                Err(e) if e.is_connection() => {
                    warn!(
                        stream = resource.name(),
                        error = %e,
                        "connection failed, restarting pagination from the first page"
                    );
                    // Pace restarts so a dead endpoint is not hammered.
                    tokio::time::sleep(self.retry.initial_backoff).await;
                }
                other => return other,
            }
        }
    }

    /// One full pass over the sequence; a connection error aborts the pass
    /// and surfaces to [`Self::read_records`] for a restart.
    async fn paginate(&self, resource: &dyn Resource, context: &Context) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut token: Option<PageToken> = None;
        let mut state = DriverState::AwaitingNextPage;
        let mut pages: u64 = 0;

        loop {
            trace!(stream = resource.name(), ?state, ?token, "issuing page request");
            let variables = resource.request_variables(context, token, self.config)?;
            let query = resource.query();
            let payload = self
                .retry
                .run(|| self.client.execute(query, variables.clone()))
                .await?;
            state = DriverState::HasPage;
            pages += 1;

            let page = resource.extract_records(&payload)?;
            debug!(
                stream = resource.name(),
                ?state,
                page = pages,
                records = page.len(),
                "fetched page"
            );
            for record in page {
                records.push(resource.post_process(record, context)?);
            }

            let previous = token;
            token = resource.next_page_token(&payload, previous);

            if let (Some(next), Some(prev)) = (token, previous) {
                if next == prev {
                    return Err(Error::PaginationLoop {
                        token: next.to_string(),
                    });
                }
            }

            match token {
                Some(_) => state = DriverState::AwaitingNextPage,
                None => {
                    state = DriverState::Done;
                    break;
                }
            }
        }

        debug_assert_eq!(state, DriverState::Done);
        debug!(
            stream = resource.name(),
            pages,
            records = records.len(),
            "pagination complete"
        );
        Ok(records)
    }
}
