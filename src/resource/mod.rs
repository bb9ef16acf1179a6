//! Resource capability trait and the monday.com catalog
//!
//! Each resource bundles its descriptor (name, keys, parent, schema, query
//! text) with the five behaviors the pagination driver needs:
//! `request_variables`, `extract_records`, `post_process`, `next_page_token`,
//! and `child_context`. The trait keeps per-resource customization at one
//! seam instead of an inheritance tree; everything a resource does not
//! override falls back to the single-page, no-children defaults.

mod streams;


pub use streams::{Boards, BoardViews, Groups, Items, Workspaces};

use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::pagination::{Context, PageToken};
use crate::schema::Schema;
use serde_json::{Map, Value};

/// One normalized output record
pub type Record = Map<String, Value>;

/// A logical entity type extracted from the API
pub trait Resource: Send + Sync {
    /// Stream name, also the key under `data` for top-level list resources
    fn name(&self) -> &'static str;

    /// Primary key fields
    fn primary_keys(&self) -> &'static [&'static str] {
        &["id"]
    }

    /// Field used as the incremental replication cursor, if any
    fn replication_key(&self) -> Option<&'static str> {
        None
    }

    /// Name of the parent resource whose records seed this one's contexts
    fn parent(&self) -> Option<&'static str> {
        None
    }

    /// GraphQL query text for one page
    fn query(&self) -> &'static str;

    /// Declared field types for emitted records
    fn schema(&self) -> Schema;

    /// Variables for one page request, drawn from context + page token
    fn request_variables(
        &self,
        _context: &Context,
        _token: Option<PageToken>,
        _config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        Ok(Map::new())
    }

    /// Pull the flat record sequence out of one response payload
    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>>;

    /// Per-record normalization: type coercion, parent-context injection
    fn post_process(&self, record: Record, _context: &Context) -> Result<Record> {
        Ok(record)
    }

    /// Compute the continuation token from a response; `None` ends the
    /// sequence. Single-page resources keep the default.
    fn next_page_token(&self, _payload: &Value, _previous: Option<PageToken>) -> Option<PageToken> {
        None
    }

    /// Derive the context a child resource fetch cycle will consume from one
    /// of this resource's records. `None` means this record seeds no child
    /// fetches.
    fn child_context(&self, _record: &Record) -> Option<Context> {
        None
    }
}

/// All configured resources, in the fixed parent-before-child sync order.
pub fn catalog() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(Workspaces),
        Box::new(Boards),
        Box::new(BoardViews),
        Box::new(Groups),
        Box::new(Items),
    ]
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Walk `payload` down `path` (object keys and numeric array indexes) and
/// return the array there, or a fatal extraction error.
pub(crate) fn array_at<'a>(payload: &'a Value, path: &[&str]) -> Result<&'a [Value]> {
    let mut current = payload;
    for part in path {
        let next = match part.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(part),
        };
        current = next.ok_or_else(|| {
            Error::extraction(path.join("."), format!("missing segment '{part}'"))
        })?;
    }
    current
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::extraction(path.join("."), "value is not an array"))
}

/// Coerce a numeric-or-string value to i64 (the API returns IDs as strings).
pub(crate) fn coerce_i64(field: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::coercion(field, "integer", value)),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| Error::coercion(field, "integer", value)),
        _ => Err(Error::coercion(field, "integer", value)),
    }
}

/// Coerce a numeric-or-string value to f64 (ordering fields arrive as strings).
pub(crate) fn coerce_f64(field: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::coercion(field, "number", value)),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| Error::coercion(field, "number", value)),
        _ => Err(Error::coercion(field, "number", value)),
    }
}

/// Page-number token rule shared by boards and items: advance by one page
/// while the returned list under `data.<name>` is non-empty, stop otherwise.
pub(crate) fn page_number_token(
    payload: &Value,
    name: &str,
    previous: Option<PageToken>,
) -> Option<PageToken> {
    let current = previous.unwrap_or_else(PageToken::first);
    let non_empty = payload
        .get("data")
        .and_then(|data| data.get(name))
        .and_then(Value::as_array)
        .is_some_and(|rows| !rows.is_empty());
    non_empty.then(|| current.next())
}
