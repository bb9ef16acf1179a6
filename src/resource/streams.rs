//! The five monday.com resources
//!
//! Query text and schemas mirror the upstream API. Boards is the only
//! parent: views, groups, and items each consume one context per board
//! record.

use super::{array_at, coerce_f64, coerce_i64, page_number_token, Record, Resource};
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use crate::pagination::{Context, PageToken};
use crate::schema::{Field, FieldType, Schema};
use serde_json::{json, Map, Value};
use tracing::debug;

fn record_from(value: &Value, path: &str) -> Result<Record> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| Error::extraction(path, "row is not an object"))
}

// ============================================================================
// Workspaces
// ============================================================================

/// Workspaces, read off the boards that belong to them
#[derive(Debug, Clone, Copy, Default)]
pub struct Workspaces;

impl Resource for Workspaces {
    fn name(&self) -> &'static str {
        "workspaces"
    }

    fn query(&self) -> &'static str {
        r"
            query {
              boards {
                workspace {
                  id
                  name
                  kind
                  description
                }
              }
            }
        "
    }

    fn schema(&self) -> Schema {
        Schema::builder()
            .field("id", FieldType::Integer)
            .field("name", FieldType::String)
            .field("description", FieldType::String)
            .field("kind", FieldType::String)
            .build()
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for row in array_at(payload, &["data", "boards"])? {
            match row.get("workspace") {
                Some(Value::Object(workspace)) => records.push(workspace.clone()),
                // Boards outside any workspace report a null workspace.
                _ => debug!("skipping board without a workspace"),
            }
        }
        Ok(records)
    }
}

// ============================================================================
// Boards
// ============================================================================

/// Boards, paginated by page number; the parent of every child resource
#[derive(Debug, Clone, Copy, Default)]
pub struct Boards;

impl Resource for Boards {
    fn name(&self) -> &'static str {
        "boards"
    }

    fn replication_key(&self) -> Option<&'static str> {
        Some("updated_at")
    }

    fn query(&self) -> &'static str {
        r"
            query ($page: Int!, $board_limit: Int!) {
                boards(limit: $board_limit, page: $page, order_by: created_at) {
                    name
                    id
                    description
                    state
                    updated_at
                    workspace_id
                    items {
                        id
                    }
                }
            }
        "
    }

    fn schema(&self) -> Schema {
        Schema::builder()
            .field("id", FieldType::Integer)
            .field("name", FieldType::String)
            .field("description", FieldType::String)
            .field("state", FieldType::String)
            .field("updated_at", FieldType::DateTime)
            .field("workspace_id", FieldType::Integer)
            .field(
                "items",
                FieldType::Array(Box::new(FieldType::Object(vec![Field::new(
                    "id",
                    FieldType::Integer,
                )]))),
            )
            .build()
    }

    fn request_variables(
        &self,
        _context: &Context,
        token: Option<PageToken>,
        config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        let mut variables = Map::new();
        variables.insert(
            "page".to_string(),
            json!(token.unwrap_or_else(PageToken::first).page()),
        );
        variables.insert("board_limit".to_string(), json!(config.board_limit));
        Ok(variables)
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        array_at(payload, &["data", "boards"])?
            .iter()
            .map(|row| record_from(row, "data.boards"))
            .collect()
    }

    fn post_process(&self, mut record: Record, _context: &Context) -> Result<Record> {
        if let Some(id) = record.get("id") {
            let id = coerce_i64("id", id)?;
            record.insert("id".to_string(), json!(id));
        }
        if let Some(Value::Array(items)) = record.get_mut("items") {
            for item in items {
                if let Some(obj) = item.as_object_mut() {
                    if let Some(id) = obj.get("id") {
                        let id = coerce_i64("items.id", id)?;
                        obj.insert("id".to_string(), json!(id));
                    }
                }
            }
        }
        Ok(record)
    }

    fn next_page_token(&self, payload: &Value, previous: Option<PageToken>) -> Option<PageToken> {
        page_number_token(payload, self.name(), previous)
    }

    fn child_context(&self, record: &Record) -> Option<Context> {
        let board_id = record.get("id").and_then(Value::as_i64)?;
        let first_item = record.get("items").and_then(Value::as_array)?.first()?;
        let item_id = coerce_i64("items.id", first_item.get("id")?).ok()?;
        Some(
            Context::root()
                .with("board_id", board_id)
                .with("item_id", item_id),
        )
    }
}

// ============================================================================
// Board Views
// ============================================================================

/// Views configured on a single board
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardViews;

impl Resource for BoardViews {
    fn name(&self) -> &'static str {
        "board_views"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("boards")
    }

    fn query(&self) -> &'static str {
        r"
            query ($board_id: [Int]) {
                boards(ids: $board_id) {
                    views {
                        id
                        name
                        type
                        settings_str
                    }
                }
            }
        "
    }

    fn schema(&self) -> Schema {
        Schema::builder()
            .field("id", FieldType::String)
            .field("name", FieldType::String)
            .field("settings_str", FieldType::String)
            .field("type", FieldType::String)
            .build()
    }

    fn request_variables(
        &self,
        context: &Context,
        _token: Option<PageToken>,
        _config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        let mut variables = Map::new();
        variables.insert("board_id".to_string(), json!(context.require_i64("board_id")?));
        Ok(variables)
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        array_at(payload, &["data", "boards", "0", "views"])?
            .iter()
            .map(|row| record_from(row, "data.boards.0.views"))
            .collect()
    }
}

// ============================================================================
// Groups
// ============================================================================

/// Groups (sections) of a single board
#[derive(Debug, Clone, Copy, Default)]
pub struct Groups;

impl Resource for Groups {
    fn name(&self) -> &'static str {
        "groups"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("boards")
    }

    fn query(&self) -> &'static str {
        r"
            query ($board_id: [Int]) {
                boards(ids: $board_id) {
                    groups {
                        title
                        position
                        id
                        color
                    }
                }
            }
        "
    }

    fn schema(&self) -> Schema {
        Schema::builder()
            .field("id", FieldType::String)
            .field("title", FieldType::String)
            .field("position", FieldType::Number)
            .field("board_id", FieldType::Number)
            .field("color", FieldType::String)
            .build()
    }

    fn request_variables(
        &self,
        context: &Context,
        _token: Option<PageToken>,
        _config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        let mut variables = Map::new();
        variables.insert("board_id".to_string(), json!(context.require_i64("board_id")?));
        Ok(variables)
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        array_at(payload, &["data", "boards", "0", "groups"])?
            .iter()
            .map(|row| record_from(row, "data.boards.0.groups"))
            .collect()
    }

    fn post_process(&self, mut record: Record, context: &Context) -> Result<Record> {
        record.insert("board_id".to_string(), json!(context.require_i64("board_id")?));
        // The API returns the ordering position as a string.
        if let Some(position) = record.get("position") {
            if !position.is_null() {
                let position = coerce_f64("position", position)?;
                record.insert("position".to_string(), json!(position));
            }
        }
        Ok(record)
    }
}

// ============================================================================
// Items
// ============================================================================

/// Items of a single board, paginated by page number
#[derive(Debug, Clone, Copy, Default)]
pub struct Items;

impl Resource for Items {
    fn name(&self) -> &'static str {
        "items"
    }

    fn parent(&self) -> Option<&'static str> {
        Some("boards")
    }

    fn query(&self) -> &'static str {
        r"
            query ($item_id: [Int], $page: Int!) {
                items(ids: $item_id, page: $page) {
                    id
                    name
                    state
                    created_at
                    updated_at
                    column_values {
                        id
                        title
                        text
                        type
                        value
                        additional_info
                    }
                }
            }
        "
    }

    fn schema(&self) -> Schema {
        Schema::builder()
            .field("id", FieldType::Integer)
            .field("created_at", FieldType::DateTime)
            .field("name", FieldType::String)
            .field("state", FieldType::String)
            .field("updated_at", FieldType::DateTime)
            .field("board_id", FieldType::Integer)
            .field(
                "column_values",
                FieldType::Array(Box::new(FieldType::Object(vec![
                    Field::new("id", FieldType::String),
                    Field::new("title", FieldType::String),
                    Field::new("text", FieldType::String),
                    Field::new("type", FieldType::String),
                ]))),
            )
            .build()
    }

    fn request_variables(
        &self,
        context: &Context,
        token: Option<PageToken>,
        _config: &ConnectorConfig,
    ) -> Result<Map<String, Value>> {
        let mut variables = Map::new();
        variables.insert("board_id".to_string(), json!(context.require_i64("board_id")?));
        variables.insert(
            "item_id".to_string(),
            json!([context.require_i64("item_id")?]),
        );
        variables.insert(
            "page".to_string(),
            json!(token.unwrap_or_else(PageToken::first).page()),
        );
        Ok(variables)
    }

    fn extract_records(&self, payload: &Value) -> Result<Vec<Record>> {
        array_at(payload, &["data", "items"])?
            .iter()
            .map(|row| record_from(row, "data.items"))
            .collect()
    }

    fn post_process(&self, mut record: Record, context: &Context) -> Result<Record> {
        record.insert("board_id".to_string(), json!(context.require_i64("board_id")?));
        if let Some(id) = record.get("id") {
            let id = coerce_i64("id", id)?;
            record.insert("id".to_string(), json!(id));
        }
        Ok(record)
    }

    fn next_page_token(&self, payload: &Value, previous: Option<PageToken>) -> Option<PageToken> {
        page_number_token(payload, self.name(), previous)
    }
}
