//! Declarative record schemas
//!
//! Each resource declares its field types once at process start; the engine
//! validates records against the declaration before emitting them, and the
//! CLI `discover` command serializes the declarations as JSON-schema-style
//! documents for downstream catalog negotiation.
//!
//! Validation is deliberately lenient: missing fields and nulls pass, extra
//! fields are ignored. Only a present, non-null value of the wrong shape is
//! an error.

use chrono::DateTime;
use serde_json::{json, Value};

/// Semantic type of one schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Whole number
    Integer,
    /// Floating-point number (also accepts integers)
    Number,
    /// UTF-8 string
    String,
    /// Boolean
    Boolean,
    /// RFC 3339 date-time string
    DateTime,
    /// Homogeneous array
    Array(Box<FieldType>),
    /// Nested object with its own fields
    Object(Vec<Field>),
}

/// One named, typed field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name as it appears in records
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
}

impl Field {
    /// Create a field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered set of fields for one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The declared fields, in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check a record object against this schema
    pub fn validate(&self, record: &serde_json::Map<String, Value>) -> Result<(), String> {
        for field in &self.fields {
            if let Some(value) = record.get(&field.name) {
                check_value(&field.name, &field.field_type, value)?;
            }
        }
        Ok(())
    }

    /// Serialize as a JSON-schema-style document
    pub fn to_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), type_to_json(&field.field_type));
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
        })
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Add a field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(Field::new(name, field_type));
        self
    }

    /// Finish the schema
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

fn check_value(name: &str, expected: &FieldType, value: &Value) -> Result<(), String> {
    if value.is_null() {
        return Ok(());
    }
    match expected {
        FieldType::Integer => {
            if value.as_i64().is_none() && value.as_u64().is_none() {
                return Err(format!("field '{name}' expected an integer, got {value}"));
            }
        }
        FieldType::Number => {
            if !value.is_number() {
                return Err(format!("field '{name}' expected a number, got {value}"));
            }
        }
        FieldType::String => {
            if !value.is_string() {
                return Err(format!("field '{name}' expected a string, got {value}"));
            }
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                return Err(format!("field '{name}' expected a boolean, got {value}"));
            }
        }
        FieldType::DateTime => {
            let Some(s) = value.as_str() else {
                return Err(format!("field '{name}' expected a date-time string"));
            };
            if DateTime::parse_from_rfc3339(s).is_err() {
                return Err(format!(
                    "field '{name}' is not a valid RFC 3339 date-time: {s}"
                ));
            }
        }
        FieldType::Array(inner) => {
            let Some(items) = value.as_array() else {
                return Err(format!("field '{name}' expected an array, got {value}"));
            };
            for item in items {
                check_value(name, inner, item)?;
            }
        }
        FieldType::Object(fields) => {
            let Some(obj) = value.as_object() else {
                return Err(format!("field '{name}' expected an object, got {value}"));
            };
            for field in fields {
                if let Some(inner) = obj.get(&field.name) {
                    check_value(&field.name, &field.field_type, inner)?;
                }
            }
        }
    }
    Ok(())
}

fn type_to_json(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::Integer => json!({ "type": ["integer", "null"] }),
        FieldType::Number => json!({ "type": ["number", "null"] }),
        FieldType::String => json!({ "type": ["string", "null"] }),
        FieldType::Boolean => json!({ "type": ["boolean", "null"] }),
        FieldType::DateTime => json!({ "type": ["string", "null"], "format": "date-time" }),
        FieldType::Array(inner) => json!({
            "type": ["array", "null"],
            "items": type_to_json(inner),
        }),
        FieldType::Object(fields) => {
            let mut properties = serde_json::Map::new();
            for field in fields {
                properties.insert(field.name.clone(), type_to_json(&field.field_type));
            }
            json!({
                "type": ["object", "null"],
                "properties": Value::Object(properties),
            })
        }
    }
}
