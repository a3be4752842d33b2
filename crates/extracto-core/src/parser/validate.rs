//! Validation of a located payload against a schema

use crate::error::{Error, Result};
use crate::types::{Record, Schema};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

/// Turn a JSON object into a record for `schema`
///
/// Undeclared keys are dropped with a warning. Strings are kept verbatim,
/// numbers and booleans become their JSON text, and `null` counts as absent.
pub fn validate_object(schema: &Schema, mut object: Map<String, Value>) -> Result<Record> {
    let mut values = IndexMap::with_capacity(schema.len());
    let mut missing = Vec::new();
    let mut mistyped = Vec::new();

    for field in schema.fields() {
        match object.remove(&field.name) {
            Some(Value::String(s)) => {
                values.insert(field.name.clone(), s);
            }
            Some(Value::Number(n)) => {
                values.insert(field.name.clone(), n.to_string());
            }
            Some(Value::Bool(b)) => {
                values.insert(field.name.clone(), b.to_string());
            }
            Some(Value::Array(_)) | Some(Value::Object(_)) => mistyped.push(field.name.clone()),
            Some(Value::Null) | None => {
                if field.required {
                    missing.push(field.name.clone());
                }
            }
        }
    }

    let dropped_keys: Vec<String> = object.keys().cloned().collect();
    if !dropped_keys.is_empty() {
        warn!(keys = ?dropped_keys, "Dropping keys not declared by the schema");
    }

    if !mistyped.is_empty() {
        return Err(Error::Validation {
            message: format!("expected string values for: {}", mistyped.join(", ")),
            missing,
        });
    }

    if !missing.is_empty() {
        return Err(Error::Validation {
            message: format!("missing required fields: {}", missing.join(", ")),
            missing,
        });
    }

    Ok(Record::new(values, dropped_keys))
}
