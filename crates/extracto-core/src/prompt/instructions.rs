//! Machine-generated formatting instructions for structured output

use crate::types::Schema;
use serde_json::{json, Map, Value};

/// JSON Schema document describing the expected payload
pub fn json_schema(schema: &Schema) -> Value {
    let mut properties = Map::new();
    for field in schema.fields() {
        let mut property = Map::new();
        if !field.description.is_empty() {
            property.insert("description".to_string(), json!(field.description));
        }
        property.insert("type".to_string(), json!("string"));
        properties.insert(field.name.clone(), Value::Object(property));
    }

    let required: Vec<&str> = schema.required_names().collect();
    let mut document = json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    });
    if let Some(name) = schema.name() {
        document["title"] = json!(name);
    }
    document
}

/// Describe the output contract for `schema` in prose plus JSON Schema
pub fn format_instructions(schema: &Schema) -> String {
    let keys = schema
        .fields()
        .iter()
        .map(|f| format!("\"{}\"", f.name))
        .collect::<Vec<_>>()
        .join(", ");

    let field_lines = schema
        .fields()
        .iter()
        .map(|f| {
            let presence = if f.required { "required" } else { "optional" };
            if f.description.is_empty() {
                format!("- \"{}\" ({})", f.name, presence)
            } else {
                format!("- \"{}\" ({}): {}", f.name, presence, f.description)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let schema_text =
        serde_json::to_string(&json_schema(schema)).unwrap_or_else(|_| "{}".to_string());

    format!(
        "The output should be formatted as a single well-formed JSON object that conforms to the JSON schema below.\n\
         The object must have exactly these keys: {keys}. Do not add any other keys, and use a string for every value.\n\
         \n\
         Fields:\n\
         {field_lines}\n\
         \n\
         Here is the output schema:\n\
         ```\n\
         {schema_text}\n\
         ```"
    )
}
