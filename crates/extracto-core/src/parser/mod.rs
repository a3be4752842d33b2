//! Response parsing
//!
//! Free-text mode returns the completion unchanged. Structured mode locates a
//! JSON object in the completion and validates it against the schema.

pub mod locate;
pub mod validate;

pub use locate::locate_object;
pub use validate::validate_object;

use crate::error::{Error, Result};
use crate::types::{Output, Record, Schema};

/// Converts raw completion text into an [`Output`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseParser {
    /// Identity transform
    FreeText,
    /// Locate and validate a payload for the schema
    Structured(Schema),
}

impl ResponseParser {
    /// Parser for the mode implied by an optional schema
    pub fn for_schema(schema: Option<&Schema>) -> Self {
        match schema {
            Some(schema) => ResponseParser::Structured(schema.clone()),
            None => ResponseParser::FreeText,
        }
    }

    pub fn parse(&self, text: &str) -> Result<Output> {
        match self {
            ResponseParser::FreeText => Ok(Output::Text(text.to_string())),
            ResponseParser::Structured(schema) => parse_record(schema, text).map(Output::Record),
        }
    }
}

/// Structured-mode parse of `text` against `schema`
pub fn parse_record(schema: &Schema, text: &str) -> Result<Record> {
    let object = locate_object(text)
        .ok_or_else(|| Error::parse("no JSON object found in model output", text))?;
    validate_object(schema, object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldSpec;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::required("patient_name", "name of the patient"),
            FieldSpec::required("date_of_birth", "date of birth of the patient"),
        ])
        .unwrap()
    }

    #[test]
    fn test_free_text_is_identity() {
        let output = ResponseParser::FreeText.parse("Hello world").unwrap();
        assert_eq!(output, Output::Text("Hello world".to_string()));

        let output = ResponseParser::for_schema(None).parse("  spaced\n").unwrap();
        assert_eq!(output.as_text(), Some("  spaced\n"));
    }

    #[test]
    fn test_structured_scenario() {
        let parser = ResponseParser::for_schema(Some(&schema()));
        let output = parser
            .parse(r#"Here is the data: {"patient_name": "John Doe", "date_of_birth": "1985-06-15"}"#)
            .unwrap();
        let record = output.into_record().unwrap();
        assert_eq!(record.get("patient_name"), Some("John Doe"));
        assert_eq!(record.get("date_of_birth"), Some("1985-06-15"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_structured_without_payload() {
        let err = parse_record(&schema(), "I could not find any patient details.").unwrap_err();
        match err {
            Error::Parse { excerpt, .. } => {
                assert_eq!(excerpt, "I could not find any patient details.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_structured_missing_field() {
        let err = parse_record(&schema(), r#"{"patient_name": "John Doe"}"#).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
