// Tests for output formatting
//
// Records, generated text and plain data in every output format, written
// through a shared in-memory buffer.

use super::*;
use extracto_core::parser::parse_record;
use extracto_core::{FieldSpec, Schema};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, false, Box::new(buffer.clone()));
    (writer, buffer)
}

fn sample_record() -> Record {
    let schema = Schema::new(vec![
        FieldSpec::required("patient_name", "name of the patient"),
        FieldSpec::required("gender", "gender of the patient"),
    ])
    .unwrap();
    parse_record(&schema, r#"{"gender": "Male", "patient_name": "John Doe"}"#).unwrap()
}

#[test]
fn test_record_human_is_aligned_in_schema_order() {
    let (mut out, buffer) = writer(OutputFormat::Human);
    out.record(&sample_record()).unwrap();

    assert_eq!(
        buffer.contents(),
        "patient_name:  John Doe\ngender:        Male\n"
    );
}

#[test]
fn test_record_json_keeps_schema_order() {
    let (mut out, buffer) = writer(OutputFormat::Json);
    out.record(&sample_record()).unwrap();

    assert_eq!(
        buffer.contents(),
        "{\"patient_name\":\"John Doe\",\"gender\":\"Male\"}\n"
    );
}

#[test]
fn test_record_yaml() {
    let (mut out, buffer) = writer(OutputFormat::Yaml);
    out.record(&sample_record()).unwrap();

    assert_eq!(buffer.contents(), "patient_name: John Doe\ngender: Male\n");
}

#[test]
fn test_text_human_is_verbatim() {
    let (mut out, buffer) = writer(OutputFormat::Human);
    out.text("Coverage:\n- hospital stays").unwrap();
    assert_eq!(buffer.contents(), "Coverage:\n- hospital stays\n");
}

#[test]
fn test_text_json_is_wrapped() {
    let (mut out, buffer) = writer(OutputFormat::Json);
    out.text("hello").unwrap();
    assert_eq!(buffer.contents(), "{\"text\":\"hello\"}\n");
}

#[test]
fn test_multiline_values_stay_aligned() {
    let schema = Schema::new(vec![FieldSpec::required("history", "")]).unwrap();
    let record = parse_record(&schema, r#"{"history": "asthma\nknee surgery"}"#).unwrap();

    let formatted = OutputFormat::Human.format_record(&record).unwrap();
    assert_eq!(formatted, "history:  asthma\n          knee surgery");
}

#[test]
fn test_messages_only_in_human_format() {
    let (mut out, buffer) = writer(OutputFormat::Json);
    out.info("loading").unwrap();
    out.success("done").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut out, buffer) = writer(OutputFormat::Human);
    out.info("loading").unwrap();
    out.success("done").unwrap();
    assert_eq!(buffer.contents(), "INFO: loading\ndone\n");
}

#[test]
fn test_warnings_go_to_diagnostics_not_data() {
    for format in [OutputFormat::Human, OutputFormat::Json, OutputFormat::Yaml] {
        let data = SharedBuffer::default();
        let diagnostics = SharedBuffer::default();
        let mut out = OutputWriter::with_writers(
            format,
            false,
            true,
            Box::new(data.clone()),
            Box::new(diagnostics.clone()),
        );

        out.warning("Ignored keys not declared by the schema: extra").unwrap();
        out.text("result").unwrap();

        assert!(!data.contents().contains("Ignored keys"), "{format:?}");
        assert_eq!(
            diagnostics.contents(),
            "WARNING: Ignored keys not declared by the schema: extra\n"
        );
    }
}

#[test]
fn test_quiet_suppresses_info() {
    let buffer = SharedBuffer::default();
    let mut out = OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(buffer.clone()));
    out.info("loading").unwrap();
    out.success("done").unwrap();
    out.text("result").unwrap();
    assert_eq!(buffer.contents(), "result\n");
}

#[test]
fn test_no_spinner_without_terminal() {
    let (out, _) = writer(OutputFormat::Human);
    assert!(out.spinner("Waiting for model...").is_none());
}
