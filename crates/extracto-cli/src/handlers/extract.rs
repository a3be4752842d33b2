//! Extract command handler

use super::utils::{
    build_client, generation_settings, load_schema, placeholder_values, read_file, read_input,
    save_as, QUERY_VAR,
};
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use extracto_core::{retry_request, CompletionClient, Pipeline, PromptRequest};
use tracing::{info, instrument};

/// Handle the extract command
#[instrument(skip_all, fields(schema = %args.schema.display()))]
pub async fn handle_extract(
    args: ExtractArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let client = build_client(config)?;
    extract_with(client, args, config, output).await
}

/// Run an extraction against any completion client
pub async fn extract_with<C: CompletionClient>(
    client: C,
    args: ExtractArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("extract_command", &args.schema.display().to_string());

    let schema = load_schema(&args.schema)?;
    let template = read_file(&args.template)?;

    let has_query_var = args.vars.iter().any(|(name, _)| name == QUERY_VAR);
    let document = if args.input.is_some() || !has_query_var {
        Some(read_input(args.input.as_deref())?)
    } else {
        None
    };
    let values = placeholder_values(args.vars, document);
    let (options, policy) = generation_settings(config, &args.generation);

    let request = PromptRequest {
        template,
        values,
        schema: Some(schema),
    };
    let pipeline = Pipeline::new(client);

    let spinner = output.spinner("Extracting record...");
    let result = retry_request(&policy, || pipeline.run(&request, &options)).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let record = result?
        .into_record()
        .ok_or_else(|| Error::other("model output was not parsed into a record"))?;
    info!(
        fields = record.len(),
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Extraction completed"
    );

    if !record.dropped_keys().is_empty() {
        output.warning(&format!(
            "Ignored keys not declared by the schema: {}",
            record.dropped_keys().join(", ")
        ))?;
    }

    if let Some(path) = &args.save_to {
        save_as(path, &record)?;
        output.success(&format!("✓ Record saved to {}", path.display()))?;
    }

    output.record(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{GenerationArgs, OutputFormat};
    use extracto_core::{CompletionError, CompletionErrorKind, ScriptedCompletionClient};
    use std::fs;
    use std::io::{self, Write};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(
                dir.path().join("record.yaml"),
                "fields:\n  - name: patient_name\n  - name: date_of_birth\n",
            )
            .unwrap();
            fs::write(
                dir.path().join("prompt.txt"),
                "Extract the details.\n{format_instructions}\n{query}\n",
            )
            .unwrap();
            fs::write(dir.path().join("doc.txt"), "Patient Name: John Doe").unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn args(&self) -> ExtractArgs {
            ExtractArgs {
                schema: self.path("record.yaml"),
                template: self.path("prompt.txt"),
                input: Some(self.path("doc.txt")),
                vars: Vec::new(),
                generation: GenerationArgs::default(),
                save_to: None,
            }
        }
    }

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[tokio::test]
    async fn test_extract_saves_record() {
        let fixture = Fixture::new();
        let client = ScriptedCompletionClient::with_text(
            r#"{"patient_name": "John Doe", "date_of_birth": "1985-06-15"}"#,
        );
        let mut args = fixture.args();
        args.save_to = Some(fixture.path("out.json"));

        extract_with(client.clone(), args, &Config::default(), &mut quiet_output())
            .await
            .unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(fixture.path("out.json")).unwrap()).unwrap();
        assert_eq!(
            saved,
            serde_json::json!({"patient_name": "John Doe", "date_of_birth": "1985-06-15"})
        );
        assert!(client.prompts()[0].contains("Patient Name: John Doe"));
    }

    #[tokio::test]
    async fn test_validation_failure_surfaces() {
        let fixture = Fixture::new();
        let client = ScriptedCompletionClient::with_text(r#"{"patient_name": "John Doe"}"#);

        let err = extract_with(client, fixture.args(), &Config::default(), &mut quiet_output())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let fixture = Fixture::new();
        let client = ScriptedCompletionClient::new();
        client.push_error(CompletionError::new(CompletionErrorKind::Server, "overloaded"));
        client.push_text(r#"{"patient_name": "A", "date_of_birth": "B"}"#);

        let mut config = Config::default();
        config.generation.max_retries = 1;

        extract_with(client.clone(), fixture.args(), &config, &mut quiet_output())
            .await
            .unwrap();
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_dropped_keys_warning_stays_out_of_record_output() {
        let fixture = Fixture::new();
        let client = ScriptedCompletionClient::with_text(
            r#"{"patient_name": "John Doe", "date_of_birth": "1985-06-15", "ssn": "000"}"#,
        );
        let data = Captured::default();
        let diagnostics = Captured::default();
        let mut output = OutputWriter::with_writers(
            OutputFormat::Human,
            false,
            false,
            Box::new(data.clone()),
            Box::new(diagnostics.clone()),
        );

        extract_with(client, fixture.args(), &Config::default(), &mut output)
            .await
            .unwrap();

        assert_eq!(
            data.contents(),
            "patient_name:   John Doe\ndate_of_birth:  1985-06-15\n"
        );
        assert!(diagnostics.contents().contains("ssn"));
    }

    #[tokio::test]
    async fn test_query_var_replaces_stdin() {
        let fixture = Fixture::new();
        let client = ScriptedCompletionClient::with_text(
            r#"{"patient_name": "Jane Roe", "date_of_birth": "1990-01-01"}"#,
        );
        let mut args = fixture.args();
        args.input = None;
        args.vars = vec![("query".to_string(), "Patient Name: Jane Roe".to_string())];

        extract_with(client.clone(), args, &Config::default(), &mut quiet_output())
            .await
            .unwrap();
        assert!(client.prompts()[0].contains("Patient Name: Jane Roe"));
    }
}
