//! Render and instructions command handlers

use super::utils::{load_schema, placeholder_values, read_file};
use crate::cli::{InstructionsArgs, RenderArgs};
use crate::error::Result;
use crate::output::OutputWriter;
use extracto_core::prompt::json_schema;
use extracto_core::{format_instructions, PromptRenderer, PromptRequest};

/// Handle the render command
pub fn handle_render(args: RenderArgs, output: &mut OutputWriter) -> Result<()> {
    let schema = args.schema.as_deref().map(load_schema).transpose()?;
    let document = args.input.as_deref().map(read_file).transpose()?;

    let request = PromptRequest {
        template: read_file(&args.template)?,
        values: placeholder_values(args.vars, document),
        schema,
    };
    let prompt = PromptRenderer::default().render(&request)?;
    output.text(&prompt)
}

/// Handle the instructions command
pub fn handle_instructions(args: InstructionsArgs, output: &mut OutputWriter) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    if args.json_schema {
        output.data(&json_schema(&schema))
    } else {
        output.text(&format_instructions(&schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::error::Error;
    use std::fs;

    fn sink() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, false, Box::new(std::io::sink()))
    }

    #[test]
    fn test_render_reports_missing_variable() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("p.txt");
        fs::write(&template, "{policy_type} in {country}").unwrap();

        let args = RenderArgs {
            template,
            schema: None,
            input: None,
            vars: vec![("country".to_string(), "Thailand".to_string())],
        };
        let err = handle_render(args, &mut sink()).unwrap_err();
        assert!(matches!(
            err,
            Error::Core(extracto_core::Error::MissingVariable { ref name }) if name == "policy_type"
        ));
    }

    #[test]
    fn test_render_with_schema_and_input() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("p.txt");
        let schema = dir.path().join("s.json");
        let input = dir.path().join("doc.txt");
        fs::write(&template, "{format_instructions}\n{query}").unwrap();
        fs::write(&schema, r#"{"fields": [{"name": "gender"}]}"#).unwrap();
        fs::write(&input, "Gender: Male").unwrap();

        let args = RenderArgs {
            template,
            schema: Some(schema),
            input: Some(input),
            vars: Vec::new(),
        };
        handle_render(args, &mut sink()).unwrap();
    }

    #[test]
    fn test_instructions_for_missing_schema() {
        let args = InstructionsArgs {
            schema: "/nonexistent/schema.yaml".into(),
            json_schema: false,
        };
        let err = handle_instructions(args, &mut sink()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
