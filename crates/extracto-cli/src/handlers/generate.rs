//! Generate command handler

use super::utils::{build_client, generation_settings, placeholder_values, read_file};
use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use extracto_core::{retry_request, CompletionClient, Pipeline, PromptRequest};
use tracing::instrument;

/// Handle the generate command
#[instrument(skip_all, fields(template = %args.template.display()))]
pub async fn handle_generate(
    args: GenerateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let client = build_client(config)?;
    generate_with(client, args, config, output).await
}

/// Run free-text generation against any completion client
pub async fn generate_with<C: CompletionClient>(
    client: C,
    args: GenerateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("generate_command", &args.template.display().to_string());

    let request = PromptRequest {
        template: read_file(&args.template)?,
        values: placeholder_values(args.vars, None),
        schema: None,
    };
    let (options, policy) = generation_settings(config, &args.generation);
    let pipeline = Pipeline::new(client);

    let spinner = output.spinner("Generating...");
    let result = retry_request(&policy, || pipeline.run(&request, &options)).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let text = result?
        .into_text()
        .ok_or_else(|| Error::other("expected free text from the model"))?;
    output.text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{GenerationArgs, OutputFormat};
    use extracto_core::ScriptedCompletionClient;
    use std::fs;

    #[tokio::test]
    async fn test_generate_fills_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("insurance.prompt");
        fs::write(&template, "Explain {policy_type} insurance in {country}.").unwrap();

        let client = ScriptedCompletionClient::with_text("It covers hospital stays.");
        let args = GenerateArgs {
            template,
            vars: vec![
                ("policy_type".to_string(), "health".to_string()),
                ("country".to_string(), "Thailand".to_string()),
            ],
            generation: GenerationArgs::default(),
        };
        let mut output =
            OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(std::io::sink()));

        generate_with(client.clone(), args, &Config::default(), &mut output)
            .await
            .unwrap();
        assert_eq!(client.prompts(), vec!["Explain health insurance in Thailand."]);
    }

    #[tokio::test]
    async fn test_missing_variable_skips_model() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("insurance.prompt");
        fs::write(&template, "Explain {policy_type} insurance in {country}.").unwrap();

        let client = ScriptedCompletionClient::with_text("unused");
        let args = GenerateArgs {
            template,
            vars: vec![("country".to_string(), "Thailand".to_string())],
            generation: GenerationArgs::default(),
        };
        let mut output =
            OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(std::io::sink()));

        let err = generate_with(client.clone(), args, &Config::default(), &mut output)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(client.calls(), 0);
    }
}
