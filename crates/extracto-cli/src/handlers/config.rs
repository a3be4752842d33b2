//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction;
use crate::output::OutputWriter;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Path => handle_config_path(config, output),
    }
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let mut value = serde_json::to_value(config)?;
    redaction::redact_json_value(&mut value);

    let content = match args.format {
        ConfigFormat::Json => serde_json::to_string_pretty(&value)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&value)?,
    };

    match &config.source {
        Some(path) => output.info(&format!("Loaded from {}", path.display()))?,
        None => output.info("No configuration file found; showing defaults")?,
    }
    output.write(&content)?;
    if !content.ends_with('\n') {
        output.writeln("")?;
    }
    Ok(())
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::sample().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Set the API key in the environment variable named by provider.api_key_env.")?;
    Ok(())
}

/// Handle config path subcommand
fn handle_config_path(config: &Config, output: &mut OutputWriter) -> Result<()> {
    match &config.source {
        Some(path) => output.writeln(&path.display().to_string()),
        None => {
            let searched: Vec<String> = Config::default_config_paths()
                .iter()
                .map(|path| format!("  {}", path.display()))
                .collect();
            output.warning(&format!(
                "No configuration file found; searched:\n{}",
                searched.join("\n")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::fs;

    fn sink() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        handle_config_init(
            ConfigInitArgs {
                path: Some(path.clone()),
                force: false,
            },
            &mut sink(),
        )
        .unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.provider, Config::sample().provider);
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "generation:\n  max_retries: 4\n").unwrap();

        let args = ConfigInitArgs {
            path: Some(path.clone()),
            force: false,
        };
        handle_config_init(args, &mut sink()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().generation.max_retries, 4);

        let args = ConfigInitArgs {
            path: Some(path.clone()),
            force: true,
        };
        handle_config_init(args, &mut sink()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().generation.max_retries, 0);
    }
}
