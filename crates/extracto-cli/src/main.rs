//! Extracto CLI - Command-line interface for schema-constrained extraction
//!
//! This is the main entry point for the Extracto CLI application, providing
//! commands for rendering prompts, generating text and extracting structured
//! records through an OpenAI-compatible or Azure OpenAI endpoint.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    control::set_override(cli.use_color());

    // Credentials may live in a local .env file
    dotenv::dotenv().ok();

    let result = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => {
            if let Err(e) = init_logging(&cli, &config) {
                eprintln!("Failed to initialize logging: {}", e);
            }
            run(cli, config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip_all, fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        config = ?config.source,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Extract(args) => handlers::handle_extract(args, &config, &mut output).await,
        Commands::Generate(args) => handlers::handle_generate(args, &config, &mut output).await,
        Commands::Render(args) => handlers::handle_render(args, &mut output),
        Commands::Instructions(args) => handlers::handle_instructions(args, &mut output),
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_file(&config.logging, cli.verbosity_level());
    logging_config.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["extracto", "render", "--template", "prompt.txt"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["extracto", "-vv", "render", "--template", "prompt.txt"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["extracto", "--quiet", "config", "path"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
