//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Extracto CLI - Schema-constrained extraction with LLMs
///
/// Render prompt templates, generate free text, and extract structured
/// records from documents through an OpenAI or Azure OpenAI endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "extracto",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "EXTRACTO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a structured record from a document
    Extract(ExtractArgs),

    /// Generate free text from a prompt template
    Generate(GenerateArgs),

    /// Render a prompt template without calling the model
    Render(RenderArgs),

    /// Print the formatting instructions generated for a schema
    Instructions(InstructionsArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Options shared by commands that call the model
#[derive(Parser, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Sampling temperature (overrides configuration)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate (overrides configuration)
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Timeout in seconds for the completion call (overrides configuration)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum retries for transient failures (overrides configuration)
    #[arg(long)]
    pub max_retries: Option<u32>,
}

/// Arguments for the extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Schema file declaring the fields to extract (YAML or JSON)
    #[arg(short, long, value_name = "SCHEMA_FILE")]
    pub schema: PathBuf,

    /// Prompt template file
    #[arg(short, long, value_name = "TEMPLATE_FILE")]
    pub template: PathBuf,

    /// Document to extract from, bound to the `query` placeholder (stdin if omitted)
    #[arg(short, long, value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Additional placeholder value as NAME=VALUE
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Save the record to a file
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Prompt template file
    #[arg(short, long, value_name = "TEMPLATE_FILE")]
    pub template: PathBuf,

    /// Placeholder value as NAME=VALUE
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Prompt template file
    #[arg(short, long, value_name = "TEMPLATE_FILE")]
    pub template: PathBuf,

    /// Schema file; renders the structured prompt with formatting instructions
    #[arg(short, long, value_name = "SCHEMA_FILE")]
    pub schema: Option<PathBuf>,

    /// Document bound to the `query` placeholder
    #[arg(short, long, value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Placeholder value as NAME=VALUE
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

/// Arguments for the instructions command
#[derive(Parser, Debug)]
pub struct InstructionsArgs {
    /// Schema file (YAML or JSON)
    #[arg(short, long, value_name = "SCHEMA_FILE")]
    pub schema: PathBuf,

    /// Print the JSON Schema document instead of the prose instructions
    #[arg(long)]
    pub json_schema: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Print the path of the configuration file in use
    Path,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file (defaults to the user config location)
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Parse a `NAME=VALUE` placeholder binding
fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty placeholder name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
