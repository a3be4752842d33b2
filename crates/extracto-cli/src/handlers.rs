//! Command handlers for CLI subcommands
//!
//! This module contains the implementation logic for each CLI subcommand.

mod completions;
mod config;
mod extract;
mod generate;
mod render;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use extract::handle_extract;
pub use generate::handle_generate;
pub use render::{handle_instructions, handle_render};
