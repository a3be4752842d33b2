//! Prompt rendering
//!
//! Merges a template with named input values and, for structured extraction,
//! injects formatting instructions describing the target schema.

pub mod instructions;
pub mod template;

pub use instructions::{format_instructions, json_schema};
pub use template::PromptTemplate;

use crate::error::Result;
use crate::types::PromptRequest;

/// Placeholder that receives generated formatting instructions
pub const FORMAT_INSTRUCTIONS_VAR: &str = "format_instructions";

/// Renders prompt requests into prompt strings
#[derive(Debug, Clone)]
pub struct PromptRenderer {
    instructions_var: String,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self {
            instructions_var: FORMAT_INSTRUCTIONS_VAR.to_string(),
        }
    }
}

impl PromptRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different placeholder name for the formatting instructions
    pub fn with_instructions_var(mut self, name: impl Into<String>) -> Self {
        self.instructions_var = name.into();
        self
    }

    /// Render a request into the final prompt text
    ///
    /// With a schema, the formatting instructions fill the instructions
    /// placeholder when the template declares it and the caller left it
    /// unset; otherwise they are appended after a blank line.
    pub fn render(&self, request: &PromptRequest) -> Result<String> {
        let template = PromptTemplate::parse(&request.template)?;

        let Some(schema) = &request.schema else {
            return template.render(&request.values);
        };

        let instructions = format_instructions(schema);
        if template.has_variable(&self.instructions_var)
            && !request.values.contains_key(&self.instructions_var)
        {
            return template
                .partial(self.instructions_var.clone(), instructions)
                .render(&request.values);
        }

        let mut prompt = template.render(&request.values)?;
        let separator = if prompt.is_empty() || prompt.ends_with("\n\n") {
            ""
        } else if prompt.ends_with('\n') {
            "\n"
        } else {
            "\n\n"
        };
        prompt.push_str(separator);
        prompt.push_str(&instructions);
        Ok(prompt)
    }
}
