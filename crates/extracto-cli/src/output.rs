//! Output formatting and writing utilities
//!
//! Formats records, generated text and arbitrary serializable values as
//! human-readable text, JSON or YAML, and drives the progress spinner.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use extracto_core::Record;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format an extracted record
    fn format_record(&self, record: &Record) -> Result<String>;

    /// Format generated free text
    fn format_text(&self, text: &str) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => {
                Ok(serde_json::to_string_pretty(value)?)
            }
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_record(&self, record: &Record) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_record_human(record)),
            _ => self.format(record),
        }
    }

    fn format_text(&self, text: &str) -> Result<String> {
        #[derive(Serialize)]
        struct TextOutput<'a> {
            text: &'a str,
        }

        match self {
            OutputFormat::Human => Ok(text.to_string()),
            _ => self.format(&TextOutput { text }),
        }
    }
}

/// Output writer that handles different output formats and colors
///
/// Data goes to `writer`; warnings go to `diagnostics` so piped output only
/// carries data.
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
    diagnostics: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
            diagnostics: Box::new(io::stderr()),
        }
    }

    /// Create an output writer with a custom writer, discarding diagnostics
    #[cfg(test)]
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self::with_writers(format, use_color, quiet, writer, Box::new(io::sink()))
    }

    /// Create an output writer with custom data and diagnostics writers
    #[cfg(test)]
    pub fn with_writers(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
        diagnostics: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
            diagnostics,
        }
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message to the diagnostics stream
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.use_color {
            writeln!(self.diagnostics, "{}", message.yellow())?;
        } else {
            writeln!(self.diagnostics, "WARNING: {}", message)?;
        }
        self.diagnostics.flush()?;
        Ok(())
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);
        trace!(data = %value_json, "Writing data");

        let formatted = self.format.format(value)?;
        self.emit(&formatted)
    }

    /// Write an extracted record
    pub fn record(&mut self, record: &Record) -> Result<()> {
        let formatted = self.format.format_record(record)?;
        self.emit(&formatted)
    }

    /// Write generated or rendered text
    pub fn text(&mut self, text: &str) -> Result<()> {
        let formatted = self.format.format_text(text)?;
        self.emit(&formatted)
    }

    // YAML already ends with a newline
    fn emit(&mut self, formatted: &str) -> Result<()> {
        if formatted.ends_with('\n') {
            self.write(formatted)
        } else {
            self.writeln(formatted)
        }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Format a record as aligned `name: value` lines
fn format_record_human(record: &Record) -> String {
    let width = record.keys().map(str::len).max().unwrap_or(0);

    record
        .iter()
        .map(|(name, value)| {
            let mut lines = value.lines();
            let first = lines.next().unwrap_or("");
            let mut out = format!("{:width$}  {}", format!("{}:", name), first, width = width + 1);
            // Continuation lines stay aligned under the first value line
            for line in lines {
                out.push('\n');
                out.push_str(&" ".repeat(width + 3));
                out.push_str(line);
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
