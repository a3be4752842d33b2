//! Prompt templates with `{name}` placeholders
//!
//! `{{` and `}}` render as literal braces. Any other brace is a syntax error,
//! so a typo in a placeholder is reported at parse time instead of leaking
//! into the prompt.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
static NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|\{|\}").expect("token pattern is valid")
    })
}

fn name_regex() -> &'static Regex {
    NAME_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("name pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed prompt template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    /// Parse template text into literals and placeholders
    pub fn parse(text: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in token_regex().captures_iter(text) {
            let token = caps.get(0).expect("capture 0 is the whole match");
            literal.push_str(&text[last..token.start()]);
            last = token.end();

            match token.as_str() {
                "{{" => literal.push('{'),
                "}}" => literal.push('}'),
                "{" | "}" => {
                    return Err(Error::InvalidTemplate {
                        message: format!("unmatched '{}'", token.as_str()),
                        position: token.start(),
                    });
                }
                _ => {
                    let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    if !name_regex().is_match(name) {
                        return Err(Error::InvalidTemplate {
                            message: format!("invalid placeholder name '{}'", name),
                            position: token.start(),
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_string()));
                }
            }
        }

        literal.push_str(&text[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            segments,
            partials: HashMap::new(),
        })
    }

    /// Pre-bind a placeholder value; caller-supplied values take precedence
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    /// Placeholder names in order of first appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Placeholders that still need a value from the caller
    pub fn input_variables(&self) -> Vec<&str> {
        self.variables()
            .into_iter()
            .filter(|name| !self.partials.contains_key(*name))
            .collect()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(n) if n == name))
    }

    /// Substitute every placeholder verbatim
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = values
                        .get(name)
                        .or_else(|| self.partials.get(name))
                        .ok_or_else(|| Error::MissingVariable { name: name.clone() })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}
