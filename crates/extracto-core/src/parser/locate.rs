//! Best-effort location of a JSON object inside model output
//!
//! Models asked for JSON often wrap it in prose or markdown fences. The
//! search order is: whole text, fenced code blocks, then every `{` from left
//! to right with its balanced closing brace. The first candidate that parses
//! as a JSON object wins; anything around it is ignored. A reply that is
//! entirely a JSON array or scalar has no payload.

use serde_json::{Map, Value};

/// Upper bound on brace spans tried before giving up
const MAX_BRACE_CANDIDATES: usize = 64;

/// Find the first JSON object embedded in `text`
pub fn locate_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim().trim_start_matches('\u{feff}').trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => return Some(map),
        Ok(_) => return None,
        Err(_) => {}
    }

    if let Some(object) = fenced_blocks(trimmed).find_map(parse_object) {
        return Some(object);
    }

    balanced_spans(trimmed).find_map(parse_object)
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Bodies of markdown code fences, with any info string removed
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let open = rest.find("```")?;
        let after_open = &rest[open + 3..];
        // The info string (e.g. `json`) runs to the end of the opening line
        let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_open[body_start..];
        let close = body.find("```")?;
        rest = &body[close + 3..];
        Some(&body[..close])
    })
}

/// `{ ... }` spans with balanced braces, skipping braces inside strings
///
/// Stops at the first opening brace left unbalanced at the end of the text
/// and after [`MAX_BRACE_CANDIDATES`] spans, so the scan stays linear in the
/// length of the reply.
fn balanced_spans(text: &str) -> impl Iterator<Item = &str> {
    let mut starts = text.char_indices().filter(|(_, c)| *c == '{').map(|(i, _)| i);
    let mut remaining = MAX_BRACE_CANDIDATES;

    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let start = starts.next()?;
        // Every later start lies inside this unterminated span
        let end = matching_close(&text[start..])?;
        remaining -= 1;
        Some(&text[start..start + end + 1])
    })
}

/// Byte offset of the brace closing the one at the start of `text`
fn matching_close(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}
