//! JSON payload extraction from model responses.
//!
//! Models often wrap JSON in markdown fences or surround it with prose.
//! Extraction handles nested braces and string escaping, and reports
//! `None` when no object can be recovered.

use serde_json::Value;

/// Extract the first JSON object from a model response.
///
/// Tries, in order:
/// 1. the whole response
/// 2. a ` ```json ` fenced block, then a bare ` ``` ` fenced block
/// 3. each `{` in the text, parsing from there or cutting at the balancing `}`
pub fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    for fenced in fenced_blocks(trimmed) {
        if let Some(value) = first_object(fenced) {
            return Some(value);
        }
    }

    first_object(trimmed)
}

/// Contents of markdown code fences, `json`-tagged ones first.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut tagged = Vec::new();
    let mut bare = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let Some(end) = after.find("```") else {
            break;
        };
        let block = &after[..end];
        match block.strip_prefix("json") {
            Some(inner) => tagged.push(inner.trim()),
            None => bare.push(block.trim()),
        }
        rest = &after[end + 3..];
    }

    tagged.extend(bare);
    tagged
}

fn first_object(text: &str) -> Option<Value> {
    for (start_idx, _) in text.match_indices('{') {
        let candidate = &text[start_idx..];

        // Fast path: a streaming parse stops at the end of the first value.
        let mut stream = serde_json::Deserializer::from_str(candidate).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            return Some(value);
        }

        if let Some(slice) = balanced_braces(candidate)
            && let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(slice)
        {
            return Some(value);
        }
    }

    None
}

/// Slice of `text` from its leading `{` to the matching `}`, ignoring
/// braces inside string literals.
fn balanced_braces(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}
