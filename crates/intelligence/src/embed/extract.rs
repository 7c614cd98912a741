//! Value → embeddable text extraction.

use strata_core::Value;

/// Maximum text length sent to the tokenizer (≈256 tokens).
const MAX_TEXT_LEN: usize = 1024;

/// Maximum recursion depth for nested Array/Object values.
const MAX_DEPTH: usize = 16;

/// Extract embeddable text from a Value.
///
/// Returns `None` for values that are not meaningful to embed (Null, Bytes).
/// Nested structures are traversed up to `MAX_DEPTH` levels to prevent
/// stack overflow on pathologically deep documents.
pub fn extract_text(value: &Value) -> Option<String> {
    let text = extract_text_inner(value, 0)?;

    if text.len() > MAX_TEXT_LEN {
        // Find the last char boundary at or before MAX_TEXT_LEN to avoid
        // panicking on multi-byte UTF-8 characters.
        let mut end = MAX_TEXT_LEN;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        Some(text[..end].to_string())
    } else {
        Some(text)
    }
}

fn extract_text_inner(value: &Value, depth: usize) -> Option<String> {
    match value {
        Value::String(s) => {
            if s.is_empty() {
                return None;
            }
            Some(s.clone())
        }
        Value::Int(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        Value::Bytes(_) => None,
        Value::Array(arr) => {
            if depth >= MAX_DEPTH {
                return None;
            }
            let parts: Vec<String> = arr
                .iter()
                .filter_map(|v| extract_text_inner(v, depth + 1))
                .collect();
            if parts.is_empty() {
                return None;
            }
            Some(parts.join(" "))
        }
        Value::Object(map) => {
            if depth >= MAX_DEPTH {
                return None;
            }
            let mut parts: Vec<String> = Vec::new();
            // Sort keys for deterministic output
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                if let Some(val_text) = extract_text_inner(&map[key], depth + 1) {
                    parts.push(format!("{}: {}", key, val_text));
                }
            }
            if parts.is_empty() {
                return None;
            }
            Some(parts.join(" "))
        }
    }
}
