//! Lenient JSON extraction for model output.
//!
//! JSON-mode responses are usually clean, but models still occasionally wrap
//! the document in a markdown fence, surround it with prose, or leave a
//! trailing comma. Anything beyond that is reported as a malformed response
//! so the gateway can retry.

use serde_json::Value;
use tracing::debug;

use crate::types::ServiceError;

/// Parse the JSON document contained in a model response
pub fn extract_json(raw: &str) -> Result<Value, ServiceError> {
    let cleaned = preprocess(raw);

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }

    debug!("Direct JSON parse failed, trying lenient extraction");

    let candidate = embedded_document(&cleaned).unwrap_or(&cleaned);
    let repaired = strip_trailing_commas(candidate);
    serde_json::from_str::<Value>(&repaired).map_err(|e| {
        ServiceError::new(format!(
            "Malformed JSON in model response ({}): {}...",
            e,
            cleaned.chars().take(120).collect::<String>()
        ))
    })
}

fn preprocess(raw: &str) -> String {
    let mut s = raw.trim().trim_start_matches('\u{feff}');

    if s.starts_with("```")
        && let Some(first_newline) = s.find('\n')
    {
        s = &s[first_newline + 1..];
    }
    if let Some(stripped) = s.trim_end().strip_suffix("```") {
        s = stripped;
    }

    s.trim().to_string()
}

/// First balanced `{...}` or `[...]` in mixed content
fn embedded_document(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in s[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

fn strip_trailing_commas(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escape = false;

    for (i, &ch) in chars.iter().enumerate() {
        if escape {
            escape = false;
            result.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']') | Some('}')) {
                    continue;
                }
            }
            _ => {}
        }
        result.push(ch);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let value = extract_json(r#"{"word": "terse"}"#).unwrap();
        assert_eq!(value["word"], "terse");
    }

    #[test]
    fn test_fenced_json() {
        let value = extract_json("```json\n{\"word\": \"terse\"}\n```").unwrap();
        assert_eq!(value["word"], "terse");
    }

    #[test]
    fn test_json_inside_prose() {
        let input = "Sure! Here are the details:\n{\"word\": \"wry\", \"examples\": [\"a wry smile\"]}\nEnjoy.";
        let value = extract_json(input).unwrap();
        assert_eq!(value["examples"][0], "a wry smile");
    }

    #[test]
    fn test_trailing_comma() {
        let value = extract_json(r#"{"synonyms": ["brief", "curt",],}"#).unwrap();
        assert_eq!(value["synonyms"][1], "curt");
    }

    #[test]
    fn test_comma_inside_string_kept() {
        let value = extract_json(r#"{"definition": "short, to the point",}"#).unwrap();
        assert_eq!(value["definition"], "short, to the point");
    }

    #[test]
    fn test_garbage_is_error() {
        let err = extract_json("I cannot help with that.").unwrap_err();
        assert!(err.message.starts_with("Malformed JSON"));
        assert!(err.status_code.is_none());
    }
}
