//! Models rarely return bare JSON. They wrap it in markdown fences or put a
//! sentence in front of it, so the payload is located before parsing.

use super::AgentError;
use serde::de::DeserializeOwned;

/// Locate the JSON document inside a model response.
///
/// Tries, in order: the whole response, the first fenced code block, and the
/// span from the first opening bracket to its last matching closer.
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return None;
    }
    if looks_like_json(trimmed) {
        return Some(trimmed);
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if looks_like_json(fenced) {
            return Some(fenced);
        }
    }

    let start = trimmed.find(['{', '['])?;
    let closer = if trimmed[start..].starts_with('{') { '}' } else { ']' };
    let end = trimmed.rfind(closer)?;
    (end > start).then(|| &trimmed[start..=end])
}

/// Parse a model response into `T`, reporting which agent misbehaved.
pub fn parse_structured<T: DeserializeOwned>(
    agent: &'static str,
    response: &str,
) -> Result<T, AgentError> {
    let payload = extract_json(response).ok_or_else(|| AgentError::MalformedOutput {
        agent,
        reason: "no JSON document in response".to_string(),
    })?;

    serde_json::from_str(payload).map_err(|e| AgentError::MalformedOutput {
        agent,
        reason: e.to_string(),
    })
}

fn looks_like_json(text: &str) -> bool {
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    // skip the info string ("json", "JSON", ...)
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}
