//! Best-effort recovery of JSON from model output.
//!
//! Models wrap JSON in code fences, leave trailing commas, emit Python-style
//! `None`, or surround the object with prose. Candidates are tried in order:
//! the fence-stripped text, the same text after comma/`None` repair, and the
//! outermost `{...}` span of the repaired text.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::llm_client::LlmError;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("fenced block regex"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma regex"));
static BARE_NONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([:\[,]\s*)None\b").expect("bare None regex"));

/// Parses `text` as `T`, applying the repair heuristics when the raw text does not parse.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let stripped = strip_json_fences(text);

    let first_error = match serde_json::from_str::<T>(stripped) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let repaired = repair_json(stripped);
    if let Ok(value) = serde_json::from_str::<T>(&repaired) {
        return Ok(value);
    }

    if let Some(span) = outermost_object(&repaired) {
        if let Ok(value) = serde_json::from_str::<T>(span) {
            return Ok(value);
        }
    }

    Err(LlmError::MalformedResponse(first_error.to_string()))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
/// When the fence is not at the start, the first fenced block anywhere in the text wins.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(block) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        block.as_str().trim()
    } else {
        text
    }
}

/// Removes trailing commas before `}`/`]` and replaces bare `None` with `null`.
///
/// `None` is only rewritten in value position: after `:`, `[` or `,` and
/// before `,`, `}`, `]` or the end of the text.
pub fn repair_json(text: &str) -> String {
    let without_commas = TRAILING_COMMA.replace_all(text, "$1");
    BARE_NONE
        .replace_all(&without_commas, |caps: &regex::Captures| {
            let end = caps.get(0).map_or(0, |m| m.end());
            let ends_value = without_commas[end..]
                .trim_start()
                .chars()
                .next()
                .map_or(true, |c| matches!(c, ',' | '}' | ']'));
            if ends_value {
                format!("{}null", &caps[1])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
