//! Cleaning and parsing free-form model output.
//!
//! Local models wrap answers in reasoning blocks, markdown fences and chatty
//! preambles. These helpers peel that away so callers can deserialize the
//! payload and fall back to a fixed object when nothing usable remains.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";
const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("valid fenced json regex"));
static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object regex"));
static ARRAY_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid array regex"));

/// Drop a leading `<think>` block.
///
/// The block is only removed when it precedes both the first fenced json block
/// and the first `{`; otherwise the reply is discussing reasoning markup and is
/// kept verbatim.
pub fn strip_reasoning(raw: &str) -> String {
    let think_start = raw.find(THINK_OPEN);
    let json_start = raw.find(JSON_FENCE);
    let content_start = raw.find('{');

    let Some(think) = think_start else {
        return raw.to_string();
    };
    let before = |other: Option<usize>| other.map_or(true, |pos| think < pos);
    if !(before(json_start) && before(content_start)) {
        return raw.to_string();
    }

    let mut cleaned = match raw.find(THINK_CLOSE) {
        Some(end) => raw[end + THINK_CLOSE.len()..].to_string(),
        None => raw.to_string(),
    };

    if let Some(body) = FENCED_JSON.captures(&cleaned).and_then(|c| c.get(1)) {
        cleaned = body.as_str().to_string();
    }

    cleaned
}

/// Body of the first markdown fence, preferring a json-tagged one.
fn unfence(text: &str) -> &str {
    if let Some((_, rest)) = text.split_once(JSON_FENCE) {
        return rest.split(FENCE).next().unwrap_or(rest).trim();
    }
    if text.contains(FENCE) {
        return text.split(FENCE).nth(1).unwrap_or(text).trim();
    }
    text
}

/// Best-effort JSON candidate: unfenced text, then the widest `{...}` span.
pub fn extract_json(raw: &str) -> String {
    let candidate = unfence(raw.trim());
    match OBJECT_SPAN.find(candidate) {
        Some(m) => m.as_str().to_string(),
        None => candidate.to_string(),
    }
}

/// Deserialize the JSON payload embedded in a model reply.
///
/// Tries the unfenced text as-is, then the widest object span, then the
/// widest array span.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let candidate = unfence(raw.trim());
    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    [&*OBJECT_SPAN, &*ARRAY_SPAN]
        .iter()
        .filter_map(|re| re.find(candidate))
        .find_map(|m| serde_json::from_str(m.as_str()).ok())
}
