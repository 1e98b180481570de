/// Envelope Extraction & Validation - Trusting Untrusted Text
///
/// The collaborator is asked for exactly one single-line JSON object, but
/// its output is treated as hostile: it may wrap the object in commentary,
/// fence it in markdown, emit several objects, or regurgitate project
/// vocabulary. This module turns that raw text into a validated
/// `HintEnvelope` or nothing.
///
/// Order of operations: one normalization pass, then first-`{` brace-depth
/// extraction, then a strict parse, then leak validation. A rejection at
/// any step reads as "no envelope" to the pipeline, which retries and then
/// falls back.
use serde::{Deserialize, Serialize};

/// The structured object the collaborator is asked to emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintEnvelope {
    pub problem: String,
    pub fix: String,
    #[serde(default)]
    pub snippet: String,
}

/// Substrings whose presence in any field marks the envelope as leaking
/// project/framework internals.
const LEAK_MARKERS: &[&str] = &[
    "import ",
    "package ",
    "extern crate",
    "use std::",
    "#[",
    "```",
    "mod tests",
];

/// A field spanning more lines than this is a code block, not a hint.
const MAX_FIELD_LINES: usize = 3;

/// Lines rendered from the snippet field.
const MAX_SNIPPET_LINES: usize = 3;

/// Envelopes with less substance than this are noise, not hints.
const MIN_SUBSTANCE_CHARS: usize = 20;

/// Full path from raw collaborator text to a validated envelope.
pub fn parse_envelope(raw: &str) -> Option<HintEnvelope> {
    let normalized = normalize_raw(raw);
    let object = extract_object(&normalized)?;
    let envelope: HintEnvelope = serde_json::from_str(object).ok()?;

    if contains_leak(&envelope) {
        return None;
    }
    if envelope.problem.trim().len() + envelope.fix.trim().len() < MIN_SUBSTANCE_CHARS {
        return None;
    }
    Some(envelope)
}

/// The single deterministic cleanup pass applied to any raw collaborator
/// output: drop markdown fences and echo-style prefix lines, collapse
/// consecutive duplicate lines, normalize line endings.
pub fn normalize_raw(text: &str) -> String {
    let cleaned = text.replace('\r', "");
    let mut lines: Vec<&str> = Vec::new();
    for line in cleaned.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if lower.starts_with("model:") || lower.starts_with("response:") || lower == "json:" {
            continue;
        }
        if lines.last() == Some(&line) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

/// First balanced `{...}` object in the text: scan to the first `{`, walk
/// forward with a brace-depth counter (quote-aware, so braces inside JSON
/// strings do not count), and stop where the depth returns to zero. This
/// tolerates leading and trailing commentary around the object.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn contains_leak(envelope: &HintEnvelope) -> bool {
    [
        envelope.problem.as_str(),
        envelope.fix.as_str(),
        envelope.snippet.as_str(),
    ]
    .iter()
    .any(|field| {
        LEAK_MARKERS.iter().any(|marker| field.contains(marker))
            || field.lines().count() > MAX_FIELD_LINES
    })
}

/// Render a validated envelope: `problem fix`, then the snippet (if any) on
/// its own lines, capped at 3 lines.
pub fn render(envelope: &HintEnvelope) -> String {
    let mut text = format!("{} {}", envelope.problem.trim(), envelope.fix.trim())
        .trim()
        .to_string();
    let snippet = envelope.snippet.trim();
    if !snippet.is_empty() {
        for line in snippet.lines().take(MAX_SNIPPET_LINES) {
            text.push('\n');
            text.push_str(line);
        }
    }
    text
}
