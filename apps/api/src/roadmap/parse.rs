//! Best-effort extraction of a roadmap document from raw model output.
//!
//! The model is asked for pure JSON but replies with whatever it likes:
//! fenced blocks, prose around the object, stray `\_` escapes. Extraction
//! tries progressively harder and never errors; a reply that defeats every
//! step comes back as [`Extraction::Raw`] so the caller can show the text
//! as-is.

use crate::roadmap::model::RoadmapDocument;

/// Outcome of reading structured data out of a model reply.
#[derive(Debug)]
pub enum Extraction {
    Roadmap(Box<RoadmapDocument>),
    Raw(String),
}

/// Attempts to pull a roadmap document out of `text`. Falls back to the
/// full untouched reply when nothing parseable is found.
pub fn extract(text: &str) -> Extraction {
    match try_parse(text) {
        Some(document) => Extraction::Roadmap(Box::new(document)),
        None => Extraction::Raw(text.to_string()),
    }
}

fn try_parse(text: &str) -> Option<RoadmapDocument> {
    let unfenced = strip_code_fences(text);
    let span = json_span(unfenced)?;

    if let Ok(document) = serde_json::from_str(span) {
        return Some(document);
    }

    let repaired = double_invalid_escapes(span);
    serde_json::from_str(&repaired).ok()
}

/// Cuts out the inside of a ```json ... ``` (or bare ``` ... ```) block if
/// one is present anywhere in the text.
fn strip_code_fences(text: &str) -> &str {
    if let Some(idx) = text.find("```json") {
        let after = &text[idx + "```json".len()..];
        match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        }
    } else if let Some(idx) = text.find("```") {
        let after = &text[idx + "```".len()..];
        match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        }
    } else {
        text
    }
}

/// Locates the first balanced JSON object or array in `text`. The scan is
/// string-aware: braces inside string literals do not count, and a truncated
/// document yields `None` rather than a garbage span.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

const VALID_ESCAPES: [char; 9] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't', 'u'];

/// Doubles backslashes that do not start a valid JSON escape, turning
/// `"C:\docs"` into `"C:\\docs"`. Backslashes followed by one of
/// `" \ / b f n r t u` are left alone; each valid pair is consumed as a
/// unit so the character after a `\\` is never re-read as an escape head.
fn double_invalid_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(n) if VALID_ESCAPES.contains(n) => {
                out.push('\\');
                if let Some(n) = chars.next() {
                    out.push(n);
                }
            }
            _ => out.push_str("\\\\"),
        }
    }
    out
}
