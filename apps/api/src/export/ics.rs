//! ICS (RFC 5545) text generation for scheduled study sessions.
//!
//! Output constraints: CRLF line endings, TEXT-value escaping for
//! backslash/semicolon/comma/newline, and folding of lines longer than 75
//! octets. Times are written as floating local time so the sessions land at
//! the user's wall-clock choice wherever the file is imported.

use chrono::{Duration, NaiveDateTime, Utc};
use uuid::Uuid;

use super::schedule::StudyEvent;

const PRODID: &str = "-//astrolabe//career-roadmap//EN";
const MAX_LINE_OCTETS: usize = 75;

/// Serializes the events into a complete VCALENDAR document. Events are
/// written in slice order, so callers that build them module-by-module get
/// one contiguous block per module.
pub fn render_calendar(events: &[StudyEvent]) -> String {
    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for event in events {
        push_event(&mut lines, event, &stamp);
    }

    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        out.push_str(&fold_line(&line));
        out.push_str("\r\n");
    }
    out
}

const FALLBACK_DURATION_MINUTES: i64 = 120;

fn push_event(lines: &mut Vec<String>, event: &StudyEvent, stamp: &str) {
    let start = NaiveDateTime::new(event.date, event.start_time);
    // duration_hours comes from client-supplied JSON; an out-of-range value
    // must not abort the whole export.
    let duration = Duration::try_minutes((event.duration_hours * 60.0).round() as i64)
        .unwrap_or_else(|| Duration::minutes(FALLBACK_DURATION_MINUTES));
    let end = start
        .checked_add_signed(duration)
        .or_else(|| start.checked_add_signed(Duration::minutes(FALLBACK_DURATION_MINUTES)))
        .unwrap_or(start);

    let mut description = String::new();
    if !event.tasks.is_empty() {
        description.push_str("Tasks:\n");
        for task in &event.tasks {
            description.push_str(&format!("- {task}\n"));
        }
    }
    if let Some(goal) = &event.weekly_goal {
        description.push_str(&format!("Weekly goal: {goal}"));
    }

    lines.push("BEGIN:VEVENT".to_string());
    lines.push(format!("UID:{}@astrolabe", Uuid::new_v4()));
    lines.push(format!("DTSTAMP:{stamp}"));
    lines.push(format!("DTSTART:{}", start.format("%Y%m%dT%H%M%S")));
    lines.push(format!("DTEND:{}", end.format("%Y%m%dT%H%M%S")));
    lines.push(format!("SUMMARY:{}", escape_text(&event.topic)));
    if !description.is_empty() {
        lines.push(format!(
            "DESCRIPTION:{}",
            escape_text(description.trim_end())
        ));
    }
    lines.push(format!("CATEGORIES:{}", escape_text(&event.module_title)));
    lines.push("END:VEVENT".to_string());
}

/// RFC 5545 TEXT escaping. Backslash first so escapes are not re-escaped.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Folds a content line at 75 octets, continuing with CRLF + space.
/// Splits only at char boundaries; a multibyte char never straddles a fold.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut budget = MAX_LINE_OCTETS;
    let mut used = 0;

    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > budget {
            out.push_str("\r\n ");
            // Continuation lines lose one octet to the leading space.
            budget = MAX_LINE_OCTETS - 1;
            used = 0;
        }
        out.push(c);
        used += width;
    }
    out
}
