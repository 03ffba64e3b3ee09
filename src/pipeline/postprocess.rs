//! Post-processing: deterministic cleanup of raw OCR text.
//!
//! Tesseract faithfully transcribes everything on the page, including the
//! artefacts that browser "print to PDF" exports stamp on every sheet (a
//! `MM/DD/YYYY, H:MM PM` header, a `file:///…` footer) and the bullet glyphs
//! it tends to misread as `e`, `@` or `e@`. This module strips those with a
//! handful of line-level rules. Every rule is a pure `&str` function, so the
//! whole pass is total: it never fails, and a line no rule touches comes out
//! merely trimmed.
//!
//! ## Rule Order
//!
//! Lines are trimmed first so the anchored patterns see the real line start.
//! The drop rules run again after the bullet marker is stripped, so a line
//! that was only a marker (or a marker in front of a timestamp) disappears in
//! a single pass instead of surviving until the text is cleaned twice.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw OCR text of one page.
///
/// Rules (applied per line, in order):
/// 1. Trim leading/trailing whitespace
/// 2. Drop export timestamps (`12/31/2023, 5:45 PM`)
/// 3. Drop lines containing a `file://` link (case-insensitive)
/// 4. Drop blank lines
/// 5. Strip one leading bullet marker (`e@`, `e `, `@`, `-`, `*`, `•`)
/// 6. Collapse runs of 2+ whitespace characters to one space
///
/// Surviving lines are joined with `\n`; there is no trailing newline.
pub fn clean_ocr_text(input: &str) -> String {
    input
        .lines()
        .filter_map(clean_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clean a single line; `None` means the line is dropped.
fn clean_line(line: &str) -> Option<String> {
    let line = line.trim();
    if is_droppable(line) {
        return None;
    }

    let line = strip_bullet_marker(line).trim();
    if is_droppable(line) {
        return None;
    }

    Some(collapse_whitespace(line))
}

fn is_droppable(line: &str) -> bool {
    line.is_empty() || is_export_timestamp(line) || contains_file_uri(line)
}

// ── Rule 2: Export timestamps ────────────────────────────────────────────────

static RE_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4},\s+\d{1,2}:\d{2}\s+(AM|PM)").unwrap());

fn is_export_timestamp(line: &str) -> bool {
    RE_TIMESTAMP.is_match(line)
}

// ── Rule 3: file:// links ────────────────────────────────────────────────────

fn contains_file_uri(line: &str) -> bool {
    line.to_lowercase().contains("file://")
}

// ── Rule 5: Leading bullet marker ────────────────────────────────────────────

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(e@|e\s+|@|-|\*|•)\s*").unwrap());

fn strip_bullet_marker(line: &str) -> &str {
    match RE_BULLET.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

// ── Rule 6: Whitespace runs ──────────────────────────────────────────────────

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

fn collapse_whitespace(line: &str) -> String {
    RE_WHITESPACE_RUN.replace_all(line, " ").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────
