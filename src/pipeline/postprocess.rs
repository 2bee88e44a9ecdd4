//! Post-processing: deterministic cleanup of model-generated Markdown.
//!
//! Models are told not to wrap output in fences and not to print page
//! numbers, and they do it anyway often enough to matter. Each rule below is
//! a pure `&str → String` pass; [`clean_markdown`] applies them in order:
//!
//! 1. Strip an outer ```` ```markdown ```` fence
//! 2. Normalise line endings (CRLF / CR → LF)
//! 3. Trim trailing whitespace per line
//! 4. Drop echoed `--- Page N ---` lines when those are the page separator
//! 5. Insert a missing separator row under a pipe-table header
//! 6. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 7. Collapse runs of blank lines and trim both ends
//!
//! Rule 4 runs before rule 7 so the gap a removed marker leaves behind gets
//! collapsed too. A page with no text stays an empty string.

use super::assemble::RE_PAGE_MARKER;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply the cleanup rules to one page of raw model output.
///
/// `drop_page_markers` enables rule 4; pass `true` only when the merged
/// document uses `--- Page N ---` separators, otherwise such lines are text.
pub fn clean_markdown(input: &str, drop_page_markers: bool) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = if drop_page_markers {
        strip_page_markers(&s)
    } else {
        s
    };
    let s = fix_table_headers(&s);
    let s = remove_invisible_chars(&s);
    collapse_blank_lines(&s).trim().to_string()
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

pub(crate) fn strip_markdown_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

// ── Rule 4: Drop echoed page markers ─────────────────────────────────────────

fn strip_page_markers(input: &str) -> String {
    RE_PAGE_MARKER.replace_all(input, "").to_string()
}

// ── Rule 5: Missing table separator ──────────────────────────────────────────

/// When a pipe table starts with two content rows, the renderer treats it as
/// plain text. Add `| --- |` cells under the first row.
fn fix_table_headers(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 4);
    let mut prev_is_table = false;

    for (i, line) in lines.iter().enumerate() {
        out.push((*line).to_string());
        let is_table = is_table_row(line);
        let starts_table = is_table && !prev_is_table && !is_separator_row(line);
        if starts_table {
            let next = lines.get(i + 1).copied().unwrap_or("");
            if is_table_row(next) && !is_separator_row(next) {
                let cells = line.trim().trim_matches('|').split('|').count().max(1);
                out.push(format!("|{}", " --- |".repeat(cells)));
            }
        }
        prev_is_table = is_table;
    }

    out.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.contains('-') && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

// ── Rule 6: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        ['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'],
        "",
    )
}

// ── Rule 7: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}
