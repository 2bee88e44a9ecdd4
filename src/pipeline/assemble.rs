//! Assembly: merge per-page text into one Markdown document.
//!
//! Two directions live here. [`assemble`] joins pages with the configured
//! separator and records each page's byte span. [`split_marked_pages`] undoes
//! a model's own `--- Page N ---` marks when several pages were sent in one
//! combined request.

use crate::config::PageSeparator;
use crate::output::{PageSpan, PageText};
use once_cell::sync::Lazy;
use regex::Regex;

/// A `--- Page N ---` line, case-insensitive, any run of 3+ dashes.
pub(crate) static RE_PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*-{3,}[ \t]*page[ \t]+(\d+)[ \t]*-{3,}[ \t]*$").unwrap());

/// Join `pages` (already in page order) with `separator` between neighbours.
///
/// N pages yield exactly N−1 separators, even when a page is empty. The
/// returned spans point at each page's text inside the merged string.
pub fn assemble(pages: &[PageText], separator: &PageSeparator) -> (String, Vec<PageSpan>) {
    let mut markdown = String::new();
    let mut spans = Vec::with_capacity(pages.len());

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            markdown.push_str(&separator.render(page.page_num));
        }
        let start = markdown.len();
        markdown.push_str(page.markdown.trim());
        spans.push(PageSpan {
            page_num: page.page_num,
            start,
            end: markdown.len(),
        });
    }

    if !markdown.trim().is_empty() {
        markdown.push('\n');
    }
    (markdown, spans)
}

/// Number of `--- Page N ---` lines in `text`.
pub fn count_page_markers(text: &str) -> usize {
    RE_PAGE_MARKER.find_iter(text).count()
}

/// Split a combined reply on the model's page marks.
///
/// Succeeds only when exactly `expected` marks numbered `1..=expected` appear
/// in order. Text before the first mark is kept with page 1.
pub fn split_marked_pages(text: &str, expected: usize) -> Option<Vec<String>> {
    let marks: Vec<(usize, usize, usize)> = RE_PAGE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let num = caps[1].parse().ok()?;
            Some((num, whole.start(), whole.end()))
        })
        .collect();

    if marks.len() != expected || expected == 0 {
        return None;
    }
    if marks.iter().enumerate().any(|(i, (num, _, _))| *num != i + 1) {
        return None;
    }

    let mut pages = Vec::with_capacity(expected);
    for (i, (_, _, body_start)) in marks.iter().enumerate() {
        let body_end = marks.get(i + 1).map(|(_, s, _)| *s).unwrap_or(text.len());
        pages.push(text[*body_start..body_end].trim().to_string());
    }

    let preamble = text[..marks[0].1].trim();
    if !preamble.is_empty() {
        pages[0] = format!("{}\n\n{}", preamble, pages[0]).trim().to_string();
    }
    Some(pages)
}
