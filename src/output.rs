//! Result types returned by the OCR client.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Token counters as reported by the endpoint.
///
/// The document-OCR API reports none, in which case every field stays zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Build from reported counters. A missing total is derived from the parts.
    pub fn new(input_tokens: u64, output_tokens: u64, total_tokens: Option<u64>) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: total_tokens.unwrap_or(input_tokens.saturating_add(output_tokens)),
        }
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.saturating_add(rhs.input_tokens),
            output_tokens: self.output_tokens.saturating_add(rhs.output_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

impl Sum for TokenUsage {
    fn sum<I: Iterator<Item = TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), Add::add)
    }
}

/// Markdown recognised for one page (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page_num: usize,
    pub markdown: String,
}

/// Byte range `[start, end)` of one page inside [`OcrResult::markdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpan {
    pub page_num: usize,
    pub start: usize,
    pub end: usize,
}

/// Output of a single remote call.
///
/// One image, one PDF or one combined batch is a single group; in per-page
/// mode every page is its own group. Emitted by [`crate::OcrClient::extract_stream`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGroup {
    /// Pages covered by the call, in page order.
    pub pages: Vec<PageText>,
    pub usage: TokenUsage,
    pub duration_ms: u64,
}

impl PageGroup {
    /// Page number of the first page in the group.
    pub fn first_page(&self) -> usize {
        self.pages.first().map(|p| p.page_num).unwrap_or(1)
    }

    /// Total bytes of Markdown across the group.
    pub fn markdown_len(&self) -> usize {
        self.pages.iter().map(|p| p.markdown.len()).sum()
    }
}

/// Counters describing one `extract` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the merged result.
    pub page_count: usize,
    /// Remote calls issued.
    pub request_count: usize,
    /// Wall-clock time of the whole call.
    pub duration_ms: u64,
}

/// The normalised output of [`crate::OcrClient::extract`].
///
/// Created fresh per call; the client never caches or persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// All pages concatenated in input order, separated by page markers.
    pub markdown: String,
    /// Per-page text, in input order.
    pub pages: Vec<PageText>,
    /// Where each page sits inside `markdown`.
    pub boundaries: Vec<PageSpan>,
    /// Usage summed across every remote call.
    pub usage: TokenUsage,
    /// Model that produced the text.
    pub model: String,
    pub stats: ExtractionStats,
}

impl OcrResult {
    /// Text of page `page_num` (1-indexed) as it appears in the merged output.
    pub fn page_markdown(&self, page_num: usize) -> Option<&str> {
        self.boundaries
            .iter()
            .find(|b| b.page_num == page_num)
            .map(|b| &self.markdown[b.start..b.end])
    }
}
