//! Instruction strings sent alongside the document.
//!
//! Every prompt lives here so the wording can change without touching the
//! request plumbing, and so tests can inspect it directly.
//!
//! Composition rule: the caller's own instruction string, when given,
//! *replaces* the composed default. The two are never merged.

use crate::config::ExtractOptions;

/// Base instruction used for every default prompt.
pub const BASE_SYSTEM_PROMPT: &str = r#"You are an expert OCR system. Convert the provided document image to detailed markdown format.

Instructions:
- Extract ALL text content accurately
- Preserve the reading order as a human would read the page
- Use appropriate markdown headers (# ## ###)
- Preserve lists, bullet points, and numbering
- Output ONLY the Markdown content, without ```markdown fences or commentary"#;

/// Appended when [`ExtractOptions::extract_tables`] is set.
pub const TABLES_RULE: &str =
    "- Pay special attention to tables and format them as markdown pipe tables";

/// Appended when [`ExtractOptions::preserve_formatting`] is set.
pub const FORMATTING_RULE: &str =
    "- Maintain the original document's visual hierarchy: headings, emphasis and structure";

/// Text of the user turn that carries the attachments.
pub const USER_PROMPT: &str = "Please convert this document to detailed markdown format.";

/// Build the default instruction string for `options`.
pub fn default_instructions(options: &ExtractOptions) -> String {
    let mut prompt = String::from(BASE_SYSTEM_PROMPT);
    if options.extract_tables {
        prompt.push('\n');
        prompt.push_str(TABLES_RULE);
    }
    if options.preserve_formatting {
        prompt.push('\n');
        prompt.push_str(FORMATTING_RULE);
    }
    prompt
}

/// Pick the instruction string for one call.
///
/// A non-blank `custom` string wins outright; otherwise the default is
/// composed from `options`.
pub fn compose_instructions(custom: Option<&str>, options: &ExtractOptions) -> String {
    match custom.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => default_instructions(options),
    }
}

/// Directive appended when several page images travel in one request.
///
/// The model has to mark page starts itself; the reply is split on these
/// lines by [`crate::pipeline::assemble::split_marked_pages`].
pub fn combined_pages_directive(page_count: usize) -> String {
    format!(
        "\n\nYou are given {page_count} page images in order. Start the output for page N \
with the line `--- Page N ---` (for N = 1 to {page_count}) and emit nothing else between pages."
    )
}
