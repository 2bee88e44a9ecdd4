//! Progress-callback trait for per-call extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to receive events as
//! the client sends each page-group to the endpoint. The CLI uses this to
//! drive its progress bar; a UI could forward events to a channel instead.
//!
//! # Example
//!
//! ```rust
//! use ocr2md::{ExtractionProgressCallback, OcrConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, markdown_len);
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .endpoint("https://ocr.example.com/v1/chat/completions")
//!     .api_key("secret")
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the client as it processes a document.
///
/// A "page" here is the first page of a page-group: when one call covers a
/// whole PDF or a combined batch, a single start/complete pair is emitted for
/// it with `page_num = 1`.
///
/// # Thread safety
///
/// With [`crate::PageBatching::PerPage`] several pages are in flight at once,
/// so `on_page_*` may be called concurrently. Protect shared state with
/// atomics or a `Mutex`.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after validation, before the first request.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the request for a page-group is sent.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page-group came back successfully.
    ///
    /// `markdown_len` is the byte length of the text returned for the group.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        let _ = (page_num, total_pages, markdown_len);
    }

    /// Called when the request for a page-group failed. The extraction as a
    /// whole fails right after.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once at the end: after every page-group succeeded for an eager
    /// extraction, or when a page stream has been drained.
    fn on_extraction_complete(&self, total_pages: usize, request_count: usize) {
        let _ = (total_pages, request_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
