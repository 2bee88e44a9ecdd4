//! Pipeline stages for document-to-Markdown extraction.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without a server.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ wire ──▶ remote ──▶ postprocess ──▶ assemble
//! (bytes)   (base64)   (JSON)   (HTTP)     (cleanup)       (markers)
//! ```
//!
//! 1. [`input`]: read and validate the document (existence, size, magic bytes)
//! 2. [`encode`]: base64-wrap each page as a `data:` URI
//! 3. [`wire`]: build and parse the JSON bodies of both endpoint styles
//! 4. [`remote`]: POST one payload; the only stage with network I/O
//! 5. [`postprocess`]: deterministic cleanup of model output
//! 6. [`assemble`]: join pages with boundary markers, or split a combined reply

pub mod assemble;
pub mod encode;
pub mod input;
pub mod postprocess;
pub mod remote;
pub mod wire;
