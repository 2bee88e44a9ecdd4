//! # ocr2md
//!
//! Extract Markdown from images and PDFs through a hosted OCR model.
//!
//! ## Why this crate?
//!
//! The hard part of OCR (reading the page, rebuilding layout, spotting
//! tables) is done by the remote model. What is left for the client is easy
//! to get subtly wrong: validating input before spending a request, building
//! the right payload for the endpoint, keeping pages in order when calls run
//! concurrently, and turning every failure into an error the caller can act
//! on. This crate does exactly that and nothing more.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DocumentInput (image | PDF | page images)
//!  │
//!  ├─ 1. Input     read bytes, reject empty / non-PNG-JPEG-PDF content
//!  ├─ 2. Encode    base64 data: URIs
//!  ├─ 3. Request   chat-completion or document-OCR JSON, bearer/API-key auth
//!  ├─ 4. Remote    bounded-concurrency POSTs, 60 s timeout, fail-fast
//!  ├─ 5. Polish    strip fences and echoed markers, fix tables
//!  └─ 6. Assemble  pages in input order, `--- Page N ---` between them
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{DocumentInput, ExtractOptions, OcrClient, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OcrConfig::builder()
//!         .endpoint("https://my-deployment.example.com/v1/chat/completions")
//!         .api_key(std::env::var("MISTRAL_OCR_KEY")?)
//!         .build()?;
//!     let client = OcrClient::new(config)?;
//!
//!     let doc = DocumentInput::from_paths(["scan-1.png", "scan-2.png"]);
//!     let result = client.extract(&doc, None, ExtractOptions::default()).await?;
//!     println!("{}", result.markdown);
//!     eprintln!("tokens: {} in / {} out",
//!         result.usage.input_tokens,
//!         result.usage.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocr2md = { version = "0.1", default-features = false }
//! ```
//!
//! The library never reads environment variables; endpoint, key and model
//! always come from [`OcrConfig`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ApiStyle, AuthScheme, ExtractOptions, OcrConfig, OcrConfigBuilder, PageBatching,
    PageSeparator, DEFAULT_MODEL,
};
pub use error::{ErrorKind, OcrError};
pub use extract::OcrClient;
pub use output::{ExtractionStats, OcrResult, PageGroup, PageSpan, PageText, TokenUsage};
pub use pipeline::encode::EncodedPage;
pub use pipeline::input::{DocumentInput, DocumentKind, DocumentSource, MediaType};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::PageStream;
