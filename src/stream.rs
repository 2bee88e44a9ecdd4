//! Streaming extraction API: emit page-groups as they complete.
//!
//! A long multi-page job can take minutes. [`OcrClient::extract_stream`]
//! yields each [`PageGroup`] as soon as its call returns, so callers can show
//! partial results or write pages incrementally. Unlike
//! [`OcrClient::extract`], items arrive in completion order (sort by
//! [`PageGroup::first_page`] if order matters), and page markers are not
//! inserted.

use crate::config::ExtractOptions;
use crate::error::OcrError;
use crate::extract::OcrClient;
use crate::output::PageGroup;
use crate::pipeline::input::{self, DocumentInput};
use crate::prompts;
use futures::future;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page-group results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageGroup, OcrError>> + Send>>;

impl OcrClient {
    /// Extract `document`, streaming page-groups as they are ready.
    ///
    /// # Returns
    /// - `Ok(PageStream)` once the input has been validated and encoded
    /// - `Err(OcrError)` for input problems, before any request is sent
    ///
    /// Each failed call yields one `Err` item. Dropping the stream cancels
    /// the calls still in flight. The progress callback's
    /// `on_extraction_complete` fires once the stream is drained, with the
    /// number of pages delivered in `Ok` items.
    ///
    /// # Example
    /// ```rust,no_run
    /// use futures::StreamExt;
    /// use ocr2md::{DocumentInput, ExtractOptions, OcrClient, OcrConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = OcrClient::new(
    ///     OcrConfig::builder()
    ///         .endpoint("https://ocr.example.com/v1/chat/completions")
    ///         .api_key("secret")
    ///         .build()?,
    /// )?;
    /// let doc = DocumentInput::from_paths(["p1.png", "p2.png", "p3.png"]);
    /// let mut stream = client.extract_stream(&doc, None, ExtractOptions::default()).await?;
    /// while let Some(group) = stream.next().await {
    ///     let group = group?;
    ///     println!("page {}: {} bytes", group.first_page(), group.markdown_len());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn extract_stream(
        &self,
        document: &DocumentInput,
        instructions: Option<&str>,
        options: ExtractOptions,
    ) -> Result<PageStream, OcrError> {
        info!("Starting streaming extraction: {:?} input", document.kind());

        let resolved = input::resolve_input(document).await?;
        let instructions = prompts::compose_instructions(instructions, &options);
        let jobs = self.plan_jobs(&resolved, &instructions);
        let total = jobs.len();
        let concurrency = self.config().concurrency;

        if let Some(ref cb) = self.config().progress_callback {
            cb.on_extraction_start(total);
        }

        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);
        let cb = self.config().progress_callback.clone();
        let finish = stream::once(async move {
            let pages = delivered.load(Ordering::Relaxed);
            info!("Streaming extraction complete: {} page(s), {} request(s)", pages, total);
            if let Some(cb) = cb {
                cb.on_extraction_complete(pages, total);
            }
            None::<Result<PageGroup, OcrError>>
        })
        .filter_map(future::ready);

        let client = self.clone();
        let s = stream::iter(jobs.into_iter().map(move |job| {
            let client = client.clone();
            async move { client.run_job(job, total).await }
        }))
        .buffer_unordered(concurrency)
        .inspect(move |item| {
            if let Ok(group) = item {
                counter.fetch_add(group.pages.len(), Ordering::Relaxed);
            }
        })
        .chain(finish);

        Ok(Box::pin(s))
    }
}
