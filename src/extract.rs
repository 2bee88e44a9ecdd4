//! Eager (whole-document) extraction entry points.
//!
//! [`OcrClient::extract`] waits for every page-group, then returns one
//! [`OcrResult`]. Use [`OcrClient::extract_stream`] instead to receive
//! page-groups as they complete.

use crate::config::{ApiStyle, ExtractOptions, OcrConfig, PageBatching, PageSeparator};
use crate::error::OcrError;
use crate::output::{ExtractionStats, OcrResult, PageGroup, PageText, TokenUsage};
use crate::pipeline::assemble;
use crate::pipeline::encode::{self, EncodedPage};
use crate::pipeline::input::{self, DocumentInput, DocumentKind, ResolvedDocument};
use crate::pipeline::postprocess;
use crate::pipeline::remote::{self, Payload};
use crate::pipeline::wire::{self, RemoteReply};
use crate::prompts;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Client for a hosted OCR endpoint.
///
/// Holds the configuration and one pooled HTTP client; cloning is cheap and
/// clones share the connection pool. Nothing else is kept between calls.
///
/// # Example
/// ```rust,no_run
/// use ocr2md::{DocumentInput, ExtractOptions, OcrClient, OcrConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = OcrConfig::builder()
///     .endpoint("https://my-deployment.example.com/v1/chat/completions")
///     .api_key(std::env::var("MISTRAL_OCR_KEY")?)
///     .build()?;
/// let client = OcrClient::new(config)?;
/// let result = client
///     .extract(&DocumentInput::from_path("invoice.png"), None, ExtractOptions::default())
///     .await?;
/// println!("{}", result.markdown);
/// eprintln!("tokens: {}", result.usage.total_tokens);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OcrClient {
    config: Arc<OcrConfig>,
    http: reqwest::Client,
}

/// One remote call and how to read its reply.
#[derive(Debug)]
pub(crate) struct Job {
    pub first_page: usize,
    pub payload: Payload,
    pub shape: ReplyShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReplyShape {
    /// The whole reply belongs to `first_page`.
    Single,
    /// The endpoint returned pages already split (document OCR of a PDF).
    Demarcated,
    /// The model was asked to mark this many pages itself.
    Marked(usize),
}

impl OcrClient {
    /// Validate `config` and build the HTTP client.
    ///
    /// `request_timeout` is installed on the HTTP client, so it bounds every
    /// call made through this instance.
    pub fn new(config: OcrConfig) -> Result<Self, OcrError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ocr2md/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OcrError::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
        debug!("OCR client ready: {:?}", config);
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Extract Markdown from `document`.
    ///
    /// `instructions`, when given and non-blank, replaces the default prompt
    /// composed from `options`. The document-OCR style takes no prompt.
    ///
    /// # Errors
    /// Input problems ([`OcrError::InputNotFound`], [`OcrError::EmptyInput`],
    /// [`OcrError::UnsupportedFormat`]) are raised before any request is sent.
    /// Otherwise the first failing call fails the whole extraction and the
    /// remaining in-flight calls are dropped.
    pub async fn extract(
        &self,
        document: &DocumentInput,
        instructions: Option<&str>,
        options: ExtractOptions,
    ) -> Result<OcrResult, OcrError> {
        let total_start = Instant::now();
        info!(
            "Starting extraction: {:?} input, model {}",
            document.kind(),
            self.config.model
        );

        // ── Step 1: Resolve and validate input ───────────────────────────────
        let resolved = input::resolve_input(document).await?;

        // ── Step 2: Plan remote calls ────────────────────────────────────────
        let instructions = prompts::compose_instructions(instructions, &options);
        let jobs = self.plan_jobs(&resolved, &instructions);
        let request_count = jobs.len();
        debug!(
            "{} part(s) → {} request(s), concurrency {}",
            resolved.pages.len(),
            request_count,
            self.config.concurrency
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_start(request_count);
        }

        // ── Step 3: Call the endpoint ────────────────────────────────────────
        let mut groups: Vec<PageGroup> = stream::iter(
            jobs.into_iter()
                .map(|job| self.run_job(job, request_count)),
        )
        .buffer_unordered(self.config.concurrency)
        .try_collect()
        .await?;

        // Completion order is arbitrary; page order is not.
        groups.sort_by_key(PageGroup::first_page);

        // ── Step 4: Assemble ─────────────────────────────────────────────────
        let usage: TokenUsage = groups.iter().map(|g| g.usage).sum();
        let pages: Vec<PageText> = groups.into_iter().flat_map(|g| g.pages).collect();
        let (markdown, boundaries) = assemble::assemble(&pages, &self.config.page_separator);

        let stats = ExtractionStats {
            page_count: pages.len(),
            request_count,
            duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} page(s), {} request(s), {} tokens, {}ms",
            stats.page_count, stats.request_count, usage.total_tokens, stats.duration_ms
        );

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_extraction_complete(stats.page_count, request_count);
        }

        Ok(OcrResult {
            markdown,
            pages,
            boundaries,
            usage,
            model: self.config.model.clone(),
            stats,
        })
    }

    /// Extract, then write the result to `output_path`.
    ///
    /// Markdown is written unless the path ends in `.json`, in which case the
    /// whole [`OcrResult`] is serialised. Uses atomic write (temp file +
    /// rename) so a failed run never leaves a partial file.
    pub async fn extract_to_file(
        &self,
        document: &DocumentInput,
        instructions: Option<&str>,
        options: ExtractOptions,
        output_path: impl AsRef<Path>,
    ) -> Result<OcrResult, OcrError> {
        let result = self.extract(document, instructions, options).await?;
        let path = output_path.as_ref();

        let contents = if is_json_path(path) {
            serde_json::to_string_pretty(&result)
                .map_err(|e| OcrError::Internal(format!("JSON serialisation failed: {e}")))?
        } else {
            result.markdown.clone()
        };

        let write_err = |e: std::io::Error| OcrError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = temp_path_for(path);
        tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        info!("Wrote {} bytes to {}", result.markdown.len(), path.display());
        Ok(result)
    }

    /// Synchronous wrapper around [`OcrClient::extract`].
    ///
    /// Creates a temporary tokio runtime internally, so it must not be called
    /// from inside an async context.
    pub fn extract_blocking(
        &self,
        document: &DocumentInput,
        instructions: Option<&str>,
        options: ExtractOptions,
    ) -> Result<OcrResult, OcrError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.extract(document, instructions, options))
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    /// Encode every page and decide how many calls carry them.
    pub(crate) fn plan_jobs(&self, resolved: &ResolvedDocument, instructions: &str) -> Vec<Job> {
        let config = &self.config;
        let encoded: Vec<(usize, EncodedPage)> = resolved
            .pages
            .iter()
            .map(|p| (p.page_num, encode::encode_page(p)))
            .collect();

        let combine = resolved.kind == DocumentKind::Pages
            && config.batching == PageBatching::Combined
            && encoded.len() > 1;

        if combine && config.api_style == ApiStyle::DocumentOcr {
            debug!("Document OCR takes one document per request; sending pages one by one");
        }

        if combine && config.api_style == ApiStyle::ChatCompletions {
            let page_count = encoded.len();
            let pages: Vec<EncodedPage> = encoded.into_iter().map(|(_, page)| page).collect();
            let instructions = format!(
                "{}{}",
                instructions,
                prompts::combined_pages_directive(page_count)
            );
            let request = wire::build_chat_request(
                &config.model,
                &instructions,
                &pages,
                config.temperature,
                config.max_tokens,
            );
            return vec![Job {
                first_page: 1,
                payload: Payload::Chat(request),
                shape: ReplyShape::Marked(page_count),
            }];
        }

        let shape = if config.api_style == ApiStyle::DocumentOcr && resolved.kind == DocumentKind::Pdf {
            ReplyShape::Demarcated
        } else {
            ReplyShape::Single
        };

        encoded
            .into_iter()
            .map(|(page_num, page)| {
                let payload = match config.api_style {
                    ApiStyle::ChatCompletions => Payload::Chat(wire::build_chat_request(
                        &config.model,
                        instructions,
                        std::slice::from_ref(&page),
                        config.temperature,
                        config.max_tokens,
                    )),
                    ApiStyle::DocumentOcr => {
                        Payload::Document(wire::build_document_request(&config.model, &page))
                    }
                };
                Job {
                    first_page: page_num,
                    payload,
                    shape,
                }
            })
            .collect()
    }

    /// Send one job, reporting progress around it.
    pub(crate) async fn run_job(&self, job: Job, total: usize) -> Result<PageGroup, OcrError> {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_page_start(job.first_page, total);
        }

        let start = Instant::now();
        let result = remote::call_endpoint(&self.http, &self.config, &job.payload)
            .await
            .and_then(|reply| {
                self.to_group(&job, reply, start.elapsed().as_millis() as u64)
            });

        match (&result, cb) {
            (Ok(group), Some(cb)) => {
                cb.on_page_complete(job.first_page, total, group.markdown_len())
            }
            (Err(e), Some(cb)) => cb.on_page_error(job.first_page, total, &e.to_string()),
            _ => {}
        }
        if let Err(ref e) = result {
            warn!("Request for page {} failed: {}", job.first_page, e);
        }
        result
    }

    /// Map a reply onto page numbers and clean each page.
    ///
    /// A combined reply that does not mark exactly one boundary per submitted
    /// page is rejected, since its page boundaries cannot be recovered.
    fn to_group(
        &self,
        job: &Job,
        reply: RemoteReply,
        duration_ms: u64,
    ) -> Result<PageGroup, OcrError> {
        let texts = match job.shape {
            ReplyShape::Single => vec![reply.pages.join("\n\n")],
            ReplyShape::Demarcated => reply.pages,
            ReplyShape::Marked(expected) => {
                let joined = reply.pages.join("\n\n");
                let unfenced = postprocess::strip_markdown_fences(&joined);
                assemble::split_marked_pages(&unfenced, expected).ok_or_else(|| {
                    OcrError::MalformedResponse {
                        detail: format!(
                            "combined reply marks {} of {} pages",
                            assemble::count_page_markers(&unfenced),
                            expected
                        ),
                    }
                })?
            }
        };

        let drop_markers = matches!(self.config.page_separator, PageSeparator::Marker);
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page_num: job.first_page + i,
                markdown: if self.config.clean_output {
                    postprocess::clean_markdown(&text, drop_markers)
                } else {
                    text.trim().to_string()
                },
            })
            .collect();

        Ok(PageGroup {
            pages,
            usage: reply.usage,
            duration_ms,
        })
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// `out/result.md` → `out/result.md.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
