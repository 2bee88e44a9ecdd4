//! Configuration types for OCR extraction.
//!
//! All client behaviour is controlled through [`OcrConfig`], built via its
//! [`OcrConfigBuilder`]. The endpoint, credential and model are passed in
//! explicitly; the library never reads environment variables, so tests can
//! point a client at a local mock server without touching process state.

use crate::error::OcrError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "mistral-ocr-2503";

/// Configuration for an [`crate::OcrClient`].
///
/// # Example
/// ```rust
/// use ocr2md::{ApiStyle, OcrConfig};
/// use std::time::Duration;
///
/// let config = OcrConfig::builder()
///     .endpoint("https://my-deployment.example.com/chat/completions")
///     .api_key("secret")
///     .api_style(ApiStyle::ChatCompletions)
///     .request_timeout(Duration::from_secs(90))
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "mistral-ocr-2503");
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Full URL the OCR payload is POSTed to.
    pub endpoint: String,

    /// Credential sent with every request. Never logged.
    pub api_key: String,

    /// How the credential is attached. Default: [`AuthScheme::Bearer`].
    pub auth: AuthScheme,

    /// Model / deployment identifier. Default: `mistral-ocr-2503`.
    pub model: String,

    /// Payload schema spoken by the endpoint. Default: [`ApiStyle::ChatCompletions`].
    pub api_style: ApiStyle,

    /// Upper bound on every outbound call. Default: 60 s.
    ///
    /// A call that runs past this fails with [`OcrError::Timeout`]; no partial
    /// text is ever returned.
    pub request_timeout: Duration,

    /// Maximum in-flight requests when pages are sent one per call. Default: 4.
    pub concurrency: usize,

    /// How an explicit list of page images is sent. Default: [`PageBatching::PerPage`].
    pub batching: PageBatching,

    /// Sampling temperature (chat style only). Default: 0.0.
    ///
    /// Transcription wants the model deterministic.
    pub temperature: f32,

    /// Maximum generated tokens per call (chat style only). Default: 4096.
    pub max_tokens: usize,

    /// Separator inserted between pages in the merged Markdown. Default: [`PageSeparator::Marker`].
    pub page_separator: PageSeparator,

    /// Run [`crate::pipeline::postprocess::clean_markdown`] on each page. Default: true.
    pub clean_output: bool,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            auth: AuthScheme::default(),
            model: DEFAULT_MODEL.to_string(),
            api_style: ApiStyle::default(),
            request_timeout: Duration::from_secs(60),
            concurrency: 4,
            batching: PageBatching::default(),
            temperature: 0.0,
            max_tokens: 4096,
            page_separator: PageSeparator::default(),
            clean_output: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("auth", &self.auth)
            .field("model", &self.model)
            .field("api_style", &self.api_style)
            .field("request_timeout", &self.request_timeout)
            .field("concurrency", &self.concurrency)
            .field("batching", &self.batching)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("page_separator", &self.page_separator)
            .field("clean_output", &self.clean_output)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the constraints [`OcrConfigBuilder::build`] enforces.
    ///
    /// Also run by [`crate::OcrClient::new`], since every field is public.
    pub fn validate(&self) -> Result<(), OcrError> {
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            OcrError::InvalidConfig(format!("endpoint '{}' is not a valid URL: {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(OcrError::InvalidConfig(format!(
                "endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(OcrError::InvalidConfig("API key must not be empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(OcrError::InvalidConfig("model must not be empty".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(OcrError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(OcrError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if let AuthScheme::Header(name) = &self.auth {
            reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                OcrError::InvalidConfig(format!("'{name}' is not a valid header name"))
            })?;
        }
        Ok(())
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn auth(mut self, auth: AuthScheme) -> Self {
        self.config.auth = auth;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_style(mut self, style: ApiStyle) -> Self {
        self.config.api_style = style;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout = Duration::from_secs(secs);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn batching(mut self, batching: PageBatching) -> Self {
        self.config.batching = batching;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Per-call switches that shape the default instruction string.
///
/// Ignored when the caller passes its own instructions to
/// [`crate::OcrClient::extract`]: a custom string replaces the composed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Ask for tables as Markdown pipe tables. Default: true.
    pub extract_tables: bool,
    /// Ask for the page's visual hierarchy (headings, lists, reading order). Default: true.
    pub preserve_formatting: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extract_tables: true,
            preserve_formatting: true,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Request/response schema spoken by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApiStyle {
    /// Chat-completion payload: system instruction + user message carrying
    /// base64 attachments. Returns one text block and token usage. (default)
    #[default]
    ChatCompletions,
    /// Dedicated document-OCR payload: one `document` per request, replies with
    /// per-page Markdown. Takes no instructions and reports no tokens.
    DocumentOcr,
}

/// How the API key travels with the request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>` (default)
    #[default]
    Bearer,
    /// `<name>: <key>`, e.g. `api-key` on Azure-hosted deployments.
    Header(String),
}

/// How an explicit list of page images is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageBatching {
    /// One request per page, run concurrently, re-ordered afterwards. (default)
    #[default]
    PerPage,
    /// All pages in a single chat request; the model is asked to mark pages
    /// itself and the reply is split on those marks.
    Combined,
}

/// How to separate pages in the merged Markdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSeparator {
    /// `--- Page N ---` on its own line. (default)
    #[default]
    Marker,
    /// Horizontal rule: `---`
    HorizontalRule,
    /// Markdown heading: `## Page N`
    Heading,
    /// Custom string; `{n}` is replaced with the page number.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator placed before page `page_num` (1-indexed),
    /// including the surrounding blank lines.
    pub fn render(&self, page_num: usize) -> String {
        let line = match self {
            PageSeparator::Marker => format!("--- Page {} ---", page_num),
            PageSeparator::HorizontalRule => "---".to_string(),
            PageSeparator::Heading => format!("## Page {}", page_num),
            PageSeparator::Custom(s) => s.replace("{n}", &page_num.to_string()),
        };
        format!("\n\n{}\n\n", line)
    }
}
