//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate: loads `.env`, maps flags and
//! environment variables to `OcrConfig`, runs one extraction and prints or
//! saves the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::{
    ApiStyle, AuthScheme, DocumentInput, ExtractOptions, ExtractionProgressCallback, OcrClient,
    OcrConfig, OcrError, OcrResult, PageBatching, PageSeparator, ProgressCallback, DEFAULT_MODEL,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Live progress bar plus one log line per request. Requests may finish out
/// of order when pages are sent concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner only; the length is set by `on_extraction_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} requests  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Sending {total_pages} request(s)…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, markdown_len: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{markdown_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_extraction_complete(&self, total_pages: usize, request_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} page(s) extracted in {} request(s)",
            green("✔"),
            bold(&total_pages.to_string()),
            request_count
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Single image (stdout)
  ocr2md invoice.png

  # PDF to file
  ocr2md report.pdf -o report.md

  # Several scans as ordered pages, one request each
  ocr2md scan-1.png scan-2.png scan-3.png -o scans.md

  # All pages in one chat request
  ocr2md --batching combined scan-1.png scan-2.png

  # Mistral document-OCR endpoint
  ocr2md --api-style document --endpoint https://api.mistral.ai/v1/ocr report.pdf

  # Azure-style key header and a custom prompt
  ocr2md --auth-header api-key --instructions "Only extract the totals table" bill.jpg

  # Full result as JSON (pages, boundaries, token usage)
  ocr2md --json invoice.png > invoice.json

ENVIRONMENT VARIABLES (also read from a .env file):
  MISTRAL_OCR_ENDPOINT    Full URL of the OCR endpoint
  MISTRAL_OCR_KEY         API key
  MISTRAL_OCR_MODEL_NAME  Model or deployment name (default: mistral-ocr-2503)
  OCR2MD_API_STYLE        chat | document
  OCR2MD_AUTH_HEADER      Send the key in this header instead of a bearer token
  OCR2MD_TIMEOUT          Per-request timeout in seconds (default: 60)
  OCR2MD_CONCURRENCY      Parallel requests for page lists (default: 4)
"#;

/// Extract Markdown from images and PDFs with a hosted OCR model.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Extract Markdown from images and PDFs with a hosted OCR model",
    long_about = "Send PNG, JPEG or PDF files to a hosted OCR model (Mistral OCR or any \
chat-completion endpoint that accepts inline images) and print the returned Markdown. \
Several images are treated as ordered pages and joined with `--- Page N ---` markers.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image or PDF file. Several image files are sent as ordered pages.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write the result to this file instead of stdout (`.json` writes the full result).
    #[arg(short, long, env = "OCR2MD_OUTPUT")]
    output: Option<PathBuf>,

    /// Full URL of the OCR endpoint.
    #[arg(long, env = "MISTRAL_OCR_ENDPOINT")]
    endpoint: String,

    /// API key for the endpoint.
    #[arg(long, env = "MISTRAL_OCR_KEY", hide_env_values = true)]
    api_key: String,

    /// Model or deployment name.
    #[arg(long, env = "MISTRAL_OCR_MODEL_NAME", default_value = DEFAULT_MODEL)]
    model: String,

    /// Payload schema spoken by the endpoint.
    #[arg(long, env = "OCR2MD_API_STYLE", value_enum, default_value = "chat")]
    api_style: ApiStyleArg,

    /// Send the key in this header (e.g. `api-key`) instead of `Authorization: Bearer`.
    #[arg(long, env = "OCR2MD_AUTH_HEADER")]
    auth_header: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "OCR2MD_TIMEOUT", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Parallel requests when pages are sent one by one.
    #[arg(short, long, env = "OCR2MD_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// How a list of page images is sent.
    #[arg(long, env = "OCR2MD_BATCHING", value_enum, default_value = "per-page")]
    batching: BatchingArg,

    /// Do not ask for Markdown tables.
    #[arg(long)]
    no_tables: bool,

    /// Do not ask to preserve headings and layout hierarchy.
    #[arg(long)]
    no_formatting: bool,

    /// Custom instructions; replace the default prompt entirely.
    #[arg(long, env = "OCR2MD_INSTRUCTIONS", conflicts_with = "instructions_file")]
    instructions: Option<String>,

    /// Read custom instructions from a text file.
    #[arg(long)]
    instructions_file: Option<PathBuf>,

    /// Page separator: marker, hr, heading, or a custom string (`{n}` = page number).
    #[arg(long, env = "OCR2MD_SEPARATOR", default_value = "marker")]
    separator: String,

    /// Keep the model output as returned (no cleanup).
    #[arg(long)]
    raw: bool,

    /// Max generated tokens per request (chat style).
    #[arg(long, env = "OCR2MD_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Sampling temperature (chat style, 0.0–2.0).
    #[arg(long, env = "OCR2MD_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Print the full result as JSON instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCR2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCR2MD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ApiStyleArg {
    Chat,
    Document,
}

impl From<ApiStyleArg> for ApiStyle {
    fn from(v: ApiStyleArg) -> Self {
        match v {
            ApiStyleArg::Chat => ApiStyle::ChatCompletions,
            ApiStyleArg::Document => ApiStyle::DocumentOcr,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BatchingArg {
    PerPage,
    Combined,
}

impl From<BatchingArg> for PageBatching {
    fn from(v: BatchingArg) -> Self {
        match v {
            BatchingArg::PerPage => PageBatching::PerPage,
            BatchingArg::Combined => PageBatching::Combined,
        }
    }
}

fn main() -> ExitCode {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} failed to start tokio runtime: {e}", red("error:"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", red("error:"));
            if let Some(ocr) = e.chain().find_map(|c| c.downcast_ref::<OcrError>()) {
                eprintln!("{} {}", cyan("hint:"), ocr.hint());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; RUST_LOG still wins when set.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let client = OcrClient::new(config).context("Invalid configuration")?;

    let instructions = match cli.instructions_file {
        Some(ref path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read instructions from {:?}", path))?,
        ),
        None => cli.instructions.clone(),
    };
    let options = ExtractOptions {
        extract_tables: !cli.no_tables,
        preserve_formatting: !cli.no_formatting,
    };
    let document = DocumentInput::from_paths(cli.inputs.iter().cloned());

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let result = client
            .extract_to_file(&document, instructions.as_deref(), options, output_path)
            .await
            .context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} page(s)  {}ms  →  {}",
                green("✔"),
                result.stats.page_count,
                result.stats.duration_ms,
                bold(&output_path.display().to_string()),
            );
            print_usage(&result);
        }
    } else {
        let result = client
            .extract(&document, instructions.as_deref(), options)
            .await
            .context("Extraction failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(result.markdown.as_bytes())
                .context("Failed to write to stdout")?;
            if !result.markdown.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }

        if !cli.quiet && !cli.json {
            print_usage(&result);
        }
    }

    Ok(())
}

fn print_usage(result: &OcrResult) {
    eprintln!(
        "   {} tokens in  /  {} tokens out  /  {} total  ({})",
        dim(&result.usage.input_tokens.to_string()),
        dim(&result.usage.output_tokens.to_string()),
        dim(&result.usage.total_tokens.to_string()),
        result.model,
    );
}

/// Map CLI args to `OcrConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let auth = match cli.auth_header {
        Some(ref name) => AuthScheme::Header(name.clone()),
        None => AuthScheme::Bearer,
    };

    let mut builder = OcrConfig::builder()
        .endpoint(cli.endpoint.clone())
        .api_key(cli.api_key.clone())
        .model(cli.model.clone())
        .api_style(cli.api_style.into())
        .auth(auth)
        .request_timeout_secs(cli.timeout)
        .concurrency(cli.concurrency)
        .batching(cli.batching.into())
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .page_separator(parse_separator(&cli.separator))
        .clean_output(!cli.raw);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "marker" => PageSeparator::Marker,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "heading" => PageSeparator::Heading,
        _ => PageSeparator::Custom(s.to_string()),
    }
}
