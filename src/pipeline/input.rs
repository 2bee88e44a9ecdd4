//! Input resolution: turn a [`DocumentInput`] into validated bytes.
//!
//! Everything that can be checked locally is checked here, before any network
//! call: the file must exist, be non-empty, and its *content* must be PNG, JPEG
//! or PDF. File extensions are only used to guess the form in
//! [`DocumentInput::from_path`]; the magic bytes decide.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the bytes of one document or page come from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file on disk, read during `extract`.
    Path(PathBuf),
    /// Bytes already in memory; `name` is only used in messages.
    Bytes { name: String, data: Vec<u8> },
}

impl DocumentSource {
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        DocumentSource::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Human-readable name for logs and errors.
    pub fn name(&self) -> String {
        match self {
            DocumentSource::Path(p) => p.display().to_string(),
            DocumentSource::Bytes { name, .. } => name.clone(),
        }
    }

    /// Read the raw bytes. The file handle lives only for this call.
    async fn read(&self) -> Result<Vec<u8>, OcrError> {
        match self {
            DocumentSource::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                debug!("Cannot read '{}': {}", path.display(), e);
                OcrError::InputNotFound { path: path.clone() }
            }),
            DocumentSource::Bytes { data, .. } => Ok(data.clone()),
        }
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(p: PathBuf) -> Self {
        DocumentSource::Path(p)
    }
}

impl From<&Path> for DocumentSource {
    fn from(p: &Path) -> Self {
        DocumentSource::Path(p.to_path_buf())
    }
}

impl From<&str> for DocumentSource {
    fn from(p: &str) -> Self {
        DocumentSource::Path(PathBuf::from(p))
    }
}

/// The document handed to [`crate::OcrClient::extract`].
///
/// Exactly one form is active per request.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    /// A single PNG or JPEG image.
    Image(DocumentSource),
    /// A single PDF, sent whole; the endpoint splits pages.
    Pdf(DocumentSource),
    /// Page images in reading order.
    Pages(Vec<DocumentSource>),
}

impl DocumentInput {
    /// Guess the form from the extension: `.pdf` → [`DocumentInput::Pdf`],
    /// anything else → [`DocumentInput::Image`]. Content is still verified
    /// during extraction.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            DocumentInput::Pdf(DocumentSource::Path(path))
        } else {
            DocumentInput::Image(DocumentSource::Path(path))
        }
    }

    /// One path behaves like [`DocumentInput::from_path`]; several become
    /// [`DocumentInput::Pages`] in the given order.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
        if paths.len() == 1 {
            if let Some(only) = paths.pop() {
                return Self::from_path(only);
            }
        }
        DocumentInput::Pages(paths.into_iter().map(DocumentSource::Path).collect())
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentInput::Image(_) => DocumentKind::Image,
            DocumentInput::Pdf(_) => DocumentKind::Pdf,
            DocumentInput::Pages(_) => DocumentKind::Pages,
        }
    }
}

/// Fieldless view of [`DocumentInput`]'s form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Image,
    Pdf,
    Pages,
}

/// Media types accepted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Png,
    Jpeg,
    Pdf,
}

impl MediaType {
    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Pdf => "application/pdf",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaType::Png | MediaType::Jpeg)
    }

    /// Detect the media type from magic bytes.
    ///
    /// Returns a description of what was found when it is not allowed.
    pub fn sniff(bytes: &[u8]) -> Result<MediaType, String> {
        if bytes.starts_with(b"%PDF") {
            return Ok(MediaType::Pdf);
        }
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => Ok(MediaType::Png),
            Ok(image::ImageFormat::Jpeg) => Ok(MediaType::Jpeg),
            Ok(other) => Err(format!(
                "{:?} images are not supported (allowed: PNG, JPEG, PDF)",
                other
            )),
            Err(_) => Err("content is not a PNG, JPEG or PDF file".to_string()),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Bytes of one validated page (or whole PDF), ready for encoding.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// 1-indexed position in the input.
    pub page_num: usize,
    pub name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

/// A fully validated document.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub kind: DocumentKind,
    pub pages: Vec<LoadedPage>,
}

/// Read and validate every source in `document`.
///
/// Errors, in check order: [`OcrError::InputNotFound`],
/// [`OcrError::EmptyInput`], [`OcrError::UnsupportedFormat`].
pub async fn resolve_input(document: &DocumentInput) -> Result<ResolvedDocument, OcrError> {
    let kind = document.kind();
    let pages = match document {
        DocumentInput::Image(src) => vec![load(src, 1, Expect::Image).await?],
        DocumentInput::Pdf(src) => vec![load(src, 1, Expect::Pdf).await?],
        DocumentInput::Pages(sources) => {
            if sources.is_empty() {
                return Err(OcrError::EmptyInput {
                    source_name: "<empty page list>".to_string(),
                });
            }
            let mut pages = Vec::with_capacity(sources.len());
            for (i, src) in sources.iter().enumerate() {
                pages.push(load(src, i + 1, Expect::Image).await?);
            }
            pages
        }
    };
    debug!("Resolved {:?} input with {} part(s)", kind, pages.len());
    Ok(ResolvedDocument { kind, pages })
}

#[derive(Clone, Copy)]
enum Expect {
    Image,
    Pdf,
}

async fn load(src: &DocumentSource, page_num: usize, expect: Expect) -> Result<LoadedPage, OcrError> {
    let name = src.name();
    let bytes = src.read().await?;
    if bytes.is_empty() {
        return Err(OcrError::EmptyInput { source_name: name });
    }

    let media_type = MediaType::sniff(&bytes).map_err(|detail| OcrError::UnsupportedFormat {
        source_name: name.clone(),
        detail,
    })?;

    let mismatch = match (expect, media_type.is_image()) {
        (Expect::Image, false) => Some("expected a PNG or JPEG image but found a PDF".to_string()),
        (Expect::Pdf, true) => Some(format!("expected a PDF but found {}", media_type)),
        _ => None,
    };
    if let Some(detail) = mismatch {
        return Err(OcrError::UnsupportedFormat {
            source_name: name,
            detail,
        });
    }

    Ok(LoadedPage {
        page_num,
        name,
        media_type,
        bytes,
    })
}
