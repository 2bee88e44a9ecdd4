//! Error types for the ocr2md library.
//!
//! Every failure of [`crate::OcrClient::extract`] is surfaced as one
//! [`OcrError`]. Nothing is swallowed or degraded into an empty success: a
//! timeout on page 3 of 5 fails the whole call, and the caller decides whether
//! to retry. The client never retries on its own.
//!
//! Variants fall into three groups:
//!
//! * **Input**: the document could not be read or is not acceptable
//!   ([`OcrError::InputNotFound`], [`OcrError::EmptyInput`],
//!   [`OcrError::UnsupportedFormat`]). Raised before any network call.
//! * **Remote**: the endpoint could not be reached or answered badly
//!   ([`OcrError::NetworkFailure`], [`OcrError::Timeout`],
//!   [`OcrError::RemoteError`], [`OcrError::MalformedResponse`]).
//! * **Local plumbing**: configuration and output file problems.
//!
//! [`OcrError::kind`] gives a fieldless discriminant for `match`-heavy callers,
//! and [`OcrError::hint`] the one-line advice a UI should show next to it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ocr2md library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file does not exist or cannot be opened.
    #[error("Input not found or unreadable: '{path}'")]
    InputNotFound { path: PathBuf },

    /// Input resolved to zero bytes (or an empty page list).
    #[error("Input '{source_name}' is empty")]
    EmptyInput { source_name: String },

    /// Media type is outside {PNG, JPEG, PDF}, or does not match the declared form.
    #[error("Unsupported format for '{source_name}': {detail}")]
    UnsupportedFormat { source_name: String, detail: String },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// Connection could not be established or was dropped.
    #[error("Network failure talking to OCR endpoint: {detail}")]
    NetworkFailure { detail: String },

    /// The call exceeded the configured timeout with no response.
    #[error("OCR request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The endpoint answered with a non-success status.
    #[error("OCR endpoint returned HTTP {status}: {body}")]
    RemoteError { status: u16, body: String },

    /// Success status, but the body is not the expected shape.
    #[error("Malformed response from OCR endpoint: {detail}")]
    MalformedResponse { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fieldless discriminant of [`OcrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InputNotFound,
    EmptyInput,
    UnsupportedFormat,
    NetworkFailure,
    Timeout,
    RemoteError,
    MalformedResponse,
    OutputWriteFailed,
    InvalidConfig,
    Internal,
}

impl OcrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrError::InputNotFound { .. } => ErrorKind::InputNotFound,
            OcrError::EmptyInput { .. } => ErrorKind::EmptyInput,
            OcrError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            OcrError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            OcrError::Timeout { .. } => ErrorKind::Timeout,
            OcrError::RemoteError { .. } => ErrorKind::RemoteError,
            OcrError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            OcrError::OutputWriteFailed { .. } => ErrorKind::OutputWriteFailed,
            OcrError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            OcrError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether repeating the identical call has a reasonable chance of succeeding.
    ///
    /// Advisory only: `extract` has no side effects besides the remote call,
    /// so a retry is always safe, just not always useful.
    pub fn is_retryable(&self) -> bool {
        match self {
            OcrError::NetworkFailure { .. } | OcrError::Timeout { .. } => true,
            OcrError::RemoteError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short actionable advice for an end user.
    pub fn hint(&self) -> &'static str {
        match self {
            OcrError::InputNotFound { .. } => "Check that the file path exists and is readable.",
            OcrError::EmptyInput { .. } | OcrError::UnsupportedFormat { .. } => {
                "File too large or corrupted? Only PNG, JPEG and PDF files are accepted."
            }
            OcrError::NetworkFailure { .. } => {
                "Check your network connection and the endpoint URL."
            }
            OcrError::Timeout { .. } => {
                "The model took too long; retry, split the document, or raise the timeout."
            }
            OcrError::RemoteError { status, .. } => match status {
                401 | 403 => "Check your endpoint/key.",
                404 => "Check the endpoint URL and the model/deployment name.",
                413 => "The document is too large for the endpoint.",
                429 => "Rate limited by the endpoint; wait and retry.",
                s if *s >= 500 => "The OCR service is having trouble; retry later.",
                _ => "The endpoint rejected the request; check the model name and payload style.",
            },
            OcrError::MalformedResponse { .. } => {
                "The endpoint answered in an unexpected format; check the API style setting."
            }
            OcrError::OutputWriteFailed { .. } => "Check the output directory permissions.",
            OcrError::InvalidConfig(_) => "Fix the configuration and try again.",
            OcrError::Internal(_) => "This is a bug; please report it.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display() {
        let e = OcrError::RemoteError {
            status: 401,
            body: "invalid key".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("invalid key"));
    }

    #[test]
    fn auth_failures_point_at_credentials() {
        for status in [401, 403] {
            let e = OcrError::RemoteError {
                status,
                body: String::new(),
            };
            assert_eq!(e.hint(), "Check your endpoint/key.");
            assert!(!e.is_retryable());
        }
    }

    #[test]
    fn timeout_display_and_retry() {
        let e = OcrError::Timeout { elapsed_ms: 60000 };
        assert!(e.to_string().contains("60000ms"));
        assert!(e.is_retryable());
        assert_eq!(e.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn server_errors_are_retryable() {
        let e = OcrError::RemoteError {
            status: 503,
            body: "overloaded".into(),
        };
        assert!(e.is_retryable());
        let e = OcrError::RemoteError {
            status: 400,
            body: "bad".into(),
        };
        assert!(!e.is_retryable());
    }

    #[test]
    fn input_errors_share_format_hint() {
        let empty = OcrError::EmptyInput {
            source_name: "a.png".into(),
        };
        let unsupported = OcrError::UnsupportedFormat {
            source_name: "a.gif".into(),
            detail: "gif".into(),
        };
        assert_eq!(empty.hint(), unsupported.hint());
        assert_eq!(unsupported.kind(), ErrorKind::UnsupportedFormat);
    }
}
