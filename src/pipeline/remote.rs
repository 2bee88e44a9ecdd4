//! Endpoint interaction: POST one payload, classify the outcome.
//!
//! This is the only stage with network I/O. It performs exactly one attempt:
//! the timeout configured on the shared `reqwest::Client` bounds the whole
//! exchange (connect, send, body), and every failure maps to one distinct
//! [`OcrError`] variant. Retrying is the caller's decision.

use super::wire::{self, ChatRequest, DocumentOcrRequest, RemoteReply};
use crate::config::{AuthScheme, OcrConfig};
use crate::error::OcrError;
use std::time::Instant;
use tracing::{debug, warn};

/// Longest slice of an error body kept in [`OcrError::RemoteError`].
const MAX_ERROR_BODY: usize = 2048;

/// A ready-to-send request body.
#[derive(Debug)]
pub enum Payload {
    Chat(ChatRequest),
    Document(DocumentOcrRequest),
}

/// Send `payload` to the configured endpoint and parse the reply.
pub async fn call_endpoint(
    http: &reqwest::Client,
    config: &OcrConfig,
    payload: &Payload,
) -> Result<RemoteReply, OcrError> {
    let start = Instant::now();

    let request = http.post(&config.endpoint);
    let request = match &config.auth {
        AuthScheme::Bearer => request.bearer_auth(&config.api_key),
        AuthScheme::Header(name) => request.header(name.as_str(), config.api_key.as_str()),
    };
    let request = match payload {
        Payload::Chat(body) => request.json(body),
        Payload::Document(body) => request.json(body),
    };

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(e, start))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, start))?;

    let elapsed_ms = start.elapsed().as_millis() as u64;

    if !status.is_success() {
        warn!("OCR endpoint returned HTTP {} after {}ms", status.as_u16(), elapsed_ms);
        return Err(OcrError::RemoteError {
            status: status.as_u16(),
            body: truncate(body, MAX_ERROR_BODY),
        });
    }

    let reply = match payload {
        Payload::Chat(_) => wire::parse_chat_response(&body)?,
        Payload::Document(_) => wire::parse_document_response(&body)?,
    };

    debug!(
        "OCR reply: {} block(s), {} input tokens, {} output tokens, {}ms",
        reply.pages.len(),
        reply.usage.input_tokens,
        reply.usage.output_tokens,
        elapsed_ms
    );

    Ok(reply)
}

/// Classify a `reqwest` failure that happened before a full body arrived.
fn transport_error(e: reqwest::Error, start: Instant) -> OcrError {
    if e.is_timeout() {
        return OcrError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
    }
    if e.is_builder() {
        return OcrError::InvalidConfig(error_chain(&e));
    }
    OcrError::NetworkFailure {
        detail: error_chain(&e),
    }
}

/// `e` and all its sources joined with `: `.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}
