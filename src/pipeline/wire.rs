//! JSON payloads for the two endpoint styles.
//!
//! Request types borrow nothing and are built fresh per call; response types
//! accept only the fields the client needs and ignore the rest, so new fields
//! on the server side never break parsing.

use super::encode::EncodedPage;
use super::input::MediaType;
use crate::error::OcrError;
use crate::output::TokenUsage;
use crate::prompts::USER_PROMPT;
use serde::{Deserialize, Serialize};

/// What one remote call returned, before post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    /// Text blocks in page order. One block unless the endpoint demarcated pages.
    pub pages: Vec<String>,
    pub usage: TokenUsage,
}

// ── Chat completions ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    DocumentUrl { document_url: String },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ContentPart {
    fn attachment(page: &EncodedPage) -> Self {
        match page.media_type() {
            MediaType::Pdf => ContentPart::DocumentUrl {
                document_url: page.data_uri(),
            },
            MediaType::Png | MediaType::Jpeg => ContentPart::ImageUrl {
                image_url: ImageUrl { url: page.data_uri() },
            },
        }
    }
}

/// System message with the instructions, then one user message holding the
/// prompt text followed by every attachment in page order.
pub fn build_chat_request(
    model: &str,
    instructions: &str,
    pages: &[EncodedPage],
    temperature: f32,
    max_tokens: usize,
) -> ChatRequest {
    let mut parts = Vec::with_capacity(pages.len() + 1);
    parts.push(ContentPart::Text {
        text: USER_PROMPT.to_string(),
    });
    parts.extend(pages.iter().map(ContentPart::attachment));

    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageContent::Text(instructions.to_string()),
            },
            ChatMessage {
                role: "user",
                content: MessageContent::Parts(parts),
            },
        ],
        temperature,
        max_tokens,
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<ReplyContent>,
}

/// Some servers return a plain string, others an array of typed parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplyContent {
    Text(String),
    Parts(Vec<ReplyPart>),
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

pub fn parse_chat_response(body: &str) -> Result<RemoteReply, OcrError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| malformed(e, body))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::MalformedResponse {
            detail: "response has no choices".to_string(),
        })?
        .message
        .content
        .ok_or_else(|| OcrError::MalformedResponse {
            detail: "first choice has no message content".to_string(),
        })?;

    let text = match content {
        ReplyContent::Text(t) => t,
        ReplyContent::Parts(parts) => parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""),
    };

    let usage = parsed.usage.unwrap_or_default();
    Ok(RemoteReply {
        pages: vec![text],
        usage: TokenUsage::new(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens),
    })
}

// ── Document OCR ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DocumentOcrRequest {
    pub model: String,
    pub document: DocumentChunk,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentChunk {
    ImageUrl { image_url: String },
    DocumentUrl { document_url: String },
}

pub fn build_document_request(model: &str, page: &EncodedPage) -> DocumentOcrRequest {
    let document = match page.media_type() {
        MediaType::Pdf => DocumentChunk::DocumentUrl {
            document_url: page.data_uri(),
        },
        MediaType::Png | MediaType::Jpeg => DocumentChunk::ImageUrl {
            image_url: page.data_uri(),
        },
    };
    DocumentOcrRequest {
        model: model.to_string(),
        document,
    }
}

#[derive(Debug, Deserialize)]
struct DocumentOcrResponse {
    pages: Vec<DocumentOcrPage>,
}

#[derive(Debug, Deserialize)]
struct DocumentOcrPage {
    #[serde(default)]
    index: usize,
    markdown: String,
}

/// Pages come back with a 0-based `index`; they are re-sorted by it.
pub fn parse_document_response(body: &str) -> Result<RemoteReply, OcrError> {
    let mut parsed: DocumentOcrResponse =
        serde_json::from_str(body).map_err(|e| malformed(e, body))?;
    if parsed.pages.is_empty() {
        return Err(OcrError::MalformedResponse {
            detail: "response has no pages".to_string(),
        });
    }
    parsed.pages.sort_by_key(|p| p.index);
    Ok(RemoteReply {
        pages: parsed.pages.into_iter().map(|p| p.markdown).collect(),
        usage: TokenUsage::default(),
    })
}

fn malformed(e: serde_json::Error, body: &str) -> OcrError {
    let preview: String = body.chars().take(200).collect();
    OcrError::MalformedResponse {
        detail: format!("{e} (body starts with: {preview:?})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn chat_request_shape() {
        let pages = vec![
            EncodedPage::from_bytes(b"\x89PNG", MediaType::Png),
            EncodedPage::from_bytes(b"%PDF", MediaType::Pdf),
        ];
        let req = build_chat_request("mistral-ocr-2503", "be precise", &pages, 0.0, 4096);
        let v: Value = serde_json::to_value(&req).unwrap();

        assert_eq!(v["model"], "mistral-ocr-2503");
        assert_eq!(v["max_tokens"], 4096);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][0]["content"], "be precise");

        let parts = v["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert!(parts[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(parts[2]["type"], "document_url");
        assert!(parts[2]["document_url"]
            .as_str()
            .unwrap()
            .starts_with("data:application/pdf;base64,"));
    }

    #[test]
    fn document_request_shape() {
        let page = EncodedPage::from_bytes(b"%PDF", MediaType::Pdf);
        let v = serde_json::to_value(build_document_request("m", &page)).unwrap();
        assert_eq!(v["document"]["type"], "document_url");

        let page = EncodedPage::from_bytes(b"\xFF\xD8\xFF", MediaType::Jpeg);
        let v = serde_json::to_value(build_document_request("m", &page)).unwrap();
        assert_eq!(v["document"]["type"], "image_url");
        assert!(v["document"]["image_url"].as_str().unwrap().starts_with("data:image/jpeg"));
    }

    #[test]
    fn parses_chat_reply_with_usage() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "# INVOICE #1234"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128}
        })
        .to_string();
        let reply = parse_chat_response(&body).unwrap();
        assert_eq!(reply.pages, vec!["# INVOICE #1234".to_string()]);
        assert_eq!(reply.usage, TokenUsage::new(120, 8, Some(128)));
    }

    #[test]
    fn oversized_usage_counters_saturate() {
        let body = r#"{"choices":[{"message":{"content":"x"}}],"usage":{"prompt_tokens":18446744073709551615,"completion_tokens":1}}"#;
        let reply = parse_chat_response(body).unwrap();
        assert_eq!(reply.usage.input_tokens, u64::MAX);
        assert_eq!(reply.usage.total_tokens, u64::MAX);
        let summed = reply.usage + reply.usage;
        assert_eq!(summed.output_tokens, 2);
        assert_eq!(summed.total_tokens, u64::MAX);
    }

    #[test]
    fn parses_chat_reply_with_parts_and_no_usage() {
        let body = json!({
            "choices": [{"message": {"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]}}]
        })
        .to_string();
        let reply = parse_chat_response(&body).unwrap();
        assert_eq!(reply.pages, vec!["ab".to_string()]);
        assert_eq!(reply.usage, TokenUsage::default());
    }

    #[test]
    fn chat_reply_without_choices_is_malformed() {
        let err = parse_chat_response(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, OcrError::MalformedResponse { .. }));
        let err = parse_chat_response("<html>gateway</html>").unwrap_err();
        assert!(err.to_string().contains("gateway"));
        let err = parse_chat_response(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap_err();
        assert!(matches!(err, OcrError::MalformedResponse { .. }));
    }

    #[test]
    fn document_reply_is_sorted_by_index() {
        let body = json!({
            "pages": [
                {"index": 1, "markdown": "second"},
                {"index": 0, "markdown": "first"}
            ],
            "usage_info": {"pages_processed": 2}
        })
        .to_string();
        let reply = parse_document_response(&body).unwrap();
        assert_eq!(reply.pages, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn document_reply_without_pages_is_malformed() {
        assert!(parse_document_response(r#"{"pages": []}"#).is_err());
        assert!(parse_document_response(r#"{"text": "x"}"#).is_err());
    }
}
