//! End-to-end test against a real OCR endpoint.
//!
//! Makes live API calls, so it is gated behind the `E2E_ENABLED` environment
//! variable and skipped otherwise. Endpoint settings come from the same
//! variables the CLI reads (a `.env` file works too, via the shell).
//!
//! Run with:
//!   E2E_ENABLED=1 MISTRAL_OCR_ENDPOINT=... MISTRAL_OCR_KEY=... \
//!     cargo test --test e2e -- --nocapture

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ocr2md::{ApiStyle, DocumentInput, ExtractOptions, OcrClient, OcrConfig};
use std::io::Cursor;

/// Skip unless E2E_ENABLED and the endpoint variables are set.
macro_rules! e2e_config_or_skip {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let (Ok(endpoint), Ok(key)) = (
            std::env::var("MISTRAL_OCR_ENDPOINT"),
            std::env::var("MISTRAL_OCR_KEY"),
        ) else {
            println!("SKIP: MISTRAL_OCR_ENDPOINT / MISTRAL_OCR_KEY not set");
            return;
        };
        let mut builder = OcrConfig::builder().endpoint(endpoint).api_key(key);
        if let Ok(model) = std::env::var("MISTRAL_OCR_MODEL_NAME") {
            builder = builder.model(model);
        }
        if std::env::var("OCR2MD_API_STYLE").as_deref() == Ok("document") {
            builder = builder.api_style(ApiStyle::DocumentOcr);
        }
        builder.build().expect("valid e2e config")
    }};
}

fn blank_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("png encode");
    buf
}

#[tokio::test]
async fn e2e_blank_page_round_trip() {
    let config = e2e_config_or_skip!();
    let client = OcrClient::new(config).expect("client");

    let doc = DocumentInput::Image(ocr2md::DocumentSource::bytes("blank.png", blank_png()));
    let result = client
        .extract(&doc, None, ExtractOptions::default())
        .await
        .expect("live extraction");

    println!("markdown: {:?}", result.markdown);
    println!("usage: {:?}", result.usage);
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.stats.request_count, 1);
    assert!(
        !result.markdown.starts_with("```"),
        "output must not start with a code fence"
    );
}

#[tokio::test]
async fn e2e_two_pages_keep_order() {
    let config = e2e_config_or_skip!();
    let client = OcrClient::new(config).expect("client");

    let doc = DocumentInput::Pages(vec![
        ocr2md::DocumentSource::bytes("p1.png", blank_png()),
        ocr2md::DocumentSource::bytes("p2.png", blank_png()),
    ]);
    let result = client
        .extract(&doc, None, ExtractOptions::default())
        .await
        .expect("live extraction");

    let markers = result
        .markdown
        .lines()
        .filter(|l| l.starts_with("--- Page "))
        .count();
    assert_eq!(markers, 1, "got: {}", result.markdown);
    assert_eq!(result.stats.request_count, 2);
}
