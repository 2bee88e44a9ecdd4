//! Encoding: raw page bytes → base64 [`EncodedPage`].
//!
//! The client never re-encodes images: PNG and JPEG bytes are sent exactly as
//! read, so what the model sees is byte-identical to the input file. Both
//! payload styles embed the page as a `data:` URI inside the JSON body.

use super::input::{LoadedPage, MediaType};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// A page's bytes as standard base64 plus its media type. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPage {
    media_type: MediaType,
    base64: String,
}

impl EncodedPage {
    pub fn from_bytes(bytes: &[u8], media_type: MediaType) -> Self {
        let base64 = STANDARD.encode(bytes);
        debug!("Encoded {} bytes of {} → {} bytes base64", bytes.len(), media_type, base64.len());
        Self { media_type, base64 }
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type.mime(), self.base64)
    }

    /// Decode back to the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.base64)
    }
}

/// Encode a validated page.
pub fn encode_page(page: &LoadedPage) -> EncodedPage {
    EncodedPage::from_bytes(&page.bytes, page.media_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    #[test]
    fn encode_decode_is_byte_identical() {
        let bytes = png_bytes();
        let page = LoadedPage {
            page_num: 1,
            name: "red.png".into(),
            media_type: MediaType::Png,
            bytes: bytes.clone(),
        };
        let encoded = encode_page(&page);
        assert_eq!(encoded.media_type(), MediaType::Png);
        assert_eq!(encoded.decode().unwrap(), bytes);
    }

    #[test]
    fn data_uri_carries_mime() {
        let e = EncodedPage::from_bytes(b"%PDF-1.4", MediaType::Pdf);
        assert_eq!(e.data_uri(), "data:application/pdf;base64,JVBERi0xLjQ=");
        let e = EncodedPage::from_bytes(&[0xFF, 0xD8, 0xFF], MediaType::Jpeg);
        assert!(e.data_uri().starts_with("data:image/jpeg;base64,"));
    }
}
