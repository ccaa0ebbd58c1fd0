//! Best-effort OCR over receipt images.
//!
//! The extractor decodes the attachment bytes, writes a normalized PNG
//! to a temp file, and hands that file to Tesseract. The temp file is
//! removed when the handle drops, on every exit path. Every failure is
//! converted to an empty-text result and logged; nothing propagates.
//!
//! Tesseract is linked in only when the `ocr` cargo feature is enabled,
//! so the workspace builds on machines without the system
//! leptonica/tesseract libraries. Without the feature the extractor
//! degrades to the same soft failure as a broken backend.

use image::ImageFormat;
use tracing::{debug, warn};

use crate::content::ExtractText;
use crate::error::OcrError;

/// Tesseract-backed text extractor.
#[derive(Debug, Clone)]
pub struct OcrExtractor {
    language: String,
}

impl OcrExtractor {
    /// Create an extractor using the English language pack.
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    /// Override the Tesseract language pack.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn recognize(&self, bytes: &[u8]) -> std::result::Result<String, OcrError> {
        let image = image::load_from_memory(bytes)?;

        // Tesseract reads from a file; the handle guarantees removal.
        let file = tempfile::Builder::new()
            .prefix("mailspend-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(file.path(), ImageFormat::Png)?;

        backend::recognize(file.path(), &self.language)
    }
}

impl Default for OcrExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractText for OcrExtractor {
    fn extract(&self, bytes: &[u8]) -> String {
        match self.recognize(bytes) {
            Ok(text) => {
                debug!(chars = text.len(), "OCR extracted text");
                text
            }
            Err(err) => {
                warn!(error = %err, "OCR failed, treating as empty text");
                String::new()
            }
        }
    }
}

#[cfg(feature = "ocr")]
mod backend {
    use std::path::Path;

    use leptess::LepTess;

    use crate::error::OcrError;

    pub fn recognize(path: &Path, language: &str) -> Result<String, OcrError> {
        let mut tess = LepTess::new(None, language)
            .map_err(|err| OcrError::Backend(format!("tesseract init failed: {err}")))?;
        tess.set_image(path)
            .map_err(|err| OcrError::Backend(format!("failed to load image: {err}")))?;
        tess.get_utf8_text()
            .map_err(|err| OcrError::Backend(format!("text recognition failed: {err}")))
    }
}

#[cfg(not(feature = "ocr"))]
mod backend {
    use std::path::Path;

    use crate::error::OcrError;

    pub fn recognize(_path: &Path, _language: &str) -> Result<String, OcrError> {
        Err(OcrError::BackendUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn corrupt_bytes_yield_empty_text() {
        let extractor = OcrExtractor::new();
        assert_eq!(extractor.extract(b"not an image"), "");
    }

    #[test]
    fn empty_bytes_yield_empty_text() {
        let extractor = OcrExtractor::new();
        assert_eq!(extractor.extract(&[]), "");
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn valid_image_without_backend_yields_empty_text() {
        let extractor = OcrExtractor::new();
        assert_eq!(extractor.extract(&png_bytes()), "");
    }

    #[cfg(feature = "ocr")]
    #[test]
    fn blank_image_does_not_panic() {
        let extractor = OcrExtractor::new();
        // A blank 4x4 image carries no text; the result may be empty but
        // must come back without an error escaping.
        let _ = extractor.extract(&png_bytes());
    }
}
