//! Content selection: decide which text blob a message contributes.
//!
//! Strict priority order, first non-empty wins: OCR text from an image
//! attachment, then the plain-text body, then the raw HTML body. HTML is
//! passed through unstripped; the structurer is expected to tolerate
//! markup noise.

use tracing::info;

use crate::models::message::InboundMessage;

/// Best-effort text extraction from image bytes.
///
/// Implementations must be soft-failing: any problem yields an empty
/// string, never an error the pipeline has to handle.
pub trait ExtractText {
    fn extract(&self, bytes: &[u8]) -> String;
}

/// Select the single text blob to feed downstream.
///
/// Returns an empty string when the message has no usable content, in
/// which case the pipeline short-circuits without a model call.
pub fn select_text(message: &InboundMessage, extractor: &impl ExtractText) -> String {
    if let Some(attachment) = &message.attachment {
        if attachment.is_image() {
            let text = extractor.extract(&attachment.data);
            if !text.trim().is_empty() {
                return text;
            }
            info!(filename = %attachment.filename, "no text recognized in image, using email body");
        }
    }

    if !message.plain_body.is_empty() {
        message.plain_body.clone()
    } else {
        message.html_body.clone()
    }
}
