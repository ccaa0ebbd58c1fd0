//! MIME normalization for the polling ingress.
//!
//! Walks the parsed MIME tree and fills the common message shape: the
//! first non-attachment `text/plain` and `text/html` parts become the
//! bodies, and the first `image/*` attachment is decoded and kept.
//! Undecodable parts are logged and skipped, never fatal for the
//! message as a whole.

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use tracing::{debug, info, warn};

use mailspend_core::{Attachment, InboundMessage};

/// Parse a raw RFC822 message into the common message shape.
pub fn parse_rfc822(raw: &[u8]) -> anyhow::Result<InboundMessage> {
    let mail = mailparse::parse_mail(raw)?;

    let mut message = InboundMessage {
        sender: mail.headers.get_first_value("From").unwrap_or_default(),
        subject: mail.headers.get_first_value("Subject").unwrap_or_default(),
        ..InboundMessage::default()
    };

    collect_parts(&mail, &mut message);
    Ok(message)
}

fn collect_parts(part: &ParsedMail, message: &mut InboundMessage) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_parts(sub, message);
        }
        return;
    }

    let media_type = part.ctype.mimetype.to_ascii_lowercase();
    let disposition = part.get_content_disposition();
    let is_attachment = disposition.disposition == DispositionType::Attachment;

    if is_attachment {
        if media_type.starts_with("image/") {
            if message.attachment.is_some() {
                debug!(%media_type, "ignoring additional image attachment");
                return;
            }
            let filename = disposition
                .params
                .get("filename")
                .cloned()
                .unwrap_or_default();
            match part.get_body_raw() {
                Ok(data) => {
                    info!(%filename, "found image attachment");
                    message.attachment = Some(Attachment {
                        filename,
                        media_type,
                        data,
                    });
                }
                Err(err) => warn!(%filename, error = %err, "failed to decode attachment"),
            }
        } else {
            debug!(%media_type, "skipping non-image attachment");
        }
        return;
    }

    match media_type.as_str() {
        "text/plain" if message.plain_body.is_empty() => {
            message.plain_body = part.get_body().unwrap_or_else(|err| {
                warn!(error = %err, "could not decode plain text part");
                String::new()
            });
        }
        "text/html" if message.html_body.is_empty() => {
            message.html_body = part.get_body().unwrap_or_else(|err| {
                warn!(error = %err, "could not decode html part");
                String::new()
            });
        }
        _ => {}
    }
}
