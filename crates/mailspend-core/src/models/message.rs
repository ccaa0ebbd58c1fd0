//! The normalized in-memory shape of an inbound email.
//!
//! Both ingress adapters (webhook and IMAP poller) translate their
//! protocol-specific input into this model before handing it to the
//! pipeline. Messages are constructed per event, consumed once, and
//! never retained.

/// A single decoded attachment carried by a message.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    /// Original filename as declared by the sender.
    pub filename: String,

    /// Declared media type (e.g. `image/png`).
    pub media_type: String,

    /// Decoded payload bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Whether the declared media type marks this attachment as an image.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// A normalized inbound email message.
///
/// At most one attachment is carried: the adapters keep the first image
/// attachment they encounter and ignore the rest.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    /// Sender address, as given by the transport.
    pub sender: String,

    /// Decoded subject line.
    pub subject: String,

    /// Plain-text body; may be empty.
    pub plain_body: String,

    /// HTML body; may be empty.
    pub html_body: String,

    /// First image attachment found, if any.
    pub attachment: Option<Attachment>,
}
