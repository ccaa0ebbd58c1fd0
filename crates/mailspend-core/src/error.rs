//! Error types for the mailspend-core library.

use thiserror::Error;

/// Main error type for the mailspend library.
#[derive(Error, Debug)]
pub enum MailspendError {
    /// OCR text extraction error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Expense structuring error.
    #[error("structuring error: {0}")]
    Structure(#[from] StructureError),

    /// Ledger append error.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors related to OCR text extraction.
///
/// These never cross the pipeline boundary: the extractor converts them
/// to an empty-text result and logs them.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The attachment bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Temp file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The OCR backend failed to initialize or run.
    #[error("OCR backend error: {0}")]
    Backend(String),

    /// Built without the `ocr` feature; no backend is linked in.
    #[error("OCR backend not available (built without the `ocr` feature)")]
    BackendUnavailable,
}

/// Errors related to the language-model structuring call.
#[derive(Error, Debug)]
pub enum StructureError {
    /// No API key is configured for the chat-completion service.
    #[error("language-model API key is not configured")]
    MissingApiKey,

    /// Transport-level failure talking to the chat-completion service.
    #[error("chat completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not carry a completion message.
    #[error("malformed chat completion response: {0}")]
    MalformedResponse(String),
}

/// Errors related to appending rows to the spreadsheet ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No service-account credential path is configured.
    #[error("service-account credential path is not configured")]
    CredentialsMissing,

    /// The credential file could not be read or parsed, or its key is invalid.
    #[error("invalid service-account credentials: {0}")]
    Credentials(String),

    /// The token exchange with the OAuth endpoint failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The configured spreadsheet was not found or is not shared with the
    /// service-account identity.
    #[error("spreadsheet '{0}' not found or not shared with the service account")]
    SpreadsheetNotFound(String),

    /// Transport-level failure talking to the spreadsheet service.
    #[error("spreadsheet request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The spreadsheet service returned an error status.
    #[error("spreadsheet API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The spreadsheet service returned a body we could not interpret.
    #[error("unexpected spreadsheet API response: {0}")]
    MalformedResponse(String),
}

/// Result type for the mailspend library.
pub type Result<T> = std::result::Result<T, MailspendError>;
