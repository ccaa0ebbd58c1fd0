//! Core library for the mailspend expense pipeline.
//!
//! This crate provides:
//! - The in-memory message model both ingress adapters normalize into
//! - Content selection (receipt image OCR, plain body, HTML body)
//! - AI-based expense structuring with strict response validation
//! - Append-only ledger writing against a Google Sheets spreadsheet
//! - The shared per-message pipeline driven by the webhook and the poller

pub mod content;
pub mod error;
pub mod ledger;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod structurer;

pub use content::{ExtractText, select_text};
pub use error::{LedgerError, MailspendError, OcrError, Result, StructureError};
pub use ledger::{LedgerSink, SheetsLedger};
pub use models::config::{AppConfig, ImapConfig, LedgerConfig, LlmConfig, ServerConfig};
pub use models::expense::{CATEGORIES, ExpenseRecord, LedgerRow};
pub use models::message::{Attachment, InboundMessage};
pub use ocr::OcrExtractor;
pub use pipeline::{AppPipeline, Pipeline, PipelineOutcome};
pub use structurer::{ChatModel, ExpenseStructurer, OpenAiChat, StructureOutcome};
