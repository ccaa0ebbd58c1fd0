//! The shared per-message pipeline.
//!
//! Both ingress adapters hand their normalized [`InboundMessage`] to
//! [`Pipeline::process`]: content selection, structuring, and the
//! ledger append run sequentially, and every internal failure is
//! logged and folded into a [`PipelineOutcome`]. The method never
//! returns an error, so one bad message can never abort a batch or a
//! request cycle.

use tracing::{error, info};

use crate::content::{ExtractText, select_text};
use crate::ledger::{LedgerSink, SheetsLedger};
use crate::models::config::AppConfig;
use crate::models::expense::LedgerRow;
use crate::models::message::InboundMessage;
use crate::ocr::OcrExtractor;
use crate::structurer::{ChatModel, ExpenseStructurer, OpenAiChat, StructureOutcome};

/// Terminal state of one message's processing.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A row was appended to the ledger.
    Appended(LedgerRow),

    /// The message carried no usable text; the model was never called.
    NoContent,

    /// The model decided the text does not describe an expense.
    NotAnExpense,

    /// The structuring service failed; nothing was logged.
    StructureFailed,

    /// A record validated but the ledger append failed.
    AppendFailed,
}

/// The expense pipeline with its collaborators injected.
///
/// Construct once at process start and share across messages; all state
/// is immutable per invocation.
pub struct Pipeline<E: ExtractText, C: ChatModel, L: LedgerSink> {
    extractor: E,
    structurer: ExpenseStructurer<C>,
    ledger: L,
}

/// The production pipeline wiring.
pub type AppPipeline = Pipeline<OcrExtractor, OpenAiChat, SheetsLedger>;

impl AppPipeline {
    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let structurer = ExpenseStructurer::new(OpenAiChat::new(&config.llm)?);
        let ledger = SheetsLedger::new(&config.ledger)?;
        Ok(Pipeline::new(OcrExtractor::new(), structurer, ledger))
    }
}

impl<E: ExtractText, C: ChatModel, L: LedgerSink> Pipeline<E, C, L> {
    /// Assemble a pipeline from its collaborators.
    pub fn new(extractor: E, structurer: ExpenseStructurer<C>, ledger: L) -> Self {
        Self {
            extractor,
            structurer,
            ledger,
        }
    }

    /// Process one message to completion.
    pub async fn process(&self, message: &InboundMessage) -> PipelineOutcome {
        info!(sender = %message.sender, subject = %message.subject, "processing message");

        let text = select_text(message, &self.extractor);
        if text.trim().is_empty() {
            info!("no usable text found in email body or attachments");
            return PipelineOutcome::NoContent;
        }

        match self.structurer.structure(&text).await {
            StructureOutcome::Expense(record) => match self.ledger.append(&record).await {
                Ok(row) => PipelineOutcome::Appended(row),
                Err(err) => {
                    error!(error = %err, "failed to log expense to ledger");
                    PipelineOutcome::AppendFailed
                }
            },
            StructureOutcome::NotAnExpense => {
                info!("no valid expense data parsed, nothing logged");
                PipelineOutcome::NotAnExpense
            }
            StructureOutcome::ServiceError(err) => {
                error!(error = %err, "structuring service failed, nothing logged");
                PipelineOutcome::StructureFailed
            }
        }
    }
}
