//! Process command - run a local text or image input through the pipeline.
//!
//! Useful for trying out the structurer on a receipt without wiring up
//! an inbox: the file becomes a one-off message (an image file is
//! treated as an attachment, anything else as the plain body), the
//! structured record is printed as JSON, and `--append` opts into
//! writing the real ledger.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use mailspend_core::{
    AppConfig, Attachment, ExpenseStructurer, InboundMessage, LedgerSink, OcrExtractor, OpenAiChat,
    SheetsLedger, StructureOutcome, select_text,
};

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "tiff"];

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (receipt image or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Append the structured record to the configured ledger
    #[arg(long)]
    append: bool,
}

pub async fn run(args: ProcessArgs) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }

    let message = message_from_file(&args.input)?;
    let text = select_text(&message, &OcrExtractor::new());
    if text.trim().is_empty() {
        anyhow::bail!("no usable text in {}", args.input.display());
    }

    let structurer = ExpenseStructurer::new(OpenAiChat::new(&config.llm)?);
    let record = match structurer.structure(&text).await {
        StructureOutcome::Expense(record) => record,
        StructureOutcome::NotAnExpense => {
            println!("not an expense");
            return Ok(());
        }
        StructureOutcome::ServiceError(err) => {
            anyhow::bail!("structuring failed: {err}");
        }
    };

    println!("{}", serde_json::to_string_pretty(&record)?);

    if args.append {
        let ledger = SheetsLedger::new(&config.ledger)?;
        let row = ledger.append(&record).await?;
        info!(date = %row.date, "row appended to ledger");
        println!("appended: {}", serde_json::Value::Array(row.to_values()));
    }

    Ok(())
}

/// Build a one-off message from a local file.
fn message_from_file(path: &Path) -> anyhow::Result<InboundMessage> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut message = InboundMessage {
        sender: "local".to_string(),
        subject: path.display().to_string(),
        ..InboundMessage::default()
    };

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        message.attachment = Some(Attachment {
            filename: path.display().to_string(),
            media_type: format!("image/{extension}"),
            data: fs::read(path)?,
        });
    } else {
        message.plain_body = fs::read_to_string(path)?;
    }

    Ok(message)
}
