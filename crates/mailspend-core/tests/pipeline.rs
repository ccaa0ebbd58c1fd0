//! End-to-end pipeline scenarios over fake collaborators.
//!
//! No network: the chat model and the ledger are substituted at their
//! trait seams, and OCR is a stub returning canned receipt text. Fakes
//! are `Arc`-shared so the tests keep a handle for assertions after the
//! pipeline takes ownership.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use mailspend_core::{
    Attachment, ChatModel, ExpenseRecord, ExpenseStructurer, ExtractText, InboundMessage,
    LedgerError, LedgerRow, LedgerSink, Pipeline, PipelineOutcome, StructureError,
};

/// OCR stub yielding fixed text for any image bytes.
struct StubOcr(&'static str);

impl ExtractText for StubOcr {
    fn extract(&self, _bytes: &[u8]) -> String {
        self.0.to_string()
    }
}

/// Chat fake returning a canned completion and counting calls.
struct FakeChat {
    response: String,
    calls: AtomicUsize,
}

impl FakeChat {
    fn returning(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

/// Shared handle to a [`FakeChat`]; the trait is implemented on this local
/// newtype so the orphan rules allow it in the integration-test crate.
struct SharedChat(Arc<FakeChat>);

#[async_trait]
impl ChatModel for SharedChat {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_text: &str,
        _temperature: f32,
    ) -> Result<String, StructureError> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.response.clone())
    }
}

/// Ledger fake recording every appended record.
#[derive(Default)]
struct RecordingLedger {
    rows: Mutex<Vec<ExpenseRecord>>,
    fail: bool,
}

impl RecordingLedger {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    fn appended(&self) -> Vec<ExpenseRecord> {
        self.rows.lock().unwrap().clone()
    }
}

/// Shared handle to a [`RecordingLedger`]; the trait is implemented on this
/// local newtype so the orphan rules allow it in the integration-test crate.
struct SharedLedger(Arc<RecordingLedger>);

#[async_trait]
impl LedgerSink for SharedLedger {
    async fn append(&self, record: &ExpenseRecord) -> Result<LedgerRow, LedgerError> {
        if self.0.fail {
            return Err(LedgerError::CredentialsMissing);
        }
        self.0.rows.lock().unwrap().push(record.clone());
        Ok(LedgerRow::for_today(record))
    }
}

type TestPipeline = Pipeline<StubOcr, SharedChat, SharedLedger>;

fn pipeline(ocr: StubOcr, chat: Arc<FakeChat>, ledger: Arc<RecordingLedger>) -> TestPipeline {
    Pipeline::new(ocr, ExpenseStructurer::new(SharedChat(chat)), SharedLedger(ledger))
}

fn plain_message(body: &str) -> InboundMessage {
    InboundMessage {
        sender: "alice@example.com".into(),
        subject: "expense".into(),
        plain_body: body.into(),
        ..InboundMessage::default()
    }
}

fn amount(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[tokio::test]
async fn coffee_email_is_structured_and_appended() {
    let ledger = RecordingLedger::new();
    let pipe = pipeline(
        StubOcr(""),
        FakeChat::returning(r#"{"amount": 15.00, "vendor": "Coffee Shop", "category": "Food"}"#),
        Arc::clone(&ledger),
    );

    let outcome = pipe.process(&plain_message("spent $15 on coffee")).await;

    match outcome {
        PipelineOutcome::Appended(row) => {
            assert_eq!(row.amount, amount("15.00"));
            assert_eq!(row.vendor, "Coffee Shop");
            assert_eq!(row.category, "Food");
        }
        other => panic!("expected an appended row, got {other:?}"),
    }
    assert_eq!(ledger.appended().len(), 1);
}

#[tokio::test]
async fn receipt_image_is_ocred_and_appended() {
    let ledger = RecordingLedger::new();
    let pipe = pipeline(
        StubOcr("Order #1187\nTotal: $18.50\nUber Eats"),
        FakeChat::returning(r#"{"amount": 18.50, "vendor": "Uber Eats", "category": "Food"}"#),
        Arc::clone(&ledger),
    );

    let mut message = plain_message("");
    message.attachment = Some(Attachment {
        filename: "receipt.png".into(),
        media_type: "image/png".into(),
        data: vec![0x89, b'P', b'N', b'G'],
    });

    let outcome = pipe.process(&message).await;

    match outcome {
        PipelineOutcome::Appended(row) => {
            assert_eq!(row.amount, amount("18.50"));
            assert_eq!(row.vendor, "Uber Eats");
        }
        other => panic!("expected an appended row, got {other:?}"),
    }
}

#[tokio::test]
async fn non_expense_chatter_appends_nothing() {
    let ledger = RecordingLedger::new();
    let pipe = pipeline(
        StubOcr(""),
        FakeChat::returning(r#"{"amount": null, "vendor": null, "category": null}"#),
        Arc::clone(&ledger),
    );

    let outcome = pipe
        .process(&plain_message("Hey, are we still on for lunch Friday?"))
        .await;

    assert!(matches!(outcome, PipelineOutcome::NotAnExpense));
    assert!(ledger.appended().is_empty());
}

#[tokio::test]
async fn empty_message_never_reaches_the_model() {
    let chat = FakeChat::returning(r#"{"amount": 1, "vendor": "x", "category": "Other"}"#);
    let pipe = pipeline(StubOcr(""), Arc::clone(&chat), RecordingLedger::new());

    let outcome = pipe.process(&InboundMessage::default()).await;

    assert!(matches!(outcome, PipelineOutcome::NoContent));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ledger_failure_is_contained() {
    let pipe = pipeline(
        StubOcr(""),
        FakeChat::returning(r#"{"amount": 15.00, "vendor": "Coffee Shop", "category": "Food"}"#),
        RecordingLedger::failing(),
    );

    let outcome = pipe.process(&plain_message("spent $15 on coffee")).await;

    assert!(matches!(outcome, PipelineOutcome::AppendFailed));
}

#[tokio::test]
async fn reprocessing_the_same_content_appends_twice() {
    // No deduplication is attempted anywhere; two runs mean two rows.
    let ledger = RecordingLedger::new();
    let pipe = pipeline(
        StubOcr(""),
        FakeChat::returning(r#"{"amount": 15.00, "vendor": "Coffee Shop", "category": "Food"}"#),
        Arc::clone(&ledger),
    );
    let message = plain_message("spent $15 on coffee");

    pipe.process(&message).await;
    pipe.process(&message).await;

    assert_eq!(ledger.appended().len(), 2);
}
