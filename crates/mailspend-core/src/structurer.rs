//! AI-based expense structuring.
//!
//! Free text (possibly with HTML noise) goes to a chat-completion
//! service under a fixed instruction contract and comes back as either
//! a validated [`ExpenseRecord`] or "not an expense". The response is
//! never trusted: shape and types are checked here, and every failure
//! mode is logged and normalized so callers see a plain outcome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::error::StructureError;
use crate::models::config::LlmConfig;
use crate::models::expense::{CATEGORIES, ExpenseRecord};

/// Sampling temperature: deterministic-leaning for consistent structured
/// output over creative variation.
const TEMPERATURE: f32 = 0.2;

/// Inputs shorter than this (trimmed) skip the model call entirely.
const MIN_INPUT_CHARS: usize = 5;

/// Outcome of one structuring attempt.
///
/// `NotAnExpense` and `ServiceError` are collapsed to the same external
/// behavior (nothing logged) by the pipeline; the distinction exists for
/// observability only.
#[derive(Debug)]
pub enum StructureOutcome {
    /// The text described an expense and the response validated.
    Expense(ExpenseRecord),

    /// The model declined, returned nulls, or returned an invalid shape.
    NotAnExpense,

    /// The service itself failed (configuration, network, protocol).
    ServiceError(StructureError),
}

/// A chat-completion backend.
///
/// The production implementation is [`OpenAiChat`]; tests substitute
/// counting or canned fakes at this seam.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Issue one completion and return the assistant message text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        temperature: f32,
    ) -> std::result::Result<String, StructureError>;
}

/// Chat-completion client for an OpenAI-compatible endpoint.
pub struct OpenAiChat {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiChat {
    /// Build a client from configuration. A missing API key is tolerated
    /// here and reported when a completion is attempted.
    pub fn new(config: &LlmConfig) -> std::result::Result<Self, StructureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(45))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        temperature: f32,
    ) -> std::result::Result<String, StructureError> {
        let api_key = self.api_key.as_ref().ok_or(StructureError::MissingApiKey)?;

        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_text},
            ],
            "temperature": temperature,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                StructureError::MalformedResponse("no message content in completion".to_string())
            })
    }
}

/// Converts free text into validated expense records via a chat model.
pub struct ExpenseStructurer<C: ChatModel> {
    model: C,
}

impl<C: ChatModel> ExpenseStructurer<C> {
    /// Wrap a chat backend.
    pub fn new(model: C) -> Self {
        Self { model }
    }

    /// Structure `text` into an expense record, or decide it is not one.
    pub async fn structure(&self, text: &str) -> StructureOutcome {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_INPUT_CHARS {
            info!("input text too short or empty, skipping model call");
            return StructureOutcome::NotAnExpense;
        }

        let preview: String = trimmed.chars().take(200).collect();
        info!(%preview, "sending text for structuring");

        let raw = match self.model.complete(&system_prompt(), text, TEMPERATURE).await {
            Ok(raw) => raw,
            Err(err) => {
                error!(error = %err, "chat completion failed");
                return StructureOutcome::ServiceError(err);
            }
        };
        debug!(%raw, "model response");

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "model returned invalid JSON, treating as not an expense");
                return StructureOutcome::NotAnExpense;
            }
        };

        match validate_response(&value) {
            Some(record) => {
                info!(
                    amount = %record.amount,
                    vendor = %record.vendor,
                    category = %record.category,
                    "structured expense",
                );
                StructureOutcome::Expense(record)
            }
            None => {
                info!("model returned nulls or invalid fields, likely not an expense");
                StructureOutcome::NotAnExpense
            }
        }
    }
}

/// Check the model response shape without trusting it.
///
/// `amount` must be a JSON number (a numeric string fails), and both
/// `vendor` and `category` must be non-empty strings.
fn validate_response(value: &Value) -> Option<ExpenseRecord> {
    let amount = value.get("amount")?.as_f64()?;
    let vendor = value.get("vendor")?.as_str().filter(|s| !s.is_empty())?;
    let category = value.get("category")?.as_str().filter(|s| !s.is_empty())?;

    let amount = Decimal::try_from(amount).ok()?;
    Some(ExpenseRecord {
        amount,
        vendor: vendor.to_string(),
        category: category.to_string(),
    })
}

/// The fixed instruction contract sent as the system message.
fn system_prompt() -> String {
    format!(
        "You are an expert accountant's assistant. You read the text of an email \
and decide whether it describes a single expense.\n\
\n\
Return *only* a valid JSON object with exactly these fields:\n\
  \"amount\": the total amount spent, as a number without currency symbols\n\
  \"vendor\": the vendor or merchant name\n\
  \"category\": one of [{categories}]\n\
\n\
If the email is *not* an expense, return {{\"amount\": null, \"vendor\": null, \"category\": null}}.\n\
\n\
Handling minimal input:\n\
* If the vendor isn't clear, infer a generic one from the item \
(e.g. 'coffee' -> 'Coffee Shop', 'gas' -> 'Gas Station').\n\
* If the category isn't clear, use 'Other'.\n\
\n\
Example 1 (minimal):\n\
Input: 'spent $15 on coffee'\n\
Output: {{\"amount\": 15.00, \"vendor\": \"Coffee Shop\", \"category\": \"Food\"}}\n\
\n\
Example 2 (minimal):\n\
Input: '$50 gas'\n\
Output: {{\"amount\": 50.00, \"vendor\": \"Gas Station\", \"category\": \"Transport\"}}\n\
\n\
Example 3 (more detail):\n\
Input: 'spent $35 on a book about dragons'\n\
Output: {{\"amount\": 35.00, \"vendor\": \"Book\", \"category\": \"Shopping\"}}\n\
\n\
Example 4 (HTML receipt):\n\
Input: '<table><tr><td>Order total</td></tr></table> Total: $18.50 ... Uber Eats ...'\n\
Output: {{\"amount\": 18.50, \"vendor\": \"Uber Eats\", \"category\": \"Food\"}}\n\
\n\
The input may contain raw HTML markup; ignore the markup and extract the \
total amount and the vendor name despite the noise.",
        categories = CATEGORIES.join(", "),
    )
}
