//! Serve command - webhook ingress for pushed email events.
//!
//! Accepts the inbound-parse multipart form (`from`, `subject`, `text`,
//! `html`, `attachments` count, `attachment{i}` file parts), normalizes
//! it into an [`InboundMessage`], and runs the pipeline. The endpoint
//! always answers 200 with a JSON acknowledgement, even when processing
//! fails internally, so the upstream sender never enters a retry storm.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::Json;
use axum::routing::post;
use clap::Args;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use mailspend_core::{AppConfig, AppPipeline, Attachment, InboundMessage};

const INBOUND_BODY_MAX_BYTES: usize = 25 * 1024 * 1024;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Bind address override
    #[arg(long)]
    host: Option<String>,

    /// Listen port override
    #[arg(short, long)]
    port: Option<u16>,
}

struct AppState {
    pipeline: AppPipeline,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let pipeline = AppPipeline::from_config(&config)?;
    let state = Arc::new(AppState { pipeline });

    let app = Router::new()
        .route("/webhook", post(webhook))
        .layer(DefaultBodyLimit::max(INBOUND_BODY_MAX_BYTES))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "webhook ingress listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn webhook(State(state): State<Arc<AppState>>, multipart: Multipart) -> Json<Value> {
    info!("webhook received");

    match read_form(multipart).await {
        Ok(message) => {
            // Outcome is logged by the pipeline; the sender always sees success.
            state.pipeline.process(&message).await;
        }
        Err(err) => error!(error = %err, "failed to read webhook form"),
    }

    Json(json!({"status": "received"}))
}

/// Normalize the multipart form into the common message shape.
///
/// The first `image/*` file part wins; further attachments are logged
/// and ignored.
async fn read_form(mut multipart: Multipart) -> anyhow::Result<InboundMessage> {
    let mut message = InboundMessage::default();
    let mut declared = 0usize;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "from" => message.sender = field.text().await?,
            "subject" => message.subject = field.text().await?,
            "text" => message.plain_body = field.text().await?,
            "html" => message.html_body = field.text().await?,
            "attachments" => declared = field.text().await?.trim().parse().unwrap_or(0),
            _ if name.starts_with("attachment") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let media_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await?.to_vec();

                if media_type.starts_with("image/") {
                    if message.attachment.is_none() {
                        info!(%filename, "processing image attachment");
                        message.attachment = Some(Attachment {
                            filename,
                            media_type,
                            data,
                        });
                    } else {
                        info!(%filename, "ignoring additional image attachment");
                    }
                } else if !filename.is_empty() {
                    info!(%filename, "skipping non-image attachment");
                }
            }
            _ => {}
        }
    }

    if declared > 0 && message.attachment.is_none() {
        debug!(declared, "declared attachments contained no image");
    }

    Ok(message)
}
