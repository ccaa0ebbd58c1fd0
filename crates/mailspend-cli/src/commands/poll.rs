//! Poll command - IMAP polling ingress.
//!
//! Connects to the mailbox over TLS, searches for unseen messages, and
//! feeds each one through the pipeline. Messages are processed one at a
//! time; a failure on one message is logged and the loop continues with
//! the next. Every fetched message is flagged `\Seen` regardless of the
//! pipeline outcome, so a message is never reprocessed even when logging
//! it failed.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use imap::{ImapConnection, Session};
use tracing::{error, info, warn};

use mailspend_core::{AppConfig, AppPipeline, ImapConfig};

use super::mime;

/// Arguments for the poll command.
#[derive(Args)]
pub struct PollArgs {
    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Poll interval override, in seconds
    #[arg(short, long)]
    interval: Option<u64>,
}

pub async fn run(args: PollArgs) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let interval = args
        .interval
        .map(Duration::from_secs)
        .unwrap_or(config.imap.poll_interval);

    let pipeline = Arc::new(AppPipeline::from_config(&config)?);

    info!(
        host = %config.imap.host,
        interval_seconds = interval.as_secs(),
        "mailbox poller starting",
    );

    loop {
        let imap_config = config.imap.clone();
        let cycle_pipeline = Arc::clone(&pipeline);
        let handle = tokio::runtime::Handle::current();

        // The imap client is synchronous; the whole cycle runs off the
        // async executor and blocks on each network call in turn.
        let cycle =
            tokio::task::spawn_blocking(move || poll_cycle(&imap_config, &cycle_pipeline, &handle))
                .await?;
        if let Err(err) = cycle {
            error!(error = %err, "poll cycle failed");
        }

        if args.once {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

/// One poll cycle: login, process every unseen message, logout.
fn poll_cycle(
    config: &ImapConfig,
    pipeline: &AppPipeline,
    handle: &tokio::runtime::Handle,
) -> anyhow::Result<()> {
    let account = config
        .account
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("GMAIL_EMAIL is not configured"))?;
    let password = config
        .password
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("GMAIL_APP_PASSWORD is not configured"))?;

    let client = imap::ClientBuilder::new(&config.host, config.port).connect()?;
    let mut session = client.login(account, password).map_err(|(err, _)| err)?;

    session.select("INBOX")?;

    let mut unseen: Vec<u32> = session.search("UNSEEN")?.into_iter().collect();
    unseen.sort_unstable();
    info!(count = unseen.len(), "checked mailbox for unseen messages");

    for id in unseen {
        // One bad message must not abort the batch.
        if let Err(err) = process_message(&mut session, id, pipeline, handle) {
            error!(id, error = %err, "failed to process message");
        }

        // Flag as seen whatever happened downstream; re-delivery is
        // never attempted.
        if let Err(err) = session.store(id.to_string(), "+FLAGS (\\Seen)") {
            warn!(id, error = %err, "failed to flag message as seen");
        }
    }

    session.logout()?;
    Ok(())
}

/// Fetch one message, normalize it, and run the pipeline on it.
fn process_message(
    session: &mut Session<Box<dyn ImapConnection>>,
    id: u32,
    pipeline: &AppPipeline,
    handle: &tokio::runtime::Handle,
) -> anyhow::Result<()> {
    let fetches = session.fetch(id.to_string(), "RFC822")?;
    let raw = fetches
        .iter()
        .next()
        .and_then(|fetch| fetch.body())
        .ok_or_else(|| anyhow::anyhow!("fetch returned no message body"))?;

    let message = mime::parse_rfc822(raw)?;
    info!(id, sender = %message.sender, subject = %message.subject, "fetched message");

    // Outcome is logged by the pipeline.
    handle.block_on(pipeline.process(&message));
    Ok(())
}
