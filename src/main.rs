//! mailtree - Prints a resolved Gmail message as JSON
//!
//! Usage: `mailtree <message-id> [offset] [limit]`
//!
//! Reads the OAuth access token from `GMAIL_ACCESS_TOKEN`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mailtree::config::Settings;
use mailtree::domain::EmailId;
use mailtree::providers::email::GmailBackend;
use mailtree::MessageService;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_or_default().context("loading settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(message_id) = args.next() else {
        bail!("usage: mailtree <message-id> [offset] [limit]");
    };
    let offset = args
        .next()
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("offset must be a non-negative integer")?
        .unwrap_or(0);
    let limit = args
        .next()
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("limit must be a non-negative integer")?;

    let token = std::env::var("GMAIL_ACCESS_TOKEN").context("GMAIL_ACCESS_TOKEN is not set")?;
    let backend = GmailBackend::new(token, &settings.gmail).context("creating Gmail backend")?;
    let service = MessageService::new(Arc::new(backend), settings);

    let id = EmailId::from(message_id);
    tracing::info!(message_id = %id, "resolving message");

    let details = service
        .get_message(&id, true)
        .await
        .with_context(|| format!("fetching message {}", id))?;
    let limit = limit.unwrap_or(service.settings().body.window_limit);
    let window = mailtree::mime::paginate(details.email.body.as_deref(), offset, limit);

    let output = serde_json::json!({
        "email": details.email,
        "attachments": details.attachments,
        "body": window,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
