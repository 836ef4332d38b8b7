//! Subcommand implementations
//!
//! Each function takes the [`Instance`] to talk to and, where it prints, the
//! writer and [`Palette`] to print with. The binary only parses arguments and
//! picks one of these.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{InstanceError, MdError, Result};
use crate::instance::Instance;
use crate::render::{render_account, write_status, write_timeline, Palette};
use crate::types::{Account, StreamEvent};

/// Default number of statuses fetched by `tl`
pub const DEFAULT_TIMELINE_LIMIT: u32 = 20;

/// Events buffered between the subscription task and the renderer
///
/// The live subscription drops events that arrive while the buffer is full.
pub const STREAM_BUFFER: usize = 64;

/// Join command-line words so the text needs no quoting
fn join_words(words: &[String]) -> String {
    words.join(" ")
}

/// Post `words`, joined by single spaces, as a new status
///
/// Returns the id of the new status.
pub async fn toot(instance: &dyn Instance, words: &[String]) -> Result<String> {
    let text = join_words(words);
    if text.trim().is_empty() {
        return Err(MdError::InvalidInput("Nothing to toot".to_string()));
    }

    let id = instance.post_status(&text).await?;
    info!(id = %id, chars = text.chars().count(), "posted status");
    Ok(id)
}

/// Print the local public timeline, oldest first
///
/// Returns how many statuses were printed.
pub async fn timeline<W: Write>(
    instance: &dyn Instance,
    limit: u32,
    palette: &Palette,
    out: &mut W,
) -> Result<usize> {
    let statuses = instance.local_timeline(limit).await?;
    debug!(
        count = statuses.len(),
        boosts = statuses.iter().filter(|s| s.is_reblog()).count(),
        "fetched local timeline"
    );

    write_timeline(out, &statuses, palette)?;
    Ok(statuses.len())
}

/// Follow the live local timeline until it ends or `shutdown` resolves
///
/// The subscription runs on its own task and hands events over a bounded
/// channel of [`STREAM_BUFFER`] events; they are rendered one at a time in
/// arrival order. Events already received are printed before `shutdown` is
/// checked. Only new statuses are printed. Returns how many were printed.
pub async fn stream<W, F>(
    instance: Arc<dyn Instance>,
    palette: &Palette,
    out: &mut W,
    shutdown: F,
) -> Result<usize>
where
    W: Write,
    F: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::channel(STREAM_BUFFER);
    let subscription = tokio::spawn(async move { instance.stream_local(tx).await });
    tokio::pin!(shutdown);

    let mut rendered = 0;
    loop {
        tokio::select! {
            biased;

            event = rx.recv() => match event {
                Some(StreamEvent::Update(status)) => {
                    write_status(out, &status, palette)?;
                    out.flush()?;
                    rendered += 1;
                }
                Some(other) => debug!(kind = other.kind(), "skipping stream event"),
                None => break,
            },
            _ = &mut shutdown => {
                info!(rendered, "stream interrupted");
                subscription.abort();
                return Ok(rendered);
            }
        }
    }

    match subscription.await {
        Ok(result) => result?,
        Err(e) => {
            return Err(InstanceError::Stream(format!("subscription task failed: {}", e)).into())
        }
    }

    info!(rendered, "stream finished");
    Ok(rendered)
}

/// Change the account display name to `words` joined by single spaces
pub async fn update_name(instance: &dyn Instance, words: &[String]) -> Result<Account> {
    let name = join_words(words);
    if name.trim().is_empty() {
        return Err(MdError::InvalidInput("Display name cannot be empty".to_string()));
    }

    let account = instance.update_display_name(&name).await?;
    info!(acct = %account.acct, display_name = %account.display_name, "updated display name");
    Ok(account)
}

/// Print the account the access token belongs to
pub async fn whoami<W: Write>(
    instance: &dyn Instance,
    palette: &Palette,
    out: &mut W,
) -> Result<Account> {
    let account = instance.verify_credentials().await?;
    writeln!(out, "{}", render_account(&account, palette))?;
    Ok(account)
}
