//! Mastodon instance backed by megalodon
//!
//! Works with Mastodon and servers that implement its client API (Pleroma,
//! Akkoma, GoToSocial and friends), authenticated with a pre-issued access
//! token.

use async_trait::async_trait;
use megalodon::megalodon::{
    GetLocalTimelineInputOptions, PostStatusOutput, UpdateCredentialsInputOptions,
};
use megalodon::streaming::{Message, Streaming};
use megalodon::{Megalodon, SNS};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::{Config, DEFAULT_MAX_CHARACTERS};
use crate::error::{ConfigError, InstanceError, Result};
use crate::instance::Instance;
use crate::types::{Account, Status, StreamEvent};

pub struct MastodonInstance {
    client: Box<dyn Megalodon + Send + Sync>,
    base_url: String,
    character_limit: usize,
}

impl MastodonInstance {
    /// Create a client for `base_url` using `access_token`
    ///
    /// The character limit starts at 500; call
    /// [`fetch_instance_info`](Self::fetch_instance_info) to learn the
    /// instance's real limit.
    pub fn new(base_url: String, access_token: String) -> Result<Self> {
        let client = megalodon::generator(SNS::Mastodon, base_url.clone(), Some(access_token), None)
            .map_err(|e| {
                InstanceError::Authentication(format!("Failed to create Mastodon client: {:?}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            character_limit: DEFAULT_MAX_CHARACTERS,
        })
    }

    /// Build a client from a validated [`Config`]
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingField` when no server or token source is set
    /// - `InstanceError::Authentication` when the token file is unreadable or empty
    pub fn from_config(config: &Config) -> Result<Self> {
        let server = config
            .server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingField("server".to_string()))?;

        let token = read_access_token(config)?;

        let mut instance = Self::new(normalize_server_url(server), token)?;
        instance.character_limit = config.max_characters;
        Ok(instance)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the instance for its status length limit
    pub async fn fetch_instance_info(&mut self) -> Result<()> {
        let response = self
            .client
            .get_instance()
            .await
            .map_err(|e| map_megalodon_error(e, "fetch instance info"))?;

        let limit = response.json.configuration.statuses.max_characters as usize;
        tracing::debug!(limit, "instance character limit");
        self.character_limit = limit;

        Ok(())
    }
}

#[async_trait]
impl Instance for MastodonInstance {
    async fn verify_credentials(&self) -> Result<Account> {
        let response = self
            .client
            .verify_account_credentials()
            .await
            .map_err(|e| map_megalodon_error(e, "verify credentials"))?;

        Ok(response.json.into())
    }

    async fn post_status(&self, text: &str) -> Result<String> {
        self.validate_status(text)?;

        let response = self
            .client
            .post_status(text.to_string(), None)
            .await
            .map_err(|e| map_megalodon_error(e, "post status"))?;

        let id = match response.json {
            PostStatusOutput::Status(status) => status.id,
            PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
        };

        Ok(id)
    }

    async fn local_timeline(&self, limit: u32) -> Result<Vec<Status>> {
        let options = GetLocalTimelineInputOptions {
            limit: Some(limit),
            ..Default::default()
        };

        let response = self
            .client
            .get_local_timeline(Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "fetch local timeline"))?;

        Ok(response.json.into_iter().map(Status::from).collect())
    }

    async fn update_display_name(&self, name: &str) -> Result<Account> {
        let options = UpdateCredentialsInputOptions {
            display_name: Some(name.to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .update_credentials(Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "update credentials"))?;

        Ok(response.json.into())
    }

    async fn stream_local(&self, tx: mpsc::Sender<StreamEvent>) -> Result<()> {
        let streaming = self.client.local_streaming().await;

        streaming
            .listen(Box::new(move |message: Message| {
                forward_event(&tx, StreamEvent::from(message));
            }))
            .await;

        tracing::info!("local timeline stream ended");
        Ok(())
    }

    fn character_limit(&self) -> usize {
        self.character_limit
    }
}

impl From<megalodon::entities::Account> for Account {
    fn from(account: megalodon::entities::Account) -> Self {
        Self {
            id: account.id,
            acct: account.acct,
            display_name: account.display_name,
        }
    }
}

impl From<megalodon::entities::Status> for Status {
    fn from(status: megalodon::entities::Status) -> Self {
        Self {
            id: status.id,
            account: status.account.into(),
            content: status.content,
            reblog: status.reblog.map(|original| Box::new(Status::from(*original))),
        }
    }
}

impl From<Message> for StreamEvent {
    fn from(message: Message) -> Self {
        match message {
            Message::Update(status) => StreamEvent::Update(status.into()),
            Message::Delete(id) => StreamEvent::Delete(id),
            Message::Heartbeat() => StreamEvent::Heartbeat,
            Message::Notification(_) => StreamEvent::Other("notification".to_string()),
            Message::Conversation(_) => StreamEvent::Other("conversation".to_string()),
            Message::StatusUpdate(_) => StreamEvent::Other("status.update".to_string()),
        }
    }
}

/// Hand an event to the renderer without blocking the streaming callback
///
/// The callback is synchronous, so a full buffer drops the event rather than
/// waiting. Returns whether the event was queued.
fn forward_event(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::warn!(kind = event.kind(), "stream buffer full, dropping event");
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!("stream receiver dropped, discarding event");
            false
        }
    }
}

/// Read the access token, preferring the inline value over the token file
fn read_access_token(config: &Config) -> Result<String> {
    if let Some(token) = config.access_token.as_deref().map(str::trim) {
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    let token_file = config
        .token_file
        .as_deref()
        .ok_or_else(|| ConfigError::MissingField("access_token or token_file".to_string()))?;

    let token_path = shellexpand::full(token_file).map_err(|e| {
        InstanceError::Authentication(format!("Failed to expand token file path: {}", e))
    })?;

    let token = std::fs::read_to_string(token_path.as_ref())
        .map_err(|e| InstanceError::Authentication(format!("Failed to read token file: {}", e)))?
        .trim()
        .to_string();

    if token.is_empty() {
        return Err(InstanceError::Authentication("Token file is empty".to_string()).into());
    }

    Ok(token)
}

/// Prefix `https://` unless the URL already names a scheme
pub fn normalize_server_url(server: &str) -> String {
    let server = server.trim_end_matches('/');
    if server.starts_with("http://") || server.starts_with("https://") {
        server.to_string()
    } else {
        format!("https://{}", server)
    }
}

fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> InstanceError {
    classify_error(&error.to_string(), context)
}

/// Sort an error message into an [`InstanceError`]
///
/// HTTP status wins when one can be found in the message:
/// 401/403 auth, 422 validation, 429 rate limit, anything else network.
/// Without one, keywords decide, defaulting to a network error.
fn classify_error(message: &str, context: &str) -> InstanceError {
    let lower = message.to_lowercase();

    match extract_http_status(message) {
        Some(401) | Some(403) => InstanceError::Authentication(format!(
            "Mastodon authentication failed ({}): {}. \
             Suggestion: check that your access token is valid and has not been revoked.",
            context, message
        )),
        Some(422) => InstanceError::Validation(format!(
            "Mastodon validation failed ({}): {}",
            context, message
        )),
        Some(429) => InstanceError::RateLimit(format!(
            "Mastodon rate limit exceeded ({}): {}. Suggestion: wait a few minutes.",
            context, message
        )),
        Some(500..=599) => InstanceError::Network(format!(
            "Mastodon server error ({}): {}",
            context, message
        )),
        Some(_) => InstanceError::Network(format!("Mastodon HTTP error ({}): {}", context, message)),
        None if lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("token") =>
        {
            InstanceError::Authentication(format!(
                "Mastodon authentication failed ({}): {}",
                context, message
            ))
        }
        None if lower.contains("rate limit") || lower.contains("too many requests") => {
            InstanceError::RateLimit(format!(
                "Mastodon rate limit exceeded ({}): {}",
                context, message
            ))
        }
        None if lower.contains("unprocessable") || lower.contains("validation") => {
            InstanceError::Validation(format!(
                "Mastodon validation failed ({}): {}",
                context, message
            ))
        }
        None if lower.contains("parse") || lower.contains("json") => InstanceError::Posting(format!(
            "Unexpected response from instance ({}): {}",
            context, message
        )),
        None => InstanceError::Network(format!(
            "Mastodon error ({}): {}. Suggestion: check your network connection and server URL.",
            context, message
        )),
    }
}

/// Find an HTTP status code in an error message
///
/// Looks for "HTTP 401", "status 403", "code: 429" and bare "422:" forms.
fn extract_http_status(message: &str) -> Option<u16> {
    let valid = |code: u16| (100..=599).contains(&code).then_some(code);

    for prefix in ["HTTP ", "status ", "code: ", "status_code: "] {
        if let Some(pos) = message.find(prefix) {
            let code = message
                .get(pos + prefix.len()..pos + prefix.len() + 3)
                .and_then(|s| s.parse::<u16>().ok())
                .and_then(valid);
            if code.is_some() {
                return code;
            }
        }
    }

    let bytes = message.as_bytes();
    for (i, window) in bytes.windows(4).enumerate() {
        let digits = window[..3].iter().all(u8::is_ascii_digit);
        let terminated = window[3] == b':' || window[3] == b' ';
        let standalone = i == 0 || !bytes[i - 1].is_ascii_digit();
        if digits && terminated && standalone {
            let code = std::str::from_utf8(&window[..3])
                .ok()
                .and_then(|s| s.parse::<u16>().ok())
                .and_then(valid);
            if code.is_some() {
                return code;
            }
        }
    }

    None
}
