//! In-memory instance for tests
//!
//! Serves canned timelines and stream events, records what was posted, and
//! can be told to fail specific operations.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use crate::config::DEFAULT_MAX_CHARACTERS;
use crate::error::{InstanceError, Result};
use crate::instance::Instance;
use crate::types::{Account, Status, StreamEvent};

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub account: Account,
    /// Timeline returned newest first, like the real API
    pub timeline: Vec<Status>,
    /// Events pushed, in order, by `stream_local`
    pub events: Vec<StreamEvent>,
    pub auth_error: Option<String>,
    pub post_error: Option<String>,
    pub stream_error: Option<String>,
    /// Leave the subscription open once every event has been pushed
    pub keep_open: bool,
    /// Fired once every event has been pushed
    pub events_sent: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    pub character_limit: usize,

    /// Texts accepted by `post_status`, in call order
    pub posted: Arc<Mutex<Vec<String>>>,
    /// Limits requested from `local_timeline`
    pub timeline_requests: Arc<Mutex<Vec<u32>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            account: Account::new("1", "mock", "Mock User"),
            timeline: Vec::new(),
            events: Vec::new(),
            auth_error: None,
            post_error: None,
            stream_error: None,
            keep_open: false,
            events_sent: Arc::new(Mutex::new(None)),
            character_limit: DEFAULT_MAX_CHARACTERS,
            posted: Arc::new(Mutex::new(Vec::new())),
            timeline_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub struct MockInstance {
    config: MockConfig,
    display_name: Mutex<String>,
}

impl MockInstance {
    pub fn new(config: MockConfig) -> Self {
        let display_name = Mutex::new(config.account.display_name.clone());
        Self {
            config,
            display_name,
        }
    }

    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    pub fn with_timeline(timeline: Vec<Status>) -> Self {
        Self::new(MockConfig {
            timeline,
            ..Default::default()
        })
    }

    pub fn with_events(events: Vec<StreamEvent>) -> Self {
        Self::new(MockConfig {
            events,
            ..Default::default()
        })
    }

    /// Every authenticated call fails with an authentication error
    pub fn auth_failure(error: &str) -> Self {
        Self::new(MockConfig {
            auth_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    pub fn post_failure(error: &str) -> Self {
        Self::new(MockConfig {
            post_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Push `events`, then fail the subscription with `error`
    pub fn stream_failure(events: Vec<StreamEvent>, error: &str) -> Self {
        Self::new(MockConfig {
            events,
            stream_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Push `events`, report it on the returned receiver, then never end
    pub fn endless(events: Vec<StreamEvent>) -> (Self, oneshot::Receiver<()>) {
        let (done_tx, done_rx) = oneshot::channel();
        let mock = Self::new(MockConfig {
            events,
            keep_open: true,
            events_sent: Arc::new(Mutex::new(Some(done_tx))),
            ..Default::default()
        });
        (mock, done_rx)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self::new(MockConfig {
            character_limit: limit,
            ..Default::default()
        })
    }

    pub fn posted(&self) -> Vec<String> {
        self.config.posted.lock().unwrap().clone()
    }

    pub fn timeline_requests(&self) -> Vec<u32> {
        self.config.timeline_requests.lock().unwrap().clone()
    }

    pub fn display_name(&self) -> String {
        self.display_name.lock().unwrap().clone()
    }

    fn check_auth(&self) -> Result<()> {
        match &self.config.auth_error {
            Some(error) => Err(InstanceError::Authentication(error.clone()).into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Instance for MockInstance {
    async fn verify_credentials(&self) -> Result<Account> {
        self.check_auth()?;
        let mut account = self.config.account.clone();
        account.display_name = self.display_name();
        Ok(account)
    }

    async fn post_status(&self, text: &str) -> Result<String> {
        self.check_auth()?;
        self.validate_status(text)?;

        if let Some(error) = &self.config.post_error {
            return Err(InstanceError::Posting(error.clone()).into());
        }

        let mut posted = self.config.posted.lock().unwrap();
        posted.push(text.to_string());
        Ok(format!("mock-{}", posted.len()))
    }

    async fn local_timeline(&self, limit: u32) -> Result<Vec<Status>> {
        self.check_auth()?;
        self.config.timeline_requests.lock().unwrap().push(limit);
        Ok(self
            .config
            .timeline
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_display_name(&self, name: &str) -> Result<Account> {
        self.check_auth()?;
        *self.display_name.lock().unwrap() = name.to_string();
        self.verify_credentials().await
    }

    async fn stream_local(&self, tx: mpsc::Sender<StreamEvent>) -> Result<()> {
        self.check_auth()?;

        for event in &self.config.events {
            if tx.send(event.clone()).await.is_err() {
                return Ok(());
            }
        }

        let done = self.config.events_sent.lock().unwrap().take();
        if let Some(done) = done {
            let _ = done.send(());
        }
        if self.config.keep_open {
            std::future::pending::<()>().await;
        }

        match &self.config.stream_error {
            Some(error) => Err(InstanceError::Stream(error.clone()).into()),
            None => Ok(()),
        }
    }

    fn character_limit(&self) -> usize {
        self.config.character_limit
    }
}
