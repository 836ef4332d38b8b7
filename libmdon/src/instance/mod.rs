//! Server access
//!
//! Commands talk to a Mastodon-compatible server only through the
//! [`Instance`] trait. [`mastodon::MastodonInstance`] backs it with megalodon;
//! [`mock::MockInstance`] serves canned data for tests.
//!
//! # Examples
//!
//! ```no_run
//! use libmdon::instance::{mastodon::MastodonInstance, Instance};
//!
//! # async fn example() -> libmdon::Result<()> {
//! let instance = MastodonInstance::new(
//!     "https://mastodon.social".to_string(),
//!     "your-access-token".to_string(),
//! )?;
//!
//! let me = instance.verify_credentials().await?;
//! println!("logged in as {}", me.acct);
//!
//! for status in instance.local_timeline(20).await? {
//!     println!("{}", status.id);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{InstanceError, Result};
use crate::types::{Account, Status, StreamEvent};

pub mod mastodon;

// Mock instance is available for all builds (not just tests) to support integration tests
pub mod mock;

#[async_trait]
pub trait Instance: Send + Sync {
    /// Check the access token and return the account it belongs to
    ///
    /// # Errors
    ///
    /// Returns `InstanceError::Authentication` when the token is rejected
    async fn verify_credentials(&self) -> Result<Account>;

    /// Publish a public status and return its id
    async fn post_status(&self, text: &str) -> Result<String>;

    /// Fetch up to `limit` statuses from the local public timeline, newest first
    async fn local_timeline(&self, limit: u32) -> Result<Vec<Status>>;

    async fn update_display_name(&self, name: &str) -> Result<Account>;

    /// Subscribe to the local public timeline
    ///
    /// Events are pushed into `tx` one at a time in arrival order. Returns when
    /// the underlying subscription ends or the receiving side is dropped.
    async fn stream_local(&self, tx: mpsc::Sender<StreamEvent>) -> Result<()>;

    /// Maximum status length in characters
    fn character_limit(&self) -> usize;

    /// Check a status before posting it
    ///
    /// Length is counted in Unicode scalar values, not bytes.
    ///
    /// # Errors
    ///
    /// Returns `InstanceError::Validation` for empty or over-long text
    fn validate_status(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(InstanceError::Validation("Content cannot be empty".to_string()).into());
        }

        let limit = self.character_limit();
        let char_count = text.chars().count();
        if char_count > limit {
            return Err(InstanceError::Validation(format!(
                "Content exceeds the instance's {} character limit (current: {} characters)",
                limit, char_count
            ))
            .into());
        }

        Ok(())
    }
}
