//! Core data types for mdon
//!
//! These are deliberately small: only the fields the terminal renderer needs.
//! Conversions from megalodon entities live in `instance::mastodon`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    /// `user` for local accounts, `user@host` for remote ones
    pub acct: String,
    pub display_name: String,
}

impl Account {
    pub fn new(id: &str, acct: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            acct: acct.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// A single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub account: Account,
    /// HTML fragment as served by the instance
    pub content: String,
    /// Set when this status is a boost of another one
    pub reblog: Option<Box<Status>>,
}

impl Status {
    pub fn new(id: &str, account: Account, content: &str) -> Self {
        Self {
            id: id.to_string(),
            account,
            content: content.to_string(),
            reblog: None,
        }
    }

    /// Wrap `original` in a boost made by `booster`
    pub fn boost(id: &str, booster: Account, original: Status) -> Self {
        Self {
            id: id.to_string(),
            account: booster,
            content: String::new(),
            reblog: Some(Box::new(original)),
        }
    }

    pub fn is_reblog(&self) -> bool {
        self.reblog.is_some()
    }
}

/// Event delivered by a live timeline subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Update(Status),
    /// Id of a deleted status
    Delete(String),
    Heartbeat,
    /// Anything the renderer has no use for, named by its event type
    Other(String),
}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Update(_) => "update",
            StreamEvent::Delete(_) => "delete",
            StreamEvent::Heartbeat => "heartbeat",
            StreamEvent::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_wraps_original() {
        let alice = Account::new("1", "alice", "Alice");
        let bob = Account::new("2", "bob@remote.example", "Bob");
        let original = Status::new("10", bob.clone(), "<p>hi</p>");

        let boost = Status::boost("11", alice.clone(), original.clone());
        assert!(boost.is_reblog());
        assert_eq!(boost.account, alice);
        assert_eq!(boost.reblog.as_deref(), Some(&original));
        assert!(!original.is_reblog());
    }

    #[test]
    fn test_stream_event_kind() {
        let account = Account::new("1", "alice", "Alice");
        assert_eq!(
            StreamEvent::Update(Status::new("1", account, "")).kind(),
            "update"
        );
        assert_eq!(StreamEvent::Delete("1".to_string()).kind(), "delete");
        assert_eq!(
            StreamEvent::Other("notification".to_string()).kind(),
            "other"
        );
        assert_eq!(StreamEvent::Heartbeat.kind(), "heartbeat");
    }
}
