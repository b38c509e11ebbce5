//! Transient status banner shared by all editor actions.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// How long a status message stays visible.
pub const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Holds at most one message; a new post replaces the old one immediately and
/// a message disappears once `clear_after` has passed.
#[derive(Debug)]
pub struct StatusSlot {
    posted: Option<(StatusMessage, Instant)>,
    clear_after: Duration,
}

impl Default for StatusSlot {
    fn default() -> Self {
        Self::new(STATUS_CLEAR_AFTER)
    }
}

impl StatusSlot {
    pub fn new(clear_after: Duration) -> Self {
        Self {
            posted: None,
            clear_after,
        }
    }

    pub fn post(&mut self, message: StatusMessage) {
        self.posted = Some((message, Instant::now()));
    }

    pub fn clear(&mut self) {
        self.posted = None;
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.posted
            .as_ref()
            .filter(|(_, at)| at.elapsed() < self.clear_after)
            .map(|(message, _)| message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_message_clears_after_delay() {
        let mut slot = StatusSlot::default();
        slot.post(StatusMessage::success("Saved"));
        assert_eq!(slot.current(), Some(&StatusMessage::success("Saved")));

        tokio::time::advance(Duration::from_millis(2900)).await;
        assert!(slot.current().is_some());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(slot.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_message_replaces_and_restarts_clock() {
        let mut slot = StatusSlot::default();
        slot.post(StatusMessage::success("First"));
        tokio::time::advance(Duration::from_secs(2)).await;

        slot.post(StatusMessage::error("Second"));
        assert_eq!(slot.current(), Some(&StatusMessage::error("Second")));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(slot.current(), Some(&StatusMessage::error("Second")));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(slot.current().is_none());
    }
}
