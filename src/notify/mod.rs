use async_trait::async_trait;

pub mod webhook;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Outbound message hook towards the chat transport. Sends are best-effort:
/// callers log failures and never roll back already-committed state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), NotificationError>;
}
