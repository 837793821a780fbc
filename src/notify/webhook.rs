use async_trait::async_trait;
use tracing::debug;

use super::{NotificationError, Notifier};

/// Delivers messages by POSTing to the external bot transport's webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: i64, text: &str) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "chat_id": recipient, "text": text }))
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotificationError::Transport(format!(
                "transport answered {}",
                response.status()
            )));
        }
        debug!(recipient, "Notification delivered");
        Ok(())
    }
}
