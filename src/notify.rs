//! Completion notifications over Telegram
//!
//! One `sendMessage` call per run, on success and failure alike. Delivery is
//! fire-and-forget: non-success responses and transport errors are logged and
//! never affect the run result.

use crate::config::NotificationConfig;
use crate::error::NotifyError;

/// Telegram notifier bound to one bot token and chat id
pub struct Notifier {
    http: reqwest::Client,
    config: NotificationConfig,
}

impl Notifier {
    /// Create a notifier for the configured channel
    pub fn new(config: NotificationConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a notifier reusing an existing HTTP connection pool
    pub fn with_client(http: reqwest::Client, config: NotificationConfig) -> Self {
        Self { http, config }
    }

    /// Send one status message, logging delivery failures instead of
    /// propagating them
    pub async fn notify(&self, text: &str) {
        match self.send(text).await {
            Ok(()) => tracing::debug!("notification sent successfully"),
            Err(e) => tracing::warn!(error = %e, "failed to send notification"),
        }
    }

    /// Single delivery attempt against the sendMessage endpoint
    ///
    /// Status 200 means accepted; anything else is a delivery failure.
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("chat_id", self.config.chat_id.as_str()),
                ("text", text),
            ])
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(NotifyError::Rejected { status });
        }
        Ok(())
    }
}
