use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use tycostream_error::WebhookError;

use crate::envelope::WebhookEnvelope;

/// Retry policy for [`ReqwestWebhookSink`]: linear backoff, `retry_delay * attempt`
/// between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first), at least 1.
    pub max_attempts: u32,
    /// Base delay between attempts; the Nth retry waits `retry_delay * N`.
    pub retry_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Delivers a trigger's MATCH/UNMATCH envelope somewhere. The core trigger logic
/// only depends on this trait; [`ReqwestWebhookSink`] is the concrete HTTP sender
/// that makes the binary runnable end to end.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Deliver `envelope` to `url` with `headers` attached.
    ///
    /// # Errors
    /// Returns [`WebhookError`] if the request couldn't be sent or the response was
    /// not a 2xx. Per §4.6/§7, triggers treat this as fire-and-forget with respect
    /// to the pipeline — the caller logs and moves on rather than propagating.
    async fn deliver(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        envelope: &WebhookEnvelope,
    ) -> Result<(), WebhookError>;
}

/// An HTTP `POST`-based [`WebhookSink`] using `reqwest` with `rustls`, retrying
/// failed attempts per `retry`.
#[derive(Debug, Clone)]
pub struct ReqwestWebhookSink {
    client: Client,
    retry: RetryConfig,
}

impl ReqwestWebhookSink {
    /// Build a sink with a fresh `reqwest::Client` and the default retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retry(RetryConfig::default())
    }

    /// Build a sink with an explicit retry policy.
    #[must_use]
    pub fn with_retry(retry: RetryConfig) -> Self {
        Self { client: Client::new(), retry }
    }

    async fn attempt(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        envelope: &WebhookEnvelope,
    ) -> Result<(), String> {
        let mut request = self.client.post(url);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.json(envelope).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            info!(url, status = status.as_u16(), "webhook delivered");
            Ok(())
        } else {
            Err(format!("HTTP {status}"))
        }
    }
}

impl Default for ReqwestWebhookSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookSink for ReqwestWebhookSink {
    async fn deliver(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        envelope: &WebhookEnvelope,
    ) -> Result<(), WebhookError> {
        debug!(url, event_type = envelope.event_type, "dispatching webhook");

        let mut last_reason = String::new();
        for attempt in 1..=self.retry.max_attempts {
            match self.attempt(url, headers, envelope).await {
                Ok(()) => return Ok(()),
                Err(reason) => {
                    warn!(url, attempt, %reason, "webhook delivery attempt failed");
                    last_reason = reason;
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.retry_delay * attempt).await;
            }
        }

        Err(WebhookError::DeliveryExhausted {
            url: url.to_string(),
            attempts: self.retry.max_attempts,
            last_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.retry_delay, Duration::from_millis(100));
    }

    #[test]
    fn retry_config_custom() {
        let retry = RetryConfig { max_attempts: 5, retry_delay: Duration::from_millis(50) };
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.retry_delay, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn exhausting_retries_reports_attempt_count() {
        let sink = ReqwestWebhookSink::with_retry(RetryConfig {
            max_attempts: 2,
            retry_delay: Duration::from_millis(1),
        });
        let envelope = WebhookEnvelope::matched("t", tycostream_core::Row::new());
        let err = sink
            .deliver("http://127.0.0.1:1", &HashMap::new(), &envelope)
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::DeliveryExhausted { attempts: 2, .. }));
    }
}
