//! Errors from the outbound webhook dispatcher.

/// Errors raised while POSTing a trigger envelope.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WebhookError {
    /// Every retry attempt failed; `last_reason` is the final attempt's failure
    /// (a transport error or a non-2xx status).
    #[error("webhook '{url}' failed after {attempts} attempts: {last_reason}")]
    DeliveryExhausted { url: String, attempts: u32, last_reason: String },
}

impl WebhookError {
    /// Stable, operator-facing error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DeliveryExhausted { .. } => "webhook.delivery_exhausted",
        }
    }
}
