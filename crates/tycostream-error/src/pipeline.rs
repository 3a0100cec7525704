//! Errors from the subscriber, source hub, and registry.

/// Errors surfaced by a running (or starting) source pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// The subscriber failed to connect or issue the `SUBSCRIBE` query.
    #[error("failed to start subscriber for source '{source}': {reason}")]
    SubscriberStartup { source: String, reason: String },

    /// The subscriber's connection failed, or ended unexpectedly, while streaming.
    #[error("subscriber for source '{source}' failed while streaming: {reason}")]
    SubscriberRuntime { source: String, reason: String },

    /// A record's timestamp moved strictly backward relative to the hub's
    /// last-observed timestamp. Fatal by invariant I1.
    #[error(
        "timestamp regression on source '{source}': observed {observed}, expected >= {last_seen}"
    )]
    TimestampRegression {
        source: String,
        last_seen: u64,
        observed: u64,
    },

    /// A subscription was attempted against a hub that is stopping or disposed.
    #[error("source '{source}' is shutting down")]
    ShuttingDown { source: String },

    /// A bounded per-subscriber buffer overflowed.
    #[error("subscriber for source '{source}' was disconnected: slow consumer")]
    SlowConsumer { source: String },
}

impl PipelineError {
    /// Stable, operator-facing error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SubscriberStartup { .. } => "pipeline.subscriber_startup",
            Self::SubscriberRuntime { .. } => "pipeline.subscriber_runtime",
            Self::TimestampRegression { .. } => "pipeline.timestamp_regression",
            Self::ShuttingDown { .. } => "pipeline.shutting_down",
            Self::SlowConsumer { .. } => "pipeline.slow_consumer",
        }
    }

    /// Whether this error should trigger the fail-fast process-shutdown path.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SubscriberStartup { .. }
                | Self::SubscriberRuntime { .. }
                | Self::TimestampRegression { .. }
        )
    }
}
