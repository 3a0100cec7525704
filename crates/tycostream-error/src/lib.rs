//! Unified error types for tycostream runtime crates.
//!
//! Each domain crate's fallible operations return one of the error types defined
//! here rather than rolling its own; this keeps `error_code()` and logging
//! consistent across the pipeline.

// Error variants are self-documenting via their #[error(...)] messages.
#![allow(missing_docs)]

mod config;
mod decode;
mod pipeline;
mod webhook;

pub use config::ConfigError;
pub use decode::DecodeError;
pub use pipeline::PipelineError;
pub use webhook::WebhookError;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TycostreamError>;

/// Top-level error aggregating every domain error.
#[derive(Debug, thiserror::Error)]
pub enum TycostreamError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TycostreamError {
    /// Stable, operator-facing error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Decode(e) => e.error_code(),
            Self::Pipeline(e) => e.error_code(),
            Self::Webhook(e) => e.error_code(),
            Self::Internal { .. } => "internal_error",
        }
    }
}
