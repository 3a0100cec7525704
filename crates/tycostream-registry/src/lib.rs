//! Interns one [`SourceHub`] per source name and reference-counts its subscribers,
//! disposing a hub once its last subscriber detaches (§4.4.3).
//!
//! Mirrors a multi-listener coordinator's register/deregister discipline, but keyed
//! on source name rather than listener replica id: the first subscriber to a source
//! spins up its hub and subscriber task; the last one tears it down.

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

use tycostream_core::SourceDefinition;
use tycostream_decode::TypeDecoder;
use tycostream_error::PipelineError;
use tycostream_pipeline::{run_subscriber, HubMessage, PostgresSubscriber, SourceHub};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns every live [`SourceHub`] in the process, one per source name.
pub struct PipelineRegistry {
    connection_string: String,
    decoder: Arc<dyn TypeDecoder>,
    connect_timeout: Duration,
    hubs: DashMap<String, Arc<SourceHub>>,
}

impl PipelineRegistry {
    /// Build a registry that connects to `connection_string` for every source it
    /// lazily spins up, decoding columns with `decoder`, using the default 10s
    /// connect timeout (§5).
    #[must_use]
    pub fn new(connection_string: impl Into<String>, decoder: Arc<dyn TypeDecoder>) -> Self {
        Self::with_connect_timeout(connection_string, decoder, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Build a registry with an explicit bounded connect timeout (§5), applied to
    /// every subscriber it spins up.
    #[must_use]
    pub fn with_connect_timeout(
        connection_string: impl Into<String>,
        decoder: Arc<dyn TypeDecoder>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            connection_string: connection_string.into(),
            decoder,
            connect_timeout,
            hubs: DashMap::new(),
        }
    }

    /// Number of sources with a currently live hub.
    #[must_use]
    pub fn hub_count(&self) -> usize {
        self.hubs.len()
    }

    /// Attach a new subscriber to `source`, lazily starting its hub and upstream
    /// subscriber on the first call for that source name.
    ///
    /// # Errors
    /// Returns [`PipelineError::ShuttingDown`] if a hub for this source exists but is
    /// already tearing down (a race with the last subscriber's detach); retry.
    pub fn subscribe(
        &self,
        source: &SourceDefinition,
        skip_snapshot: bool,
    ) -> Result<UnboundedReceiverStream<HubMessage>, PipelineError> {
        let hub = self
            .hubs
            .entry(source.name().to_string())
            .or_insert_with(|| {
                let hub = Arc::new(SourceHub::new(source.clone()));
                info!(source = source.name(), "starting source hub");
                let subscriber = Box::new(PostgresSubscriber::with_connect_timeout(
                    self.connection_string.clone(),
                    source.clone(),
                    Arc::clone(&self.decoder),
                    self.connect_timeout,
                ));
                tokio::spawn(run_subscriber(Arc::clone(&hub), subscriber));
                hub
            })
            .clone();

        hub.subscribe(skip_snapshot)
    }

    /// Detach one subscriber from `source_name`. If it was the hub's last
    /// subscriber, the hub disposes and is removed from the registry.
    pub fn unsubscribe(&self, source_name: &str) {
        let Some(hub) = self.hubs.get(source_name).map(|entry| Arc::clone(&entry)) else {
            return;
        };
        hub.unsubscribe();
        if hub.subscriber_count() == 0 {
            self.hubs.remove(source_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycostream_decode::DefaultTypeDecoder;

    #[test]
    fn hub_count_starts_at_zero() {
        let registry = PipelineRegistry::new("postgres://localhost", Arc::new(DefaultTypeDecoder));
        assert_eq!(registry.hub_count(), 0);
    }

    #[test]
    fn unsubscribe_on_unknown_source_is_a_no_op() {
        let registry = PipelineRegistry::new("postgres://localhost", Arc::new(DefaultTypeDecoder));
        registry.unsubscribe("nonexistent");
        assert_eq!(registry.hub_count(), 0);
    }
}
