use async_trait::async_trait;
use tycostream_core::Record;
use tycostream_error::PipelineError;

/// Owns one upstream connection for one source and surfaces decoded records.
///
/// §4.2: `start` is idempotent — a second call while already running is a no-op
/// with a warning rather than an error. `stop` marks the subscriber shutting down;
/// a clean end-of-stream that arrives after `stop` must not be reported as an error.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Open the connection, issue the subscribe query, and spawn a reader that
    /// pushes records to `on_record` until `stop` is called or the stream fails.
    ///
    /// # Errors
    /// Returns [`PipelineError::SubscriberStartup`] if the connection or query fails.
    async fn start(
        &mut self,
        on_record: tokio::sync::mpsc::UnboundedSender<Record>,
        on_error: tokio::sync::mpsc::UnboundedSender<PipelineError>,
    ) -> Result<(), PipelineError>;

    /// Mark the subscriber shutting down and close the connection. Idempotent.
    async fn stop(&mut self);
}

/// A [`Subscriber`] backed by a live `tokio-postgres` connection, speaking the
/// `COPY (SUBSCRIBE …) TO STDOUT` streaming protocol.
pub mod postgres {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::StreamExt;
    use tokio_postgres::{Client, NoTls};
    use tracing::{debug, info, warn};

    use tycostream_core::SourceDefinition;
    use tycostream_decode::TypeDecoder;
    use tycostream_error::PipelineError;
    use tycostream_protocol::{build_subscribe_query, parse_line, LineBuffer};

    use super::Subscriber;

    const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connects to a Postgres-wire-compatible streaming database (Materialize) and
    /// runs `COPY (SUBSCRIBE …) TO STDOUT` for one source.
    pub struct PostgresSubscriber {
        connection_string: String,
        source: SourceDefinition,
        decoder: Arc<dyn TypeDecoder>,
        connect_timeout: Duration,
        running: Arc<AtomicBool>,
        shutting_down: Arc<AtomicBool>,
    }

    impl PostgresSubscriber {
        /// Build a subscriber for `source`, connecting via `connection_string` with
        /// the default 10s connect timeout (§5).
        #[must_use]
        pub fn new(
            connection_string: impl Into<String>,
            source: SourceDefinition,
            decoder: Arc<dyn TypeDecoder>,
        ) -> Self {
            Self::with_connect_timeout(connection_string, source, decoder, DEFAULT_CONNECT_TIMEOUT)
        }

        /// Build a subscriber with an explicit bounded connect timeout (§5).
        #[must_use]
        pub fn with_connect_timeout(
            connection_string: impl Into<String>,
            source: SourceDefinition,
            decoder: Arc<dyn TypeDecoder>,
            connect_timeout: Duration,
        ) -> Self {
            Self {
                connection_string: connection_string.into(),
                source,
                decoder,
                connect_timeout,
                running: Arc::new(AtomicBool::new(false)),
                shutting_down: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl Subscriber for PostgresSubscriber {
        async fn start(
            &mut self,
            on_record: tokio::sync::mpsc::UnboundedSender<tycostream_core::Record>,
            on_error: tokio::sync::mpsc::UnboundedSender<PipelineError>,
        ) -> Result<(), PipelineError> {
            if self.running.swap(true, Ordering::SeqCst) {
                warn!(source = self.source.name(), "subscriber already running; ignoring start");
                return Ok(());
            }

            let (client, connection) = tokio::time::timeout(
                self.connect_timeout,
                tokio_postgres::connect(&self.connection_string, NoTls),
            )
            .await
            .map_err(|_| PipelineError::SubscriberStartup {
                source: self.source.name().to_string(),
                reason: format!("connect timed out after {:?}", self.connect_timeout),
            })?
            .map_err(|e| PipelineError::SubscriberStartup {
                source: self.source.name().to_string(),
                reason: e.to_string(),
            })?;

            let query = build_subscribe_query(&self.source);
            let source = self.source.clone();
            let decoder = Arc::clone(&self.decoder);
            let shutting_down = Arc::clone(&self.shutting_down);
            let running = Arc::clone(&self.running);

            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    if !shutting_down.load(Ordering::SeqCst) {
                        warn!(source = source.name(), error = %e, "connection task ended");
                    }
                }
            });

            tokio::spawn(run_copy_stream(
                client,
                query,
                source,
                decoder,
                shutting_down,
                running,
                on_record,
                on_error,
            ));

            Ok(())
        }

        async fn stop(&mut self) {
            self.shutting_down.store(true, Ordering::SeqCst);
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_copy_stream(
        client: Client,
        query: String,
        source: SourceDefinition,
        decoder: Arc<dyn TypeDecoder>,
        shutting_down: Arc<AtomicBool>,
        running: Arc<AtomicBool>,
        on_record: tokio::sync::mpsc::UnboundedSender<tycostream_core::Record>,
        on_error: tokio::sync::mpsc::UnboundedSender<PipelineError>,
    ) {
        let copy_query = format!("COPY ({query}) TO STDOUT");
        let stream = match client.copy_out(copy_query.as_str()).await {
            Ok(stream) => stream,
            Err(e) => {
                running.store(false, Ordering::SeqCst);
                let _ = on_error.send(PipelineError::SubscriberStartup {
                    source: source.name().to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        tokio::pin!(stream);
        let mut buffer = LineBuffer::new();

        while let Some(chunk) = stream.next().await {
            if shutting_down.load(Ordering::SeqCst) {
                break;
            }
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    running.store(false, Ordering::SeqCst);
                    if !shutting_down.load(Ordering::SeqCst) {
                        let _ = on_error.send(PipelineError::SubscriberRuntime {
                            source: source.name().to_string(),
                            reason: e.to_string(),
                        });
                    }
                    return;
                }
            };

            let text = String::from_utf8_lossy(&bytes);
            for line in buffer.push(&text) {
                match parse_line(&line, &source, decoder.as_ref()) {
                    Some(record) => {
                        if on_record.send(record).is_err() {
                            return;
                        }
                    }
                    None => debug!(source = source.name(), "skipped unparseable line"),
                }
            }
        }

        running.store(false, Ordering::SeqCst);
        if !shutting_down.load(Ordering::SeqCst) {
            let _ = on_error.send(PipelineError::SubscriberRuntime {
                source: source.name().to_string(),
                reason: "upstream closed the stream unexpectedly".to_string(),
            });
        } else {
            info!(source = source.name(), "subscriber stopped cleanly");
        }
    }
}
