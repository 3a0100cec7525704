use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use tycostream_core::Record;
use tycostream_error::PipelineError;
use tycostream_pipeline::Subscriber;

/// A [`Subscriber`] that replays a fixed script of records instead of talking to a
/// real database, then optionally reports a terminal error. Lets the hub/registry
/// tests exercise the fold loop and lifecycle without a live upstream connection.
pub struct ScriptedSubscriber {
    script: Vec<Record>,
    terminal_error: Option<PipelineError>,
    started: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl ScriptedSubscriber {
    /// A subscriber that replays `script` in order, then idles without error.
    #[must_use]
    pub fn new(script: Vec<Record>) -> Self {
        Self {
            script,
            terminal_error: None,
            started: Arc::new(AtomicBool::new(false)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replay `script`, then report `error` as a fatal subscriber failure.
    #[must_use]
    pub fn with_terminal_error(mut self, error: PipelineError) -> Self {
        self.terminal_error = Some(error);
        self
    }

    /// Whether `start` has been called.
    #[must_use]
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Whether `stop` has been called.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subscriber for ScriptedSubscriber {
    async fn start(
        &mut self,
        on_record: UnboundedSender<Record>,
        on_error: UnboundedSender<PipelineError>,
    ) -> Result<(), PipelineError> {
        self.started.store(true, Ordering::SeqCst);
        let script = std::mem::take(&mut self.script);
        let terminal_error = self.terminal_error.take();
        let stopped = Arc::clone(&self.stopped);

        tokio::spawn(async move {
            for record in script {
                if stopped.load(Ordering::SeqCst) {
                    return;
                }
                if on_record.send(record).is_err() {
                    return;
                }
            }
            if let Some(error) = terminal_error {
                if !stopped.load(Ordering::SeqCst) {
                    let _ = on_error.send(error);
                }
            }
        });

        Ok(())
    }

    async fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Drain `rx` into a `Vec`, polling until it would block for at least `attempts`
/// iterations of [`tokio::task::yield_now`] — useful when a test needs to observe
/// everything a [`ScriptedSubscriber`] emitted without a fixed sleep.
pub async fn drain_available<T>(rx: &mut UnboundedReceiver<T>, attempts: usize) -> Vec<T> {
    let mut items = Vec::new();
    for _ in 0..attempts {
        match rx.try_recv() {
            Ok(item) => items.push(item),
            Err(_) => tokio::task::yield_now().await,
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycostream_core::{Op, Row};

    fn record(timestamp: u64, op: Op) -> Record {
        Record {
            timestamp,
            op,
            row: Row::new(),
        }
    }

    #[tokio::test]
    async fn replays_script_in_order() {
        let mut subscriber = ScriptedSubscriber::new(vec![record(1, Op::Upsert), record(2, Op::Delete)]);
        let (record_tx, mut record_rx) = tokio::sync::mpsc::unbounded_channel();
        let (error_tx, _error_rx) = tokio::sync::mpsc::unbounded_channel();

        subscriber.start(record_tx, error_tx).await.unwrap();
        assert!(subscriber.started());

        let received = drain_available(&mut record_rx, 100).await;
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].timestamp, 1);
        assert_eq!(received[1].timestamp, 2);
    }

    #[tokio::test]
    async fn stop_is_observed() {
        let mut subscriber = ScriptedSubscriber::new(vec![]);
        subscriber.stop().await;
        assert!(subscriber.stopped());
    }
}
