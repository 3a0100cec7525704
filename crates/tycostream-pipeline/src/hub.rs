use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, instrument};

use tycostream_core::{Cache, EventKind, Op, Record, RowUpdateEvent, SourceDefinition};
use tycostream_error::PipelineError;

use crate::state::{PipelineState, PipelineStateCell};
use crate::subscriber::Subscriber;

type SubscriberChannel = mpsc::UnboundedSender<HubMessage>;

/// One message delivered to a subscriber's buffer.
#[derive(Debug, Clone)]
pub enum HubMessage {
    /// A fold-classified event, paired with the record timestamp that produced it.
    Event(RowUpdateEvent, u64),
    /// The hub disposed — mid-stream error, or clean shutdown. Terminal.
    Disposed(Option<PipelineError>),
}

struct SharedState {
    cache: Cache,
    latest_timestamp: u64,
    subscribers: HashMap<u64, SubscriberChannel>,
    next_subscriber_id: u64,
}

/// Folds one source's CDC stream into an authoritative [`Cache`], classifies every
/// record as INSERT/UPDATE/DELETE, and fans the resulting events out to every
/// attached subscriber with late-joiner snapshot+tail semantics (§4.4).
///
/// Exactly one task drives `feed` for a given hub; subscribers read independently
/// from the stream returned by [`SourceHub::subscribe`].
pub struct SourceHub {
    source: SourceDefinition,
    shared: Mutex<SharedState>,
    subscriber_count: AtomicU64,
    state: PipelineStateCell,
}

impl SourceHub {
    /// Build an idle hub for `source`.
    #[must_use]
    pub fn new(source: SourceDefinition) -> Self {
        Self {
            shared: Mutex::new(SharedState {
                cache: Cache::new(source.primary_key_field()),
                latest_timestamp: 0,
                subscribers: HashMap::new(),
                next_subscriber_id: 0,
            }),
            source,
            subscriber_count: AtomicU64::new(0),
            state: PipelineStateCell::default(),
        }
    }

    /// The source this hub is fed from.
    #[must_use]
    pub fn source(&self) -> &SourceDefinition {
        &self.source
    }

    /// The hub's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state.get()
    }

    /// Number of subscribers currently attached.
    #[must_use]
    pub fn subscriber_count(&self) -> u64 {
        self.subscriber_count.load(Ordering::SeqCst)
    }

    /// Attach a new subscriber, returning a stream of [`HubMessage`]s.
    ///
    /// Implements §4.4.2's snapshot+tail gadget: buffer registration, snapshot
    /// timestamp capture, and the snapshot INSERTs themselves all happen inside one
    /// acquisition of `shared`'s lock, so `feed`'s broadcast (which takes the same
    /// lock) can never interleave a tail event between registration and snapshot —
    /// the snapshot is guaranteed to precede any buffered tail event in the buffer.
    /// `skip_snapshot` is set by triggers, which only care about events from now on.
    ///
    /// # Errors
    /// Returns [`PipelineError::ShuttingDown`] if the hub is `Stopping` or `Disposed`.
    pub fn subscribe(
        &self,
        skip_snapshot: bool,
    ) -> Result<UnboundedReceiverStream<HubMessage>, PipelineError> {
        if matches!(self.state.get(), PipelineState::Stopping | PipelineState::Disposed) {
            return Err(PipelineError::ShuttingDown {
                source: self.source.name().to_string(),
            });
        }

        if self.state.get() == PipelineState::Idle {
            self.state.transition(PipelineState::Connecting);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut shared = self.shared.lock().expect("hub lock poisoned");
            let id = shared.next_subscriber_id;
            shared.next_subscriber_id += 1;
            shared.subscribers.insert(id, tx.clone());

            let snapshot_timestamp = shared.latest_timestamp;
            if !skip_snapshot {
                for row in shared.cache.iter().cloned().collect::<Vec<_>>() {
                    let event = RowUpdateEvent::insert(row);
                    let _ = tx.send(HubMessage::Event(event, snapshot_timestamp));
                }
            }
        }

        self.subscriber_count.fetch_add(1, Ordering::SeqCst);
        if self.state.get() == PipelineState::Connecting {
            self.state.transition(PipelineState::Streaming);
        }

        Ok(UnboundedReceiverStream::new(rx))
    }

    /// Detach one subscriber. Safe to call concurrently with broadcast; a channel
    /// with no remaining receiver is simply dropped on its next send.
    pub fn unsubscribe(&self) {
        let remaining = self.subscriber_count.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.dispose(None);
        }
    }

    /// Apply one upstream record: classify, mutate the cache, advance the
    /// high-water mark, and broadcast. §4.4.1.
    ///
    /// # Errors
    /// Returns [`PipelineError::TimestampRegression`] if `record.timestamp` is
    /// strictly less than the last-seen timestamp (I1); the hub disposes itself and
    /// the caller should treat this as fatal.
    #[instrument(skip(self, record), fields(source = self.source.name()))]
    pub fn feed(&self, record: Record) -> Result<(), PipelineError> {
        let mut shared = self.shared.lock().expect("hub lock poisoned");

        if record.timestamp < shared.latest_timestamp {
            let err = PipelineError::TimestampRegression {
                source: self.source.name().to_string(),
                last_seen: shared.latest_timestamp,
                observed: record.timestamp,
            };
            drop(shared);
            self.dispose(Some(err.clone()));
            return Err(err);
        }

        let pk = tycostream_core::row::primary_key_string(&record.row, self.source.primary_key_field());
        let prior = pk.as_deref().and_then(|k| shared.cache.get(k)).cloned();
        let full_row = tycostream_core::row::merge(prior.as_ref(), &record.row);

        let event = match (record.op, &prior) {
            (Op::Delete, _) => RowUpdateEvent::delete(self.source.primary_key_field(), full_row.clone()),
            (Op::Upsert, None) => RowUpdateEvent::insert(full_row.clone()),
            (Op::Upsert, Some(prior_row)) => {
                let mut fields: std::collections::BTreeSet<String> =
                    tycostream_core::row::changed_fields(prior_row, &full_row).into_iter().collect();
                fields.insert(self.source.primary_key_field().to_string());
                RowUpdateEvent {
                    kind: EventKind::Update,
                    fields,
                    row: full_row.clone(),
                }
            }
        };

        match record.op {
            Op::Delete => {
                shared.cache.delete(&record.row);
            }
            Op::Upsert => {
                shared.cache.set(record.row.clone());
            }
        }

        shared.latest_timestamp = record.timestamp;
        let timestamp = record.timestamp;

        shared.subscribers.retain(|_, tx| tx.send(HubMessage::Event(event.clone(), timestamp)).is_ok());

        debug!(kind = ?event.kind, "folded record");
        Ok(())
    }

    /// Tear the hub down: notify subscribers, clear the cache, transition to
    /// `Disposed`. `error` is `Some` for a fail-fast disposal, `None` for a clean
    /// idle-teardown.
    pub fn dispose(&self, error: Option<PipelineError>) {
        let was_streaming = self.state.get() == PipelineState::Streaming;
        if was_streaming {
            self.state.transition(PipelineState::Stopping);
        } else if self.state.get() == PipelineState::Connecting {
            self.state.transition(PipelineState::Stopping);
        }

        let mut shared = self.shared.lock().expect("hub lock poisoned");
        for (_, tx) in shared.subscribers.drain() {
            let _ = tx.send(HubMessage::Disposed(error.clone()));
        }
        shared.cache.clear();
        drop(shared);

        if self.state.get() == PipelineState::Stopping {
            self.state.transition(PipelineState::Disposed);
        }

        match &error {
            Some(e) => error!(source = self.source.name(), error = %e, "hub disposed after fatal error"),
            None => info!(source = self.source.name(), "hub disposed"),
        }
    }
}

/// Drives a [`Subscriber`]'s records and errors into a [`SourceHub`]'s `feed`/
/// `dispose` calls. Owns the `tokio::sync::mpsc` channels the subscriber writes to.
pub async fn run_subscriber(
    hub: Arc<SourceHub>,
    mut subscriber: Box<dyn Subscriber>,
) -> Result<(), PipelineError> {
    let (record_tx, mut record_rx) = mpsc::unbounded_channel();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel();

    subscriber.start(record_tx, error_tx).await?;

    loop {
        tokio::select! {
            record = record_rx.recv() => {
                match record {
                    Some(record) => {
                        if let Err(e) = hub.feed(record) {
                            return Err(e);
                        }
                    }
                    None => return Ok(()),
                }
            }
            error = error_rx.recv() => {
                if let Some(e) = error {
                    hub.dispose(Some(e.clone()));
                    return Err(e);
                }
            }
        }
    }
}
