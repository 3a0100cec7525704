//! Folds one source's CDC stream into an authoritative cache, classifies every
//! record, and fans the resulting events out to every attached subscriber with
//! late-joiner snapshot+tail semantics (§4.4). Owns the pipeline lifecycle
//! (`Idle → Connecting → Streaming → Stopping → Disposed`, §4.4.3) and the upstream
//! `Subscriber` that feeds it.

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

mod hub;
mod state;
mod subscriber;

pub use hub::{run_subscriber, HubMessage, SourceHub};
pub use state::{PipelineState, PipelineStateCell};
pub use subscriber::postgres::PostgresSubscriber;
pub use subscriber::Subscriber;
