//! Shared fixtures for the other crates' test suites: a scripted [`Subscriber`] that
//! replays a fixed sequence of records instead of talking to a real database, and
//! small builders for [`SourceDefinition`]s used throughout the pack's tests.

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

mod scripted_subscriber;
mod source;

pub use scripted_subscriber::{drain_available, ScriptedSubscriber};
pub use source::{orders_source, source_with_columns};
