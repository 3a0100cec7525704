//! # tycostream-core
//!
//! Types and single-subscriber logic shared by every `tycostream` source pipeline:
//! the row/record/event vocabulary (§3), the primary-key-indexed authoritative cache
//! (§4.3), the predicate compiler, and the per-subscriber hysteresis view (§4.5).
//!
//! This crate has no knowledge of the database wire protocol, the transport a
//! subscriber uses, or how events eventually reach a caller — see
//! `tycostream-protocol` and `tycostream-pipeline` for those.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

mod cache;
mod event;
mod filter;
mod predicate;
mod record;
pub mod row;
mod source;
mod view;

pub use cache::Cache;
pub use event::{EventKind, RowUpdateEvent};
pub use filter::Filter;
pub use predicate::{Predicate, PredicateError};
pub use record::{Op, Record};
pub use row::Row;
pub use source::{ColumnDefinition, SourceDefinition, SourceDefinitionError};
pub use view::View;
