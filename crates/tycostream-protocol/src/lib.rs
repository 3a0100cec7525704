//! Frames the tab-separated line protocol a streaming SQL source emits over
//! `COPY (SUBSCRIBE …) TO STDOUT` into [`tycostream_core::Record`]s, and builds the
//! `SUBSCRIBE` query string a source's [`tycostream_core::SourceDefinition`] implies.
//!
//! This crate has no knowledge of the database connection itself — that belongs to
//! `tycostream-pipeline`'s subscriber, which calls `build_subscribe_query` once at
//! startup and feeds every chunk of bytes it reads through a [`LineBuffer`].

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

mod buffer;
mod line;
mod query;

pub use buffer::LineBuffer;
pub use line::parse_line;
pub use query::build_subscribe_query;
