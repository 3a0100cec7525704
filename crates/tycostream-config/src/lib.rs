//! YAML source-catalog loading and server settings (§6 "Configuration surface",
//! §10.3). The core treats a [`tycostream_core::SourceDefinition`] as opaque; this
//! crate is the concrete loader that parses and validates one from a YAML file.

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

mod catalog;
mod settings;

pub use catalog::load_sources;
pub use settings::{LogFormat, TycostreamSettings};
