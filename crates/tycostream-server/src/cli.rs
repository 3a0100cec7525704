use std::path::PathBuf;

use clap::Parser;

/// tycostream: CDC-to-GraphQL-subscription streaming engine.
#[derive(Debug, Parser)]
#[command(name = "tycostream-server", version, about)]
pub struct Cli {
    /// Path to the YAML source catalog.
    #[arg(long, env = "TYCOSTREAM_SOURCES")]
    pub sources: PathBuf,

    /// Connection string for the upstream streaming database.
    #[arg(long, env = "TYCOSTREAM_UPSTREAM_DSN")]
    pub upstream_dsn: String,

    /// Address the GraphQL/webhook integration layer should bind.
    #[arg(long, env = "TYCOSTREAM_LISTEN_ADDR", default_value = "0.0.0.0:4000")]
    pub listen_addr: String,

    /// Log output format.
    #[arg(long, env = "TYCOSTREAM_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,
}

/// CLI-facing mirror of [`tycostream_config::LogFormat`] (clap's `value_enum` needs
/// its own type rather than deriving on the config crate's).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable, for local development.
    Pretty,
    /// Newline-delimited JSON, for production log aggregation.
    Json,
}

impl From<LogFormatArg> for tycostream_config::LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}
