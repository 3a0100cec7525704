//! tycostream server binary.
//!
//! Wires the YAML source catalog, the pipeline registry, and signal-driven shutdown
//! together. GraphQL transport and schema generation are a true external boundary
//! (left to a consumer of [`tycostream_registry::PipelineRegistry::subscribe`]); this
//! binary drives each configured source's hub so it starts, snapshots, and streams,
//! logging the events it would otherwise hand to a GraphQL resolver.

#![warn(clippy::all, clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod shutdown;

use std::sync::Arc;

use clap::Parser;
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use shutdown::ShutdownCoordinator;
use tycostream_config::{load_sources, LogFormat, TycostreamSettings};
use tycostream_decode::DefaultTypeDecoder;
use tycostream_pipeline::HubMessage;
use tycostream_registry::PipelineRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format.into());

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting tycostream-server");

    let sources = load_sources(&cli.sources)?;
    let settings = TycostreamSettings::new(cli.upstream_dsn, sources)
        .with_listen_addr(cli.listen_addr)
        .with_log_format(cli.log_format.into());

    let registry = Arc::new(PipelineRegistry::with_connect_timeout(
        settings.upstream_dsn().to_string(),
        Arc::new(DefaultTypeDecoder),
        settings.connect_timeout(),
    ));

    let coordinator = ShutdownCoordinator::new();
    tokio::spawn(Arc::clone(&coordinator).run_signal_handler());

    let mut drain_handles = Vec::with_capacity(settings.sources().len());
    for source in settings.sources() {
        let stream = registry.subscribe(source, false)?;
        drain_handles.push(tokio::spawn(drain_source(
            source.name().to_string(),
            stream,
            coordinator.subscribe(),
        )));
    }

    tracing::info!(sources = settings.sources().len(), "serving");

    let mut shutdown_rx = coordinator.subscribe();
    shutdown_rx.recv().await.ok();

    for source in settings.sources() {
        registry.unsubscribe(source.name());
    }
    for handle in drain_handles {
        let _ = handle.await;
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Stand-in for the GraphQL resolver that would normally consume a source's event
/// stream: logs what crosses the hub until the source disposes or shutdown fires.
async fn drain_source(
    source_name: String,
    mut stream: tokio_stream::wrappers::UnboundedReceiverStream<HubMessage>,
    mut shutdown_rx: tokio::sync::broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            message = stream.next() => {
                match message {
                    Some(HubMessage::Event(event, timestamp)) => {
                        tracing::debug!(source = %source_name, ?event, timestamp, "row update");
                    }
                    Some(HubMessage::Disposed(error)) => {
                        if let Some(error) = error {
                            tracing::error!(source = %source_name, %error, "source hub disposed with error");
                        } else {
                            tracing::info!(source = %source_name, "source hub disposed");
                        }
                        return;
                    }
                    None => return,
                }
            }
            _ = shutdown_rx.recv() => return,
        }
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tycostream_server=info,tycostream_pipeline=info".into());

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }
}
