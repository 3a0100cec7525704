use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

/// Coordinates graceful shutdown across the server's components (§6 "Operator
/// signals"). First SIGINT/SIGTERM/SIGHUP refuses new subscriptions and signals
/// every component to wind down; a second SIGINT forces an immediate process exit.
pub struct ShutdownCoordinator {
    shutdown_initiated: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
}

impl ShutdownCoordinator {
    /// Build a coordinator that starts out ready to accept subscriptions.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (ready_tx, ready_rx) = watch::channel(true);

        Arc::new(Self {
            shutdown_initiated: AtomicBool::new(false),
            shutdown_tx,
            ready_tx,
            ready_rx,
        })
    }

    /// Subscribe to the shutdown signal.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Whether the server is still accepting new subscriptions.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.ready_rx.borrow()
    }

    /// Whether shutdown has already been initiated.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Initiate graceful shutdown. Idempotent: a second call is a no-op.
    pub fn initiate(&self) {
        if self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("initiating graceful shutdown");
        let _ = self.ready_tx.send(false);
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for SIGINT, SIGTERM, or SIGHUP, then call [`Self::initiate`]. A second
    /// SIGINT received after the first forces an immediate process exit rather than
    /// waiting for components to drain.
    pub async fn run_signal_handler(self: Arc<Self>) {
        wait_for_first_signal().await;
        self.initiate();

        tokio::signal::ctrl_c().await.ok();
        warn!("second interrupt received; forcing immediate exit");
        std::process::exit(130);
    }
}

async fn wait_for_first_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    #[cfg(unix)]
    let hangup = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            .expect("failed to install SIGHUP handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let hangup = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
        () = hangup => info!("received SIGHUP"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_ready_and_not_shutting_down() {
        let coordinator = ShutdownCoordinator::new();
        assert!(coordinator.is_ready());
        assert!(!coordinator.is_shutting_down());
    }

    #[test]
    fn initiate_marks_not_ready_and_shutting_down() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.initiate();
        assert!(!coordinator.is_ready());
        assert!(coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn subscribers_observe_the_shutdown_signal() {
        let coordinator = ShutdownCoordinator::new();
        let mut rx = coordinator.subscribe();
        coordinator.initiate();
        assert!(rx.recv().await.is_ok());
    }

    #[test]
    fn initiate_is_idempotent() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.initiate();
        coordinator.initiate();
        assert!(coordinator.is_shutting_down());
    }
}
