use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::sync::{Mutex, Notify};
use tokio::time::Duration;
use tracing::{info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ShutdownCoordinator {
    notify: Notify,
    shutting_down: AtomicBool,
    inner: Mutex<Option<ShutdownInner>>,
}

struct ShutdownInner {
    db: sqlite_models::connection::Database,
}

impl ShutdownCoordinator {
    pub fn new(db: sqlite_models::connection::Database) -> Self {
        Self {
            notify: Notify::new(),
            shutting_down: AtomicBool::new(false),
            inner: Mutex::new(Some(ShutdownInner { db })),
        }
    }

    pub async fn wait_for_shutdown(&self) {
        self.notify.notified().await;
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }

    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        info!("Initiating graceful shutdown sequence");

        // Take ownership of the inner data
        let inner = match self.inner.lock().await.take() {
            Some(inner) => inner,
            None => {
                warn!("Shutdown already called");
                return;
            }
        };

        // Stop accepting new connections first
        self.notify.notify_waiters();

        match sqlite_models::connection::shutdown_with_timeout(
            inner.db,
            SHUTDOWN_TIMEOUT,
        )
        .await
        {
            Ok(()) => info!("Database shutdown completed"),
            Err(e) => warn!("Database shutdown error: {}", e),
        }

        info!("Graceful shutdown sequence complete");
    }
}

pub async fn listen_for_shutdown_signals() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }

    info!("signal received, starting graceful shutdown");
}
