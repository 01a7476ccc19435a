use crate::session_store::SessionStore;
use crate::traits::MessageHandler;
use std::time::Duration;
use tokio::signal;

/// Prints the status line whenever the session changes and ends the session
/// once it expires. Runs until `shutdown` resolves.
pub async fn run_watch_loop(
    store: &SessionStore,
    messages: &dyn MessageHandler,
    check_interval: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut changes = store.subscribe();
    let mut ticker = tokio::time::interval(check_interval);
    tokio::pin!(shutdown);

    messages.print(&store.status_line());

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping watch");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    tracing::warn!("Session store dropped, stopping watch");
                    break;
                }
                let _ = changes.borrow_and_update();
                messages.print(&store.status_line());
            }
            _ = ticker.tick() => {
                if let Err(e) = store.check_expiry() {
                    tracing::error!("Expiry check failed: {}", e);
                }
            }
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
