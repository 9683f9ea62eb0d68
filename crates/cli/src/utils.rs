use tokio::signal::ctrl_c;

/// Returns a future that resolves on the first shutdown signal: `SIGINT`, or `SIGTERM` on unix.
pub async fn wait_shutdown_signals() {
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c() => {},
        _ = sigterm() => {},
    }

    #[cfg(not(unix))]
    let _ = ctrl_c().await;
}

#[cfg(unix)]
async fn sigterm() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    signal(SignalKind::terminate())?.recv().await;
    Ok(())
}
