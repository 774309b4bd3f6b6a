//! OS signal handling.
//!
//! SIGINT and SIGTERM both become a shutdown request; the watcher picks it up
//! at its next wait point.

use crate::lifecycle::shutdown::Shutdown;

/// Resolve when the process receives SIGINT or SIGTERM (Ctrl-C elsewhere).
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = interrupt.recv() => Ok("SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Wait for a signal, then trigger `shutdown`.
pub async fn shutdown_on_signal(shutdown: &Shutdown) -> std::io::Result<()> {
    let name = wait_for_signal().await?;
    tracing::info!(signal = name, "Captured signal, shutting down");
    shutdown.trigger();
    Ok(())
}
