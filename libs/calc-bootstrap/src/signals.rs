use std::fmt;

use anyhow::Result;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Which termination signal stopped the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    CtrlC,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CtrlC => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Wait for Ctrl+C or SIGTERM and report which one arrived.
///
/// # Errors
/// Returns an error if a signal handler cannot be installed.
pub async fn wait_for_shutdown() -> Result<ShutdownSignal> {
    tokio::select! {
        result = signal::ctrl_c() => result.map(|()| ShutdownSignal::CtrlC).map_err(Into::into),
        result = wait_sigterm() => result.map(|()| ShutdownSignal::Terminate),
    }
}

/// Cancel `cancel` once a termination signal arrives.
///
/// The task also ends quietly when `cancel` is cancelled by someone else.
/// A failure to install handlers is logged and cancels too, so the server
/// never keeps running without a way to stop it.
#[must_use]
pub fn cancel_on_shutdown(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            result = wait_for_shutdown() => {
                match result {
                    Ok(sig) => tracing::info!(signal = %sig, "Shutdown requested, draining in-flight requests"),
                    Err(e) => tracing::error!(error = %e, "Signal handling failed, shutting down"),
                }
                cancel.cancel();
            }
        }
    })
}

#[cfg(unix)]
async fn wait_sigterm() -> Result<()> {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    term.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_sigterm() -> Result<()> {
    std::future::pending::<Result<()>>().await
}
