//! # Cross-platform OS signal handling.
//!
//! [`stop_on_signal`] turns a termination signal into a graceful drain: it
//! installs an always-true stop predicate, so the worker sends STOP after the
//! next heartbeat and exits once the proxy confirms.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT`
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use tokio::task::JoinHandle;

use super::stop::StopHandle;

/// Spawns a task that requests a graceful stop on the first termination signal.
///
/// If signal registration fails the task logs it (with `logging`) and exits
/// without touching the handle.
pub fn stop_on_signal(handle: StopHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(()) => {
                #[cfg(feature = "logging")]
                tracing::info!(target: "rpc_worker", "termination signal received, draining");
                handle.request();
            }
            Err(_e) => {
                #[cfg(feature = "logging")]
                tracing::warn!(target: "rpc_worker", error = %_e, "signal registration failed");
            }
        }
    })
}

/// Waits for a termination signal.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
