//! Process lifecycle: long-lived units sharing one cancellation token.
//!
//! Cancellation is cooperative. Once the token fires every unit is expected
//! to return; [`Lifecycle::wait`] joins all of them before the process
//! exits. Any unit that stops on its own while the token is still active
//! (clean return, error, or panic) cancels the token, so one dead unit
//! shuts down the whole process instead of leaving it half alive.

use std::{collections::HashMap, future::Future};

use {
    tokio::{
        signal,
        task::{self, JoinSet},
    },
    tokio_util::sync::CancellationToken,
    tracing::{Instrument, error, info, info_span, warn},
};

/// How a unit ended.
pub trait UnitOutcome {
    fn into_result(self) -> Result<(), String>;
}

impl UnitOutcome for () {
    fn into_result(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: std::fmt::Display> UnitOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}

/// How a unit ended, as reported by [`Lifecycle::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitExit {
    /// Returned after cancellation.
    Stopped,
    /// Returned cleanly while the process was still running.
    Unexpected,
    Failed(String),
    /// Panicked or was aborted.
    Aborted,
}

pub struct Lifecycle {
    cancel: CancellationToken,
    units: JoinSet<UnitExit>,
    names: HashMap<task::Id, &'static str>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            units: JoinSet::new(),
            names: HashMap::new(),
        }
    }

    /// The shared cancellation signal.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `unit` as a named concurrent unit.
    pub fn spawn<F>(&mut self, name: &'static str, unit: F)
    where
        F: Future + Send + 'static,
        F::Output: UnitOutcome,
    {
        let cancel = self.cancel.clone();
        let span = info_span!("unit", name);
        let handle = self.units.spawn(
            async move {
                // Fires on every exit path, including unwinding.
                let _guard = cancel.clone().drop_guard();
                info!("starting");
                match unit.await.into_result() {
                    Ok(()) if cancel.is_cancelled() => {
                        info!("stopped");
                        UnitExit::Stopped
                    },
                    Ok(()) => {
                        warn!("exited unexpectedly, shutting down");
                        UnitExit::Unexpected
                    },
                    Err(e) => {
                        error!(error = %e, "failed, shutting down");
                        UnitExit::Failed(e)
                    },
                }
            }
            .instrument(span),
        );
        self.names.insert(handle.id(), name);
    }

    /// Cancel on SIGINT or SIGTERM.
    pub fn watch_signals(&mut self) {
        self.watch_signal(shutdown_signal());
    }

    /// Cancel once `signal` resolves with the signal's name.
    pub fn watch_signal<S>(&mut self, signal: S)
    where
        S: Future<Output = &'static str> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        self.spawn("signals", async move {
            tokio::select! {
                name = signal => {
                    warn!(signal = name, "received signal");
                    cancel.cancel();
                },
                _ = cancel.cancelled() => {},
            }
        });
    }

    /// Block until cancellation, then until every unit has returned.
    /// Reports each unit's exit, in completion order.
    pub async fn wait(mut self) -> Vec<(&'static str, UnitExit)> {
        self.cancel.cancelled().await;
        info!(units = self.units.len(), "waiting for all units to terminate");
        let mut exits = Vec::with_capacity(self.units.len());
        while let Some(joined) = self.units.join_next_with_id().await {
            let (id, exit) = match joined {
                Ok((id, exit)) => (id, exit),
                Err(e) => {
                    error!(error = %e, "unit aborted");
                    (e.id(), UnitExit::Aborted)
                },
            };
            let name = self.names.remove(&id).unwrap_or("unknown");
            exits.push((name, exit));
        }
        info!("all units shut down");
        exits
    }
}

/// Resolves with the name of the first shutdown signal received. A handler
/// that cannot be installed never resolves.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
