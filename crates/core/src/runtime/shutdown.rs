use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Owns the root cancellation token. Channel workers, pending corrections
/// and the console all watch it.
#[derive(Debug)]
pub struct ShutdownGuard {
    token: CancellationToken,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel on SIGTERM or Ctrl-C, whichever comes first.
    pub fn spawn_signal_listener(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to register SIGTERM handler");
                        return;
                    }
                };
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                    _ = signal::ctrl_c() => tracing::info!("received Ctrl-C, shutting down"),
                }
            }
            #[cfg(not(unix))]
            {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = signal::ctrl_c() => tracing::info!("received Ctrl-C, shutting down"),
                }
            }
            token.cancel();
        });
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}
