use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

/// Signal types that can stop a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - Docker/Kubernetes graceful shutdown
    Terminate,
    /// SIGINT - Ctrl+C interactive shutdown
    Interrupt,
    /// SIGQUIT - Quit signal
    Quit,
    /// Internal - the token was cancelled by the application itself
    Internal,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Quit => write!(f, "SIGQUIT"),
            ShutdownSignal::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Turns process signals into cancellation of the submission run.
pub struct SignalHandler {
    cancellation: CancellationToken,
}

impl SignalHandler {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    /// Listens in the background until a signal arrives or the token is cancelled elsewhere.
    pub fn spawn(self) -> JoinHandle<ShutdownSignal> {
        tokio::spawn(async move { self.listen().await })
    }

    pub async fn listen(&self) -> ShutdownSignal {
        let signal = match self.wait_for_signal().await {
            Ok(signal) => signal,
            Err(err) => {
                error!(error = %err, "Failed to install signal handlers, the run can only be stopped by killing the process");
                self.cancellation.cancelled().await;
                ShutdownSignal::Internal
            }
        };

        if signal != ShutdownSignal::Internal {
            warn!("Received shutdown signal: {}, cancelling the submission run", signal);
            self.cancellation.cancel();
        }
        signal
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> std::io::Result<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigquit = signal(SignalKind::quit())?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT and SIGQUIT");

        let signal = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = sigquit.recv() => ShutdownSignal::Quit,
            _ = self.cancellation.cancelled() => ShutdownSignal::Internal,
        };
        Ok(signal)
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> std::io::Result<ShutdownSignal> {
        info!("Signal handler initialized, listening for Ctrl+C");

        tokio::select! {
            result = signal::ctrl_c() => result.map(|()| ShutdownSignal::Interrupt),
            _ = self.cancellation.cancelled() => Ok(ShutdownSignal::Internal),
        }
    }
}
