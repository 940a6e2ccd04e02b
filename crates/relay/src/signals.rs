//! Process signals that stop the bot: SIGTERM from the hosting platform and
//! Ctrl-C from a terminal.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `shutdown` on the first SIGTERM or Ctrl-C.
///
/// Handlers are registered before this returns, so a signal delivered right
/// after the call is not lost.
pub fn listen(shutdown: CancellationToken) -> std::io::Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
                _ = sigint.recv() => tracing::info!("SIGINT received, shutting down"),
                _ = shutdown.cancelled() => return,
            }
            shutdown.cancel();
        }))
    }

    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            tokio::select! {
                r = tokio::signal::ctrl_c() => match r {
                    Ok(()) => tracing::info!("Ctrl-C received, shutting down"),
                    Err(e) => {
                        tracing::warn!(error = %e, "Ctrl-C listener unavailable");
                        return;
                    }
                },
                _ = shutdown.cancelled() => return,
            }
            shutdown.cancel();
        }))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn sigterm_cancels_the_token() {
        let shutdown = CancellationToken::new();
        let listener = listen(shutdown.clone()).unwrap();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown.cancelled())
            .await
            .expect("SIGTERM should cancel the token");
        listener.await.unwrap();
    }

    #[tokio::test]
    async fn listener_exits_when_shutdown_comes_from_elsewhere() {
        let shutdown = CancellationToken::new();
        let listener = listen(shutdown.clone()).unwrap();
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), listener)
            .await
            .unwrap()
            .unwrap();
    }
}
