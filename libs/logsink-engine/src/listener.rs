use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::error::IngestError;
use crate::handler::ConnectionHandler;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop: one independent task per connection.
pub struct Listener {
    listener: TcpListener,
    handler: Arc<ConnectionHandler>,
    drain_timeout: Duration,
}

impl Listener {
    pub async fn bind(addr: &str, handler: Arc<ConnectionHandler>) -> Result<Self, IngestError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| IngestError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self {
            listener,
            handler,
            drain_timeout: Duration::from_secs(5),
        })
    }

    /// How long `run` waits for in-flight connections after cancellation.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept until `token` is cancelled, then drain.
    ///
    /// Accept errors (e.g. fd exhaustion) are logged and retried after a
    /// short pause. Connection tasks are isolated: a failing or panicking
    /// handler never reaches this loop.
    pub async fn run(self, token: CancellationToken) {
        let addr = self
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "?".into());
        let span = tracing::info_span!("listener", %addr);
        self.accept_loop(token).instrument(span).await
    }

    async fn accept_loop(self, token: CancellationToken) {
        let tracker = TaskTracker::new();
        tracing::info!("listening");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(%peer, "connection accepted");
                        let handler = self.handler.clone();
                        tracker.spawn(
                            async move { handler.handle(stream, peer).await }.in_current_span(),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                _ = token.cancelled() => break,
            }
        }

        drop(self.listener);
        tracker.close();
        tracing::info!(in_flight = tracker.len(), "stopped accepting, draining connections");
        if tokio::time::timeout(self.drain_timeout, tracker.wait()).await.is_err() {
            tracing::warn!(
                in_flight = tracker.len(),
                timeout = ?self.drain_timeout,
                "drain timeout, abandoning open connections"
            );
        }
        tracing::info!("listener stopped");
    }
}
