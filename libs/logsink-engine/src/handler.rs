use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use logsink_api::{RecordId, RecordStore};

use crate::decode::decode;
use crate::error::IngestError;
use crate::frame::read_frame;
use crate::validate::validate;

/// Where a connection is in its single-message lifecycle.
///
/// `AwaitingFrame → Decoding → Validating → Persisting → Closed`. A decode
/// failure does not close the connection by itself: it reaches
/// `Validating` as an absent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingFrame,
    Decoding,
    Validating,
    Persisting,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::AwaitingFrame => f.write_str("awaiting_frame"),
            ConnectionState::Decoding => f.write_str("decoding"),
            ConnectionState::Validating => f.write_str("validating"),
            ConnectionState::Persisting => f.write_str("persisting"),
            ConnectionState::Closed => f.write_str("closed"),
        }
    }
}

/// Runs the frame → decode → validate → store pipeline for one connection.
///
/// Shared by all connection tasks; holds no per-connection state.
pub struct ConnectionHandler {
    store: Arc<dyn RecordStore>,
    read_timeout: Option<Duration>,
}

impl ConnectionHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            read_timeout: None,
        }
    }

    /// Bound the time a client may take to deliver its frame. `None`
    /// (the default) waits forever.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Read one message and persist it. Exactly one `create` call is made,
    /// and only when the message is valid.
    pub async fn process<R>(&self, reader: &mut R) -> Result<RecordId, IngestError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let payload = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read_frame(reader))
                .await
                .map_err(|_| IngestError::Timeout(limit))??,
            None => read_frame(reader).await?,
        };
        tracing::trace!(state = %ConnectionState::Decoding, len = payload.len());

        let document = decode(&payload);
        tracing::trace!(state = %ConnectionState::Validating, decoded = document.is_some());

        let record = validate(document)?;
        tracing::trace!(state = %ConnectionState::Persisting, service = %record.service());

        Ok(self.store.create(record).await?)
    }

    /// Handle an accepted connection end to end, then close it.
    ///
    /// Nothing is ever written back: on failure the client only sees the
    /// connection close.
    pub async fn handle<S>(&self, mut stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let span = tracing::info_span!("connection", %peer);
        async {
            match self.process(&mut stream).await {
                Ok(id) => tracing::info!(%id, "record stored"),
                Err(e) => log_failure(&e),
            }
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "shutdown");
            }
            tracing::debug!(state = %ConnectionState::Closed, "connection closed");
        }
        .instrument(span)
        .await
    }
}

fn log_failure(e: &IngestError) {
    let state = e.state();
    match e {
        IngestError::MalformedLength => {
            tracing::info!(%state, "malformed message length received, aborting connection")
        }
        IngestError::TruncatedPayload { expected, received } => {
            tracing::info!(%state, expected, received, "peer closed before full payload arrived")
        }
        IngestError::MissingField(field) => {
            tracing::info!(%state, field, "message missing required information, aborting")
        }
        IngestError::InvalidField { field, reason } => {
            tracing::info!(%state, field, %reason, "message has invalid field, aborting")
        }
        IngestError::Timeout(limit) => {
            tracing::info!(%state, ?limit, "client did not send a complete frame in time")
        }
        IngestError::Store(err) => {
            tracing::error!(%state, kind = %err.kind, error = %err.message, "failed to persist record")
        }
        other if other.is_client_fault() => tracing::info!(%state, error = %other, "message rejected"),
        other => tracing::warn!(%state, error = %other, "connection failed"),
    }
}
