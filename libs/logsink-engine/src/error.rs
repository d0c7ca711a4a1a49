use std::time::Duration;

use logsink_api::StoreError;

use crate::handler::ConnectionState;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("malformed message length")]
    MalformedLength,

    #[error("truncated payload: expected {expected} bytes, received {received}")]
    TruncatedPayload { expected: usize, received: usize },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("read error: {0}")]
    Read(#[source] std::io::Error),

    #[error("no complete frame within {0:?}")]
    Timeout(Duration),

    #[error("payload of {0} bytes does not fit a 4-digit length header")]
    PayloadTooLarge(usize),

    #[error("bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },

    #[error("config error: {0}")]
    Config(String),
}

impl IngestError {
    /// Connection state in which this error ends a connection.
    pub fn state(&self) -> ConnectionState {
        match self {
            IngestError::MalformedLength
            | IngestError::TruncatedPayload { .. }
            | IngestError::Read(_)
            | IngestError::Timeout(_) => ConnectionState::AwaitingFrame,
            IngestError::MalformedPayload(_) => ConnectionState::Decoding,
            IngestError::MissingField(_) | IngestError::InvalidField { .. } => {
                ConnectionState::Validating
            }
            IngestError::Store(_) => ConnectionState::Persisting,
            IngestError::PayloadTooLarge(_) | IngestError::Bind { .. } | IngestError::Config(_) => {
                ConnectionState::Closed
            }
        }
    }

    /// True when the peer sent something unusable, as opposed to a failure
    /// on our side (store, socket).
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            IngestError::MalformedLength
                | IngestError::TruncatedPayload { .. }
                | IngestError::MalformedPayload(_)
                | IngestError::MissingField(_)
                | IngestError::InvalidField { .. }
                | IngestError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_are_not_client_faults() {
        let err = IngestError::from(StoreError::io("backend unavailable"));
        assert!(!err.is_client_fault());
        assert_eq!(err.state(), ConnectionState::Persisting);
        assert_eq!(err.to_string(), "store: io: backend unavailable");
    }

    #[test]
    fn framing_failures_happen_while_awaiting_frame() {
        assert_eq!(IngestError::MalformedLength.state(), ConnectionState::AwaitingFrame);
        let truncated = IngestError::TruncatedPayload { expected: 100, received: 10 };
        assert!(truncated.is_client_fault());
        assert_eq!(truncated.state(), ConnectionState::AwaitingFrame);
    }
}
