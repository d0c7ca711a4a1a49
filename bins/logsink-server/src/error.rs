#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown store backend '{0}' (expected one of: {1})")]
    UnknownBackend(String, String),

    #[error("store: {0}")]
    Store(#[from] logsink_api::StoreError),

    #[error("{0}")]
    Ingest(#[from] logsink_engine::IngestError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
