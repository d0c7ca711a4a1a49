use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::StoreError;
use crate::record::{Record, RecordId};

/// Boxed future returned by `RecordStore` methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Persistence backend for validated records.
///
/// Shared by every connection handler, so implementations synchronize
/// internally. Access is append-only: one `create` per record, no
/// read-modify-write.
///
/// Backends: memory ring buffer, JSONL file.
pub trait RecordStore: Send + Sync {
    /// Prepare the backend. Called once before the listener starts.
    fn init(&self) -> StoreFuture<'_, ()>;

    /// Persist one record atomically and return its assigned id.
    ///
    /// Takes the record by value: there is no way to call this without a
    /// record, and the caller cannot observe it after hand-off.
    fn create(&self, record: Record) -> StoreFuture<'_, RecordId>;

    /// Flush buffered writes. Called on shutdown.
    fn flush(&self) -> StoreFuture<'_, ()>;
}

/// Builds a store from its backend-specific JSON config (`"{}"` when the
/// config table is absent).
pub trait StoreFactory: Send + Sync {
    fn create(&self, config_json: &str) -> Result<Arc<dyn RecordStore>, StoreError>;
}
