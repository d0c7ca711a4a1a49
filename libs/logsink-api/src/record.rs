use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::now_ms;

/// A decoded JSON object payload.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Identifier assigned by a `RecordStore` on a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One validated log entry.
///
/// In the ingestion path records come only from validation, which
/// guarantees `service` and `path` were present. `Record::new` itself is
/// public and checks nothing, so stores and tests can build records
/// directly. `ts_ms` is always taken from the server clock. The record is
/// immutable: the only transition is `with_id`, performed by the store
/// that persisted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    service: String,
    ts_ms: i64,
    path: String,
    data: Document,
}

impl Record {
    /// Build a record stamped with the current server time.
    pub fn new(service: impl Into<String>, path: impl Into<String>, data: Document) -> Self {
        Self {
            id: None,
            service: service.into(),
            ts_ms: now_ms(),
            path: path.into(),
            data,
        }
    }

    /// Attach the store-assigned identifier.
    pub fn with_id(self, id: RecordId) -> Self {
        Self { id: Some(id), ..self }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Server capture time, Unix milliseconds.
    pub fn ts_ms(&self) -> i64 {
        self.ts_ms
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data(&self) -> &Document {
        &self.data
    }
}
