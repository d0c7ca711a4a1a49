use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use logsink_api::{Record, RecordId, RecordStore, StoreError, StoreFactory, StoreFuture};

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreConfig
// ═══════════════════════════════════════════════════════════════

fn default_max_records() -> usize {
    100_000
}

#[derive(Debug, serde::Deserialize)]
pub struct MemoryStoreConfig {
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

/// In-memory ring buffer. Nothing survives a restart; once `max_records`
/// is reached the oldest record is evicted. Ids keep increasing across
/// evictions.
pub struct MemoryStore {
    records: RwLock<VecDeque<Record>>,
    max_records: usize,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(max_records.min(65536))),
            max_records,
            next_id: AtomicU64::new(1),
        }
    }

    /// Snapshot of the retained records, oldest first.
    pub async fn records(&self) -> Vec<Record> {
        self.records.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(default_max_records())
    }
}

impl RecordStore for MemoryStore {
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }

    fn create(&self, record: Record) -> StoreFuture<'_, RecordId> {
        Box::pin(async move {
            if self.max_records == 0 {
                return Err(StoreError::config("memory store has max_records = 0"));
            }
            let id = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed));
            let mut buf = self.records.write().await;
            if buf.len() >= self.max_records {
                buf.pop_front();
            }
            buf.push_back(record.with_id(id));
            tracing::debug!(%id, "record stored in memory");
            Ok(id)
        })
    }

    fn flush(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryStoreFactory
// ═══════════════════════════════════════════════════════════════

pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn create(&self, config_json: &str) -> Result<Arc<dyn RecordStore>, StoreError> {
        let config: MemoryStoreConfig = if config_json == "{}" {
            MemoryStoreConfig::default()
        } else {
            serde_json::from_str(config_json).map_err(|e| StoreError::config(format!("memory store config: {e}")))?
        };
        if config.max_records == 0 {
            return Err(StoreError::config("memory store: max_records must be > 0"));
        }
        Ok(Arc::new(MemoryStore::new(config.max_records)))
    }
}
