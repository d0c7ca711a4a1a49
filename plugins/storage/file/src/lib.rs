mod config;
mod storage;

use std::sync::Arc;

use logsink_api::{RecordStore, StoreError, StoreFactory};

pub use config::FileStoreConfig;
pub use storage::FileStore;

pub struct FileStoreFactory;

impl StoreFactory for FileStoreFactory {
    fn create(&self, config_json: &str) -> Result<Arc<dyn RecordStore>, StoreError> {
        let config: FileStoreConfig = serde_json::from_str(config_json)
            .map_err(|e| StoreError::config(format!("file store config: {e}")))?;
        Ok(Arc::new(FileStore::new(config)))
    }
}
