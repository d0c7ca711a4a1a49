use std::path::PathBuf;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use logsink_api::{Record, RecordId, RecordStore, StoreError, StoreFuture};

use super::config::FileStoreConfig;

const ENTRIES_FILE: &str = "entries.jsonl";

// ════════════════════════════════════════════════════════════════
//  FileStore
// ════════════════════════════════════════════════════════════════

struct OpenLog {
    file: File,
    /// Length of the file after the last whole line.
    len: u64,
    next_id: u64,
}

/// Append-only JSONL store: `{data_dir}/{database}/entries.jsonl`,
/// one record per line. Appends are serialized by a mutex so each line
/// is written whole; a failed append is truncated away and reported to
/// the record that caused it.
pub struct FileStore {
    config: FileStoreConfig,
    log: Mutex<Option<OpenLog>>,
}

impl FileStore {
    pub fn new(config: FileStoreConfig) -> Self {
        Self {
            config,
            log: Mutex::new(None),
        }
    }

    /// Path of the entries file for the configured database.
    pub fn entries_path(&self) -> PathBuf {
        self.database_dir().join(ENTRIES_FILE)
    }

    fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.data_dir).join(&self.config.database)
    }

    async fn do_init(&self) -> Result<(), StoreError> {
        let mut log = self.log.lock().await;
        if log.is_some() {
            return Ok(());
        }

        self.config.validate().map_err(StoreError::config)?;

        let dir = self.database_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(format!("mkdir {}: {e}", dir.display())))?;

        let path = self.entries_path();
        let existing = match File::open(&path).await {
            Ok(file) => count_lines(BufReader::new(file))
                .await
                .map_err(|e| StoreError::io(format!("read {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(StoreError::io(format!("read {}: {e}", path.display()))),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(format!("open {}: {e}", path.display())))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| StoreError::io(format!("stat {}: {e}", path.display())))?
            .len();

        tracing::info!(path = %path.display(), existing, "file store opened");
        *log = Some(OpenLog {
            file,
            len,
            next_id: existing + 1,
        });
        Ok(())
    }

    async fn do_create(&self, record: Record) -> Result<RecordId, StoreError> {
        let mut guard = self.log.lock().await;
        let log = guard
            .as_mut()
            .ok_or_else(|| StoreError::logic("file store not initialized"))?;

        let id = RecordId(log.next_id);
        let mut line = serde_json::to_vec(&record.with_id(id))?;
        line.push(b'\n');

        if let Err(e) = append_line(&mut log.file, &line, self.config.sync_on_write).await {
            truncate_to(&mut log.file, log.len).await;
            return Err(e);
        }

        log.len += line.len() as u64;
        log.next_id += 1;
        Ok(id)
    }

    async fn do_flush(&self) -> Result<(), StoreError> {
        let mut guard = self.log.lock().await;
        if let Some(log) = guard.as_mut() {
            log.file.flush().await?;
            log.file.sync_all().await?;
        }
        Ok(())
    }
}

impl RecordStore for FileStore {
    fn init(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.do_init())
    }

    fn create(&self, record: Record) -> StoreFuture<'_, RecordId> {
        Box::pin(self.do_create(record))
    }

    fn flush(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.do_flush())
    }
}

/// Write one line and wait until the runtime has handed it to the OS.
/// tokio's `File` buffers writes, so without the flush an I/O error would
/// surface on the next call instead of this one.
async fn append_line(file: &mut File, line: &[u8], sync: bool) -> Result<(), StoreError> {
    file.write_all(line)
        .await
        .map_err(|e| StoreError::from(e).with_context(ENTRIES_FILE))?;
    file.flush()
        .await
        .map_err(|e| StoreError::from(e).with_context(ENTRIES_FILE))?;
    if sync {
        file.sync_data()
            .await
            .map_err(|e| StoreError::from(e).with_context("fsync"))?;
    }
    Ok(())
}

/// Drop a partially written line so the next append starts on a fresh one.
async fn truncate_to(file: &mut File, len: u64) {
    if let Err(e) = file.set_len(len).await {
        tracing::warn!(len, error = %e, "could not truncate partial entry");
    }
}

/// Non-empty lines in a JSONL stream, read one line at a time.
async fn count_lines<R: AsyncBufRead + Unpin>(reader: R) -> std::io::Result<u64> {
    let mut lines = reader.split(b'\n');
    let mut count = 0;
    while let Some(line) = lines.next_segment().await? {
        if !line.is_empty() {
            count += 1;
        }
    }
    Ok(count)
}
