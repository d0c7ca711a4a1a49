// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileStoreConfig {
    /// Root directory; each database gets its own subdirectory.
    pub data_dir: String,
    /// Database name: `[A-Za-z0-9_-]+`.
    pub database: String,
    /// fsync after every appended record.
    #[serde(default)]
    pub sync_on_write: bool,
}

impl FileStoreConfig {
    /// Database names become directory names, so they are restricted to a
    /// safe character set.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.data_dir.is_empty() {
            return Err("data_dir must not be empty".into());
        }
        if self.database.is_empty() {
            return Err("database must not be empty".into());
        }
        if let Some(c) = self
            .database
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(format!("invalid database '{}': character {c:?} not allowed", self.database));
        }
        Ok(())
    }
}
