use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use logsink_api::{RecordStore, StoreFactory};
use logsink_engine::config::{ServerConfig, StoreConfig};
use logsink_engine::{ConnectionHandler, Listener};
use logsink_storage_file::FileStoreFactory;
use logsink_storage_memory::MemoryStoreFactory;

use crate::config::ServeArgs;
use crate::error::ServerError;

/// Load the config file, falling back to defaults when it does not exist,
/// then apply CLI overrides.
pub fn load_config(args: &ServeArgs) -> Result<ServerConfig, ServerError> {
    let mut config = if Path::new(&args.config).exists() {
        ServerConfig::load(&args.config)?
    } else {
        eprintln!("config '{}' not found, using defaults", args.config);
        ServerConfig::default()
    };
    if let Some(port) = args.port {
        config.listener.port = port;
    }
    if let Some(host) = &args.host {
        config.listener.host = host.clone();
    }
    Ok(config)
}

fn store_factories() -> BTreeMap<&'static str, Box<dyn StoreFactory>> {
    let mut factories: BTreeMap<&'static str, Box<dyn StoreFactory>> = BTreeMap::new();
    factories.insert("memory", Box::new(MemoryStoreFactory));
    factories.insert("file", Box::new(FileStoreFactory));
    factories
}

/// Build the configured backend. Does not call `init`.
pub fn build_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>, ServerError> {
    let factories = store_factories();
    let factory = factories.get(config.backend.as_str()).ok_or_else(|| {
        let known: Vec<&str> = factories.keys().copied().collect();
        ServerError::UnknownBackend(config.backend.clone(), known.join(", "))
    })?;
    let config_json = config.config_json()?;
    Ok(factory
        .create(&config_json)
        .map_err(|e| e.with_context(format!("store '{}'", config.backend)))?)
}

pub async fn run(args: &ServeArgs, config: ServerConfig) -> Result<(), ServerError> {
    tracing::info!(config = %args.config, "logsink-server starting");

    // --- Store ---
    let store = build_store(&config.store)?;
    store.init().await?;
    tracing::info!(backend = %config.store.backend, "store ready");

    // --- Listener ---
    let handler = ConnectionHandler::new(store.clone()).with_read_timeout(config.listener.read_timeout());
    let addr = config.listener.addr();
    let listener = Listener::bind(&addr, Arc::new(handler))
        .await?
        .with_drain_timeout(config.listener.drain_timeout());
    tracing::info!(
        addr = %listener.local_addr()?,
        read_timeout = ?config.listener.read_timeout(),
        "server ready"
    );

    let token = CancellationToken::new();
    let listener_task = tokio::spawn(listener.run(token.clone()));

    // --- Wait for Ctrl+C ---
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");
    token.cancel();

    if let Err(e) = listener_task.await {
        tracing::error!(error = %e, "listener task failed");
    }

    if let Err(e) = store.flush().await {
        tracing::error!(error = %e, "store flush error");
    }

    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(config: &str) -> ServeArgs {
        ServeArgs {
            config: config.into(),
            port: None,
            host: None,
        }
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let config = load_config(&args("/nonexistent/logsink.toml")).unwrap();
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.listener.port, 5140);
    }

    #[test]
    fn cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listener]\nhost = \"0.0.0.0\"\nport = 7000\n").unwrap();

        let mut a = args(path.to_str().unwrap());
        a.port = Some(7001);
        let config = load_config(&a).unwrap();

        assert_eq!(config.listener.addr(), "0.0.0.0:7001");
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[listener\n").unwrap();
        assert!(load_config(&args(path.to_str().unwrap())).is_err());
    }

    #[test]
    fn unknown_backend_lists_known_ones() {
        let config = StoreConfig {
            backend: "mongo".into(),
            config: None,
        };
        let err = build_store(&config).err().unwrap();
        assert_eq!(
            err.to_string(),
            "unknown store backend 'mongo' (expected one of: file, memory)"
        );
    }

    #[tokio::test]
    async fn builds_file_backend_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "[store]\nbackend = \"file\"\n[store.config]\ndata_dir = {:?}\ndatabase = \"logs\"\n",
            dir.path().to_str().unwrap()
        );
        let config = ServerConfig::parse(&toml).unwrap();

        let store = build_store(&config.store).unwrap();
        store.init().await.unwrap();

        assert!(dir.path().join("logs").join("entries.jsonl").exists());
    }

    #[test]
    fn file_backend_without_config_is_rejected() {
        let config = StoreConfig {
            backend: "file".into(),
            config: None,
        };
        assert!(matches!(build_store(&config), Err(ServerError::Store(_))));
    }
}
