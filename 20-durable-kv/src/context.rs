//! The object every request handler works through.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::info;

use crate::config::Config;
use crate::error::{LogError, StoreError};
use crate::log::{LogFile, TransactionLog};
use crate::replay::{replay, ReplaySummary};
use crate::store::Store;

/// Store plus the log that makes it durable.
///
/// Mutations update the store first and then queue the matching log event,
/// so a failed log write never rolls back committed in-memory state. The
/// store update and the enqueue happen under one lock, so the log records
/// mutations in the order the store applied them. Reads never take it.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<Store>,
    log: Arc<dyn TransactionLog>,
    writes: Arc<Mutex<()>>,
}

impl AppContext {
    pub fn new(store: Arc<Store>, log: Arc<dyn TransactionLog>) -> Self {
        Self {
            store,
            log,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn log(&self) -> &dyn TransactionLog {
        self.log.as_ref()
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<(), LogError> {
        if key.is_empty() {
            return Err(LogError::EmptyKey);
        }
        let _ordered = self.writes.lock().await;
        self.store.put(key, value);
        self.log.write_put(key, value).await
    }

    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        self.store.get(key)
    }

    pub async fn delete(&self, key: &str) -> Result<(), LogError> {
        if key.is_empty() {
            return Err(LogError::EmptyKey);
        }
        let _ordered = self.writes.lock().await;
        self.store.delete(key);
        self.log.write_delete(key).await
    }
}

/// Result of [`bootstrap`].
pub struct Bootstrap {
    pub context: AppContext,
    /// Receives the error that stopped the log writer, if one ever does.
    pub writer_errors: mpsc::Receiver<LogError>,
    pub replay: ReplaySummary,
}

/// Opens the log, replays it into a fresh store, then starts the writer.
///
/// Any replay error is returned and nothing is started: a store that does
/// not match its log is never served. Blocks while replaying; must be called
/// inside a Tokio runtime.
pub fn bootstrap(config: &Config) -> Result<Bootstrap, LogError> {
    info!(path = %config.log_file.display(), "initializing transaction log");
    let log_file = LogFile::open(&config.log_file)?;
    let store = Arc::new(Store::new());

    let summary = replay(log_file.read_events(), &store)?;
    let (log, writer_errors) = log_file.start(summary.last_sequence, config.writer);

    Ok(Bootstrap {
        context: AppContext::new(store, Arc::new(log)),
        writer_errors,
        replay: summary,
    })
}
