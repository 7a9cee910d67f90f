//! The write-ahead transaction log.
//!
//! - [`reader`] scans an existing log and enforces the sequence invariant.
//! - [`writer`] owns the log file and appends events from a background task.
//! - [`memory`] keeps events in a `Vec` for tests and embedding.
//!
//! Request handlers only see the [`TransactionLog`] capability, so the
//! file-backed and in-memory variants are interchangeable.

use async_trait::async_trait;

use crate::error::LogError;

pub mod memory;
pub mod reader;
pub mod writer;

pub use memory::MemoryTransactionLog;
pub use reader::EventReader;
pub use writer::{FileTransactionLog, LogFile, WriterOptions};

/// Durable record of store mutations.
///
/// `write_put` and `write_delete` return once the intent is queued, not once
/// it is on disk. Use [`flush`](TransactionLog::flush) when the caller needs
/// to know the record is durable.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LogError>;

    async fn write_delete(&self, key: &str) -> Result<(), LogError>;

    /// Highest sequence number known to be durable.
    fn durable_sequence(&self) -> u64;

    /// Waits until every intent queued before this call is durable and
    /// returns the durable sequence at that point.
    async fn flush(&self) -> Result<u64, LogError>;

    /// Drains queued intents and stops accepting new ones.
    ///
    /// Returns the final durable sequence.
    async fn close(&self) -> Result<u64, LogError>;
}
