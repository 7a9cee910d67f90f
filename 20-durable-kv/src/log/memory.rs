use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::LogError;
use crate::event::{Event, EventKind};
use crate::log::TransactionLog;

/// Transaction log that keeps events in memory.
///
/// Every write is "durable" as soon as it returns. Useful for tests that
/// exercise request handling without a file, and for checking what a
/// sequence of operations would have logged.
#[derive(Default)]
pub struct MemoryTransactionLog {
    events: Mutex<Vec<Event>>,
    closed: AtomicBool,
}

impl MemoryTransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event recorded so far, in sequence order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// The recorded events rendered in the on-disk line format.
    pub fn to_log_text(&self) -> String {
        self.events.lock().iter().map(Event::encode_line).collect()
    }

    fn record(&self, kind: EventKind, key: &str, value: &str) -> Result<(), LogError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LogError::WriterStopped);
        }
        if key.is_empty() {
            return Err(LogError::EmptyKey);
        }

        let mut events = self.events.lock();
        let sequence = events.last().map_or(0, |event| event.sequence) + 1;
        events.push(Event {
            sequence,
            kind,
            key: key.to_owned(),
            value: value.to_owned(),
        });
        Ok(())
    }
}

#[async_trait]
impl TransactionLog for MemoryTransactionLog {
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LogError> {
        self.record(EventKind::Put, key, value)
    }

    async fn write_delete(&self, key: &str) -> Result<(), LogError> {
        self.record(EventKind::Delete, key, "")
    }

    fn durable_sequence(&self) -> u64 {
        self.events.lock().last().map_or(0, |event| event.sequence)
    }

    async fn flush(&self) -> Result<u64, LogError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LogError::WriterStopped);
        }
        Ok(self.durable_sequence())
    }

    async fn close(&self) -> Result<u64, LogError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(LogError::WriterStopped);
        }
        Ok(self.durable_sequence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn numbers_events_from_one() {
        let log = MemoryTransactionLog::new();
        log.write_put("a", "1").await.expect("put");
        log.write_delete("a").await.expect("delete");

        assert_eq!(log.events(), vec![Event::put(1, "a", "1"), Event::delete(2, "a")]);
        assert_eq!(log.to_log_text(), "1\t1\ta\t\"1\"\n2\t2\ta\t\"\"\n");
        assert_eq!(log.flush().await.expect("flush"), 2);
    }

    #[tokio::test]
    async fn refuses_writes_once_closed() {
        let log = MemoryTransactionLog::new();
        log.write_put("a", "1").await.expect("put");
        assert_eq!(log.close().await.expect("close"), 1);

        assert!(matches!(log.write_put("b", "2").await, Err(LogError::WriterStopped)));
        assert!(matches!(log.close().await, Err(LogError::WriterStopped)));
    }
}
