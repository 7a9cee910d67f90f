//! Rebuilds the store from a transaction log at startup.

use tracing::{debug, info};

use crate::error::LogError;
use crate::event::{Event, EventKind};
use crate::store::Store;

/// Outcome of a successful replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Events applied to the store.
    pub events: u64,
    /// Sequence of the last applied event; the writer continues after it.
    pub last_sequence: u64,
}

/// Applies one event directly to the store, bypassing the log writer.
pub fn apply(store: &Store, event: Event) {
    match event.kind {
        EventKind::Put => store.put(event.key, event.value),
        EventKind::Delete => store.delete(&event.key),
    }
}

/// Drains `events` into `store`, stopping at the first error.
///
/// Events applied before the error stay in the store; callers that get an
/// error must not serve from it.
pub fn replay<I>(events: I, store: &Store) -> Result<ReplaySummary, LogError>
where
    I: IntoIterator<Item = Result<Event, LogError>>,
{
    let mut summary = ReplaySummary::default();
    for event in events {
        let event = event?;
        debug!(sequence = event.sequence, kind = %event.kind, key = %event.key, "replaying event");
        summary.last_sequence = event.sequence;
        summary.events += 1;
        apply(store, event);
    }

    info!(
        events = summary.events,
        last_sequence = summary.last_sequence,
        keys = store.len(),
        "transaction log replayed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::error::StoreError;
    use crate::log::EventReader;

    fn replay_text(text: &str, store: &Store) -> Result<ReplaySummary, LogError> {
        replay(EventReader::new(Cursor::new(text.as_bytes())), store)
    }

    #[test]
    fn put_then_delete_leaves_key_absent() {
        let store = Store::new();
        let summary = replay_text("1\t1\tA\t\"x\"\n2\t2\tA\t\"\"\n", &store).expect("replay");

        assert_eq!(summary, ReplaySummary { events: 2, last_sequence: 2 });
        assert_eq!(store.get("A"), Err(StoreError::NoSuchKey("A".into())));
    }

    #[test]
    fn empty_log_leaves_store_empty() {
        let store = Store::new();
        let summary = replay_text("", &store).expect("replay");
        assert_eq!(summary, ReplaySummary::default());
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_sequence_aborts_after_first_event() {
        let store = Store::new();
        let err = replay_text("1\t1\tA\t\"x\"\n1\t1\tB\t\"y\"\n", &store).unwrap_err();

        assert!(matches!(err, LogError::OutOfSequence { line: 2, .. }));
        assert_eq!(store.get("A"), Ok("x".to_string()));
        assert!(store.get("B").is_err());
    }

    #[test]
    fn later_put_wins() {
        let store = Store::new();
        replay_text("1\t1\tk\t\"old\"\n2\t1\tk\t\"new\"\n", &store).expect("replay");
        assert_eq!(store.get("k"), Ok("new".to_string()));
    }
}
