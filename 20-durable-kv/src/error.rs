//! Error types shared by the store and the transaction log.

use thiserror::Error;

/// Errors returned by [`Store`](crate::store::Store) lookups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no such key: {0}")]
    NoSuchKey(String),
}

/// Errors produced while reading, replaying or appending to the log.
#[derive(Debug, Error)]
pub enum LogError {
    /// A line could not be parsed into an event.
    #[error("transaction log line {line} parse error: {reason}")]
    Decode { line: u64, reason: String },

    /// A line carried a sequence number that did not increase.
    #[error("transaction log line {line} out of sequence: {found} follows {previous}")]
    OutOfSequence { line: u64, previous: u64, found: u64 },

    /// Keys must be non-empty to be representable in the log.
    #[error("empty key")]
    EmptyKey,

    #[error("transaction log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The counter reached `u64::MAX`; no further event can be numbered.
    #[error("transaction log sequence exhausted after {last}")]
    SequenceExhausted { last: u64 },

    /// The writer task has exited and no longer accepts intents.
    #[error("transaction log writer stopped")]
    WriterStopped,
}

impl LogError {
    pub(crate) fn decode(line: u64, reason: impl Into<String>) -> Self {
        Self::Decode {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_such_key_names_the_key() {
        let err = StoreError::NoSuchKey("alpha".into());
        assert_eq!(err.to_string(), "no such key: alpha");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read only");
        let err: LogError = io_err.into();
        assert!(matches!(err, LogError::Io(_)));
    }

    #[test]
    fn out_of_sequence_reports_both_numbers() {
        let err = LogError::OutOfSequence {
            line: 2,
            previous: 7,
            found: 7,
        };
        let text = err.to_string();
        assert!(text.contains("line 2"));
        assert!(text.contains("7 follows 7"));
    }

    #[test]
    fn sequence_exhausted_names_the_last_number() {
        let err = LogError::SequenceExhausted { last: u64::MAX };
        assert!(err.to_string().contains("18446744073709551615"));
    }
}
