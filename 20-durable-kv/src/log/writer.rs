//! File-backed transaction log.
//!
//! A [`LogFile`] is an opened log that has not started accepting writes. It
//! is read first, then [`LogFile::start`] hands the file to a background
//! append task seeded with the watermark found during replay. Callers talk
//! to that task through a bounded channel, so a slow disk throttles them
//! instead of growing an unbounded backlog.

use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use crate::error::LogError;
use crate::event::{Event, EventKind};
use crate::log::{EventReader, TransactionLog};

/// Intents queued before callers start waiting on a full channel.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Capacity of the intent queue. Values below 1 are treated as 1.
    pub queue_capacity: usize,
    /// Call `fdatasync` after every record, not just flush.
    pub sync_data: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sync_data: false,
        }
    }
}

/// A log file opened for read and append.
pub struct LogFile {
    file: File,
    path: PathBuf,
}

impl LogFile {
    /// Opens the log at `path`, creating an empty one if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;
        debug!(path = %path.display(), "opened transaction log");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads events from the current file position. Blocking.
    pub fn read_events(&self) -> EventReader<BufReader<&File>> {
        EventReader::new(BufReader::new(&self.file))
    }

    /// Spawns the append task and returns the writer handle together with
    /// the channel on which a fatal append error is reported.
    ///
    /// `last_sequence` is the watermark from replay; the first live event is
    /// numbered `last_sequence + 1`. Must be called inside a Tokio runtime.
    pub fn start(
        self,
        last_sequence: u64,
        options: WriterOptions,
    ) -> (FileTransactionLog, mpsc::Receiver<LogError>) {
        let (intent_tx, intent_rx) = mpsc::channel(options.queue_capacity.max(1));
        let (durable_tx, durable_rx) = watch::channel(last_sequence);
        let (error_tx, error_rx) = mpsc::channel(1);

        info!(
            path = %self.path.display(),
            last_sequence,
            queue_capacity = options.queue_capacity,
            "starting transaction log writer"
        );

        let worker = AppendWorker {
            file: tokio::fs::File::from_std(self.file),
            sequence: last_sequence,
            sync_data: options.sync_data,
            intents: intent_rx,
            durable: durable_tx,
            errors: error_tx,
            closers: Vec::new(),
        };
        tokio::spawn(worker.run());

        let log = FileTransactionLog {
            intents: intent_tx,
            durable: durable_rx,
        };
        (log, error_rx)
    }
}

enum Intent {
    Append {
        kind: EventKind,
        key: String,
        value: String,
    },
    Flush {
        respond_to: oneshot::Sender<u64>,
    },
    Close {
        respond_to: oneshot::Sender<u64>,
    },
}

/// Handle to a running append task. Cheap to share behind an `Arc`.
pub struct FileTransactionLog {
    intents: mpsc::Sender<Intent>,
    durable: watch::Receiver<u64>,
}

impl FileTransactionLog {
    /// Waits until the record numbered `sequence` has been flushed.
    pub async fn wait_durable(&self, sequence: u64) -> Result<(), LogError> {
        let mut durable = self.durable.clone();
        durable
            .wait_for(|flushed| *flushed >= sequence)
            .await
            .map(|_| ())
            .map_err(|_| LogError::WriterStopped)
    }

    /// Returns true once the append task has exited.
    pub fn is_stopped(&self) -> bool {
        self.intents.is_closed()
    }

    async fn enqueue(&self, intent: Intent) -> Result<(), LogError> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| LogError::WriterStopped)
    }

    async fn append(&self, kind: EventKind, key: &str, value: &str) -> Result<(), LogError> {
        if key.is_empty() {
            return Err(LogError::EmptyKey);
        }
        self.enqueue(Intent::Append {
            kind,
            key: key.to_owned(),
            value: value.to_owned(),
        })
        .await
    }
}

#[async_trait]
impl TransactionLog for FileTransactionLog {
    async fn write_put(&self, key: &str, value: &str) -> Result<(), LogError> {
        self.append(EventKind::Put, key, value).await
    }

    async fn write_delete(&self, key: &str) -> Result<(), LogError> {
        self.append(EventKind::Delete, key, "").await
    }

    fn durable_sequence(&self) -> u64 {
        *self.durable.borrow()
    }

    async fn flush(&self) -> Result<u64, LogError> {
        let (respond_to, response) = oneshot::channel();
        self.enqueue(Intent::Flush { respond_to }).await?;
        response.await.map_err(|_| LogError::WriterStopped)
    }

    async fn close(&self) -> Result<u64, LogError> {
        let (respond_to, response) = oneshot::channel();
        self.enqueue(Intent::Close { respond_to }).await?;
        response.await.map_err(|_| LogError::WriterStopped)
    }
}

/// The single owner of the append cursor and the sequence counter.
struct AppendWorker {
    file: tokio::fs::File,
    sequence: u64,
    sync_data: bool,
    intents: mpsc::Receiver<Intent>,
    durable: watch::Sender<u64>,
    errors: mpsc::Sender<LogError>,
    closers: Vec<oneshot::Sender<u64>>,
}

impl AppendWorker {
    async fn run(mut self) {
        while let Some(intent) = self.intents.recv().await {
            match intent {
                Intent::Append { kind, key, value } => {
                    if let Err(err) = self.append(kind, key, value).await {
                        error!(
                            error = %err,
                            last_sequence = self.sequence,
                            "transaction log append failed, writer stopping"
                        );
                        // Capacity 1 and only one error is ever sent.
                        let _ = self.errors.try_send(err);
                        return;
                    }
                }
                Intent::Flush { respond_to } => {
                    let _ = respond_to.send(self.sequence);
                }
                Intent::Close { respond_to } => {
                    // Intents already accepted by the channel are still drained.
                    self.intents.close();
                    self.closers.push(respond_to);
                }
            }
        }

        info!(last_sequence = self.sequence, "transaction log writer stopped");
        for closer in self.closers.drain(..) {
            let _ = closer.send(self.sequence);
        }
    }

    async fn append(
        &mut self,
        kind: EventKind,
        key: String,
        value: String,
    ) -> Result<(), LogError> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or(LogError::SequenceExhausted {
                last: self.sequence,
            })?;
        let event = Event {
            sequence,
            kind,
            key,
            value,
        };

        self.file.write_all(event.encode_line().as_bytes()).await?;
        self.file.flush().await?;
        if self.sync_data {
            self.file.sync_data().await?;
        }

        self.sequence = event.sequence;
        self.durable.send_replace(self.sequence);
        debug!(sequence = event.sequence, kind = %event.kind, key = %event.key, "appended event");
        Ok(())
    }
}
