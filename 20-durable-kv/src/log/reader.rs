use std::io::BufRead;
use std::iter::FusedIterator;

use crate::error::LogError;
use crate::event::Event;

/// Lazily decodes events from a log, one line at a time.
///
/// Each event must carry a sequence number strictly greater than the one
/// before it; the first event only has to be greater than zero. The first
/// error ends the iteration, and the offending line is never yielded.
pub struct EventReader<R> {
    reader: R,
    buf: Vec<u8>,
    line: u64,
    last_sequence: u64,
    done: bool,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            last_sequence: 0,
            done: false,
        }
    }

    /// Sequence number of the last event yielded, or 0 if none was.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Number of lines consumed so far, including a rejected one.
    pub fn lines_read(&self) -> u64 {
        self.line
    }

    fn decode_current(&mut self) -> Result<Event, LogError> {
        let text = std::str::from_utf8(&self.buf)
            .map_err(|err| LogError::decode(self.line, format!("invalid UTF-8: {err}")))?;
        let event = Event::decode_line(self.line, text)?;

        if event.sequence <= self.last_sequence {
            return Err(LogError::OutOfSequence {
                line: self.line,
                previous: self.last_sequence,
                found: event.sequence,
            });
        }

        self.last_sequence = event.sequence;
        Ok(event)
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line += 1;
                let result = self.decode_current();
                self.done = result.is_err();
                Some(result)
            }
            Err(err) => {
                self.done = true;
                Some(Err(LogError::Io(err)))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for EventReader<R> {}
