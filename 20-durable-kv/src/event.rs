//! Transaction log records and their line encoding.
//!
//! Each event occupies one line:
//!
//! ```text
//! <sequence>\t<kind>\t<key>\t"<value>"\n
//! ```
//!
//! `kind` is `1` for a put and `2` for a delete. Inside the key and value,
//! backslash, tab, newline, carriage return and double quote are written as
//! `\\`, `\t`, `\n`, `\r` and `\"`, so a raw tab is always a field delimiter
//! and a raw newline always ends the record.

use std::fmt;

use crate::error::LogError;

const LINE_ENDINGS: &[char] = &['\n', '\r'];
const FIELD_DELIMITER: char = '\t';
const QUOTE: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Put,
    Delete,
}

impl EventKind {
    /// Integer written in the kind field.
    pub fn code(self) -> u8 {
        match self {
            EventKind::Put => 1,
            EventKind::Delete => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EventKind::Put),
            2 => Some(EventKind::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Put => f.write_str("put"),
            EventKind::Delete => f.write_str("delete"),
        }
    }
}

/// One durable mutation. `value` is empty for deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sequence: u64,
    pub kind: EventKind,
    pub key: String,
    pub value: String,
}

impl Event {
    pub fn put(sequence: u64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            sequence,
            kind: EventKind::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(sequence: u64, key: impl Into<String>) -> Self {
        Self {
            sequence,
            kind: EventKind::Delete,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Encodes the event as a newline-terminated log record.
    pub fn encode_line(&self) -> String {
        let mut line = String::with_capacity(self.key.len() + self.value.len() + 24);
        line.push_str(&self.sequence.to_string());
        line.push(FIELD_DELIMITER);
        line.push_str(&self.kind.code().to_string());
        line.push(FIELD_DELIMITER);
        escape_into(&self.key, &mut line);
        line.push(FIELD_DELIMITER);
        line.push(QUOTE);
        escape_into(&self.value, &mut line);
        line.push(QUOTE);
        line.push('\n');
        line
    }

    /// Parses one record. `line_number` is only used for error reporting.
    ///
    /// Trailing line endings are ignored. Nothing else is tolerated: a
    /// malformed record is an error, never partially recovered.
    pub fn decode_line(line_number: u64, line: &str) -> Result<Self, LogError> {
        let record = line.trim_end_matches(LINE_ENDINGS);
        let fields: Vec<&str> = record.split(FIELD_DELIMITER).collect();
        let [sequence, kind, key, value] = fields.as_slice() else {
            return Err(LogError::decode(
                line_number,
                format!("expected 4 fields, found {}", fields.len()),
            ));
        };

        let sequence: u64 = sequence.parse().map_err(|err| {
            LogError::decode(line_number, format!("bad sequence {sequence:?}: {err}"))
        })?;
        let code: u8 = kind
            .parse()
            .map_err(|err| LogError::decode(line_number, format!("bad kind {kind:?}: {err}")))?;
        let kind = EventKind::from_code(code)
            .ok_or_else(|| LogError::decode(line_number, format!("unknown event kind {code}")))?;

        let key = unescape(key).map_err(|reason| LogError::decode(line_number, reason))?;
        if key.is_empty() {
            return Err(LogError::decode(line_number, "empty key"));
        }

        let quoted = value
            .strip_prefix(QUOTE)
            .and_then(|rest| rest.strip_suffix(QUOTE))
            .ok_or_else(|| LogError::decode(line_number, "value is not quoted"))?;
        let value = unescape(quoted).map_err(|reason| LogError::decode(line_number, reason))?;
        if kind == EventKind::Delete && !value.is_empty() {
            return Err(LogError::decode(line_number, "delete carries a value"));
        }

        Ok(Self {
            sequence,
            kind,
            key,
            value,
        })
    }
}

fn escape_into(raw: &str, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
}

fn unescape(field: &str) -> Result<String, String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some(other) => return Err(format!("unknown escape sequence \\{other}")),
            None => return Err("dangling escape at end of field".to_string()),
        }
    }
    Ok(out)
}
