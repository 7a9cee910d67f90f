use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, DEFAULT_LISTEN, DEFAULT_LOG_FILE};
use crate::log::writer::DEFAULT_QUEUE_CAPACITY;
use crate::log::WriterOptions;

/// Durable key-value store backed by a write-ahead transaction log.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address the HTTP service should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Transaction log to replay at startup and append to afterwards.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Number of pending log appends before requests start waiting.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Sync file data to disk after every appended record.
    #[arg(long)]
    pub sync_data: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            listen: self.listen,
            log_file: self.log_file.clone(),
            writer: WriterOptions {
                queue_capacity: self.queue_capacity,
                sync_data: self.sync_data,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["durable-kv"]).expect("parse defaults");
        let config = cli.config();
        let defaults = Config::default();

        assert_eq!(config.listen, defaults.listen);
        assert_eq!(config.log_file, defaults.log_file);
        assert_eq!(config.writer, defaults.writer);
        assert!(!cli.json);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "durable-kv",
            "--listen",
            "127.0.0.1:0",
            "--log-file",
            "/tmp/kv.log",
            "--queue-capacity",
            "4",
            "--sync-data",
            "--json",
        ])
        .expect("parse flags");
        let config = cli.config();

        assert_eq!(config.listen.port(), 0);
        assert_eq!(config.log_file, PathBuf::from("/tmp/kv.log"));
        assert_eq!(config.writer.queue_capacity, 4);
        assert!(config.writer.sync_data);
        assert!(cli.json);
    }
}
