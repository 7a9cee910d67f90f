//! Runtime configuration consumed by [`crate::context::bootstrap`] and the server.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::log::WriterOptions;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_LOG_FILE: &str = "transaction.log";

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP service binds to.
    pub listen: SocketAddr,
    /// Path of the transaction log, created if missing.
    pub log_file: PathBuf,
    pub writer: WriterOptions,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.writer.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            writer: WriterOptions::default(),
        }
    }
}
