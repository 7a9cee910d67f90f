//! Durable key-value store backed by a write-ahead transaction log.
//!
//! The live state is an in-memory map. Every mutation is also queued to a
//! background task that appends it to a line-oriented log file, and the map
//! is rebuilt from that file at startup. Each module has one job:
//!
//! - [`store`] is the reader/writer-locked map.
//! - [`event`] defines log records and their line encoding.
//! - [`log`] holds the [`log::TransactionLog`] capability, the reader that
//!   enforces strictly increasing sequence numbers, and the file and
//!   in-memory writers.
//! - [`replay`] feeds a log into a store.
//! - [`context`] bundles store and log, and [`context::bootstrap`] runs the
//!   startup protocol (open, replay, prime the writer, start it).
//! - [`http`] serves `PUT`/`GET`/`DELETE /v1/key/{key}` over axum.
//! - [`cli`] and [`config`] turn command-line flags into a [`config::Config`].

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod http;
pub mod log;
pub mod replay;
pub mod store;
