//! Append-only file writer with numbered rotation
//!
//! This crate provides a file writer that rotates its output without blocking
//! concurrent writers:
//! - Size or time based rotation policies
//! - Bounded, contiguously numbered history (`app.log.1` newest, `app.log.N` oldest)
//! - Background rotation with a single winner per threshold crossing
//! - Pluggable diagnostic sink for non-fatal rotation failures
//! - Platform file opening that allows rename and delete while open
//!
//! ```no_run
//! use proven_logger_file::{FileLoggerConfig, RotatingWriter, RotationPolicy};
//! use std::io::Write;
//!
//! let config = FileLoggerConfig::builder()
//!     .keep_count(3)
//!     .policy(RotationPolicy::size(1024 * 1024))
//!     .build()?;
//! let mut writer = RotatingWriter::open("/var/log/app", "app.log", config)?;
//! writer.write_all(b"hello\n")?;
//! writer.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;
mod open;
mod policy;
mod retention;
mod sink;
mod state;
mod writer;

pub use config::{
    DEFAULT_KEEP_COUNT, DEFAULT_MAX_SIZE, DEFAULT_PERMISSION, FileLoggerConfig,
    FileLoggerConfigBuilder, keep_count_from_signed,
};
pub use error::{Error, Result};
pub use open::{FileOpener, OpenMode, SharedDeleteOpener};
pub use policy::{FileState, RotationPolicy};
pub use retention::{ShiftOutcome, rotated_path, shift};
pub use sink::{DiagnosticSink, Level, MemorySink, NoOpSink, TracingSink};
pub use state::RotationState;
pub use writer::RotatingWriter;
