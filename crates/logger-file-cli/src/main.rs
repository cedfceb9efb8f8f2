//! Pipe stdin into a rotating log file.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use proven_logger_file::{
    DEFAULT_KEEP_COUNT, DEFAULT_MAX_SIZE, FileLoggerConfig, RotatingWriter, RotationPolicy,
    TracingSink, keep_count_from_signed,
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid permission string
    #[error("invalid permission {0:?}: expected octal such as 600")]
    Permission(String),

    /// Reading stdin failed
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    /// Writing to the log file failed
    #[error("failed to write: {0}")]
    Write(#[source] io::Error),

    /// Writer error
    #[error(transparent)]
    Writer(#[from] proven_logger_file::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the log file and its rotated history
    #[arg(long, default_value = "/tmp/proven/rotate", env = "PROVEN_ROTATE_DIR")]
    dir: PathBuf,

    /// Name of the active log file
    #[arg(long, default_value = "log.log", env = "PROVEN_ROTATE_FILENAME")]
    filename: PathBuf,

    /// Rotated files to keep; negative keeps none
    #[arg(
        long,
        default_value_t = DEFAULT_KEEP_COUNT as i64,
        allow_negative_numbers = true,
        env = "PROVEN_ROTATE_KEEP_COUNT"
    )]
    keep_count: i64,

    /// Rotate once the file reaches this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE, env = "PROVEN_ROTATE_MAX_SIZE")]
    max_size: u64,

    /// Rotate by age instead of size, in seconds
    #[arg(long, env = "PROVEN_ROTATE_MAX_AGE_SECS")]
    max_age_secs: Option<u64>,

    /// Permission for created files, in octal
    #[arg(long, default_value = "600", env = "PROVEN_ROTATE_PERMISSION")]
    permission: String,
}

impl Args {
    fn config(&self) -> Result<FileLoggerConfig, Error> {
        let permission = u32::from_str_radix(&self.permission, 8)
            .map_err(|_| Error::Permission(self.permission.clone()))?;
        let policy = self.max_age_secs.map_or_else(
            || RotationPolicy::size(self.max_size),
            |secs| RotationPolicy::age(Duration::from_secs(secs)),
        );

        Ok(FileLoggerConfig::builder()
            .permission(permission)
            .keep_count(keep_count_from_signed(self.keep_count))
            .policy(policy)
            .sink(Arc::new(TracingSink))
            .build()?)
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let writer = RotatingWriter::open(&args.dir, &args.filename, args.config()?)?;
    info!(path = %writer.path().display(), "writing stdin");

    let stdin = io::stdin();
    let mut out = &writer;
    for line in stdin.lock().lines() {
        let mut line = line.map_err(Error::Stdin)?;
        line.push('\n');
        out.write_all(line.as_bytes()).map_err(Error::Write)?;
    }

    writer.close()?;
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    run(&args)
}
