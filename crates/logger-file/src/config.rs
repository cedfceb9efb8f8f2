//! Configuration for the rotating writer

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::open::{FileOpener, SharedDeleteOpener};
use crate::policy::RotationPolicy;
use crate::sink::{DiagnosticSink, TracingSink};

/// Default file permission (owner read/write)
pub const DEFAULT_PERMISSION: u32 = 0o600;

/// Default number of rotated files kept
pub const DEFAULT_KEEP_COUNT: usize = 5;

/// Default size threshold (10 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Clamp a signed keep count from external configuration; negative means none
#[must_use]
pub fn keep_count_from_signed(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}

/// Immutable settings applied when a writer is opened
#[derive(Clone)]
pub struct FileLoggerConfig {
    /// Permission bits for created files
    pub permission: u32,
    /// Number of rotated files kept besides the active one
    pub keep_count: usize,
    /// When to rotate
    pub policy: RotationPolicy,
    /// Where rotation failures are reported
    pub sink: Arc<dyn DiagnosticSink>,
    /// How files are opened
    pub opener: Arc<dyn FileOpener>,
}

impl FileLoggerConfig {
    /// Start building a configuration from the defaults
    #[must_use]
    pub fn builder() -> FileLoggerConfigBuilder {
        FileLoggerConfigBuilder::default()
    }
}

impl Default for FileLoggerConfig {
    fn default() -> Self {
        Self {
            permission: DEFAULT_PERMISSION,
            keep_count: DEFAULT_KEEP_COUNT,
            policy: RotationPolicy::size(DEFAULT_MAX_SIZE),
            sink: Arc::new(TracingSink),
            opener: Arc::new(SharedDeleteOpener),
        }
    }
}

impl fmt::Debug for FileLoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoggerConfig")
            .field("permission", &format_args!("{:o}", self.permission))
            .field("keep_count", &self.keep_count)
            .field("policy", &self.policy)
            .field("opener", &self.opener)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FileLoggerConfig`]
#[derive(Default)]
pub struct FileLoggerConfigBuilder {
    config: FileLoggerConfig,
}

impl FileLoggerConfigBuilder {
    /// Permission bits for created files
    #[must_use]
    pub fn permission(mut self, permission: u32) -> Self {
        self.config.permission = permission;
        self
    }

    /// Number of rotated files kept
    #[must_use]
    pub fn keep_count(mut self, keep_count: usize) -> Self {
        self.config.keep_count = keep_count;
        self
    }

    /// Rotation policy
    #[must_use]
    pub fn policy(mut self, policy: RotationPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Diagnostic sink
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.config.sink = sink;
        self
    }

    /// File opener
    #[must_use]
    pub fn opener(mut self, opener: Arc<dyn FileOpener>) -> Self {
        self.config.opener = opener;
        self
    }

    /// Validate and finish
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for permission bits outside `0o777`.
    pub fn build(self) -> Result<FileLoggerConfig> {
        if self.config.permission & !0o777 != 0 {
            return Err(Error::Configuration(format!(
                "invalid permission {:o}",
                self.config.permission
            )));
        }
        Ok(self.config)
    }
}
