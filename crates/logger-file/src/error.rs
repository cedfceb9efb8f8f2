//! Error types for the rotating file writer

use std::io;
use std::path::PathBuf;

/// Result type for rotating writer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while writing or rotating files
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create the log directory
    #[error("failed to create log directory at {path}: {source}")]
    CreateDirectory {
        /// The directory that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to open a file
    #[error("failed to open {path}: {source}")]
    Open {
        /// The file that failed to open
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to query a file
    #[error("failed to stat {path}: {source}")]
    Stat {
        /// The file that failed to be queried
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to rename a file
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to remove a retained file
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// The file that failed to be removed
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to flush and release a file handle
    #[error("failed to close {path}: {source}")]
    Close {
        /// The file being closed
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to start the background rotation thread
    #[error("failed to spawn rotation thread: {0}")]
    Spawn(#[source] io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The writer has been closed
    #[error("writer is closed")]
    Closed,
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Open { source, .. }
            | Error::Stat { source, .. }
            | Error::Rename { source, .. }
            | Error::Remove { source, .. }
            | Error::Close { source, .. }
            | Error::CreateDirectory { source, .. }
            | Error::Spawn(source) => source,
            Error::Configuration(_) => Self::new(io::ErrorKind::InvalidInput, error),
            Error::Closed => Self::other(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_paths() {
        let error = Error::Rename {
            from: PathBuf::from("/tmp/app.log"),
            to: PathBuf::from("/tmp/app.log.1"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        let message = error.to_string();
        assert!(message.contains("/tmp/app.log"));
        assert!(message.contains("/tmp/app.log.1"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_into_io_error_keeps_kind() {
        let error = Error::Open {
            path: PathBuf::from("/missing/app.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(io::Error::from(error).kind(), io::ErrorKind::NotFound);

        let closed = io::Error::from(Error::Closed);
        assert_eq!(closed.kind(), io::ErrorKind::Other);
        assert_eq!(closed.to_string(), "writer is closed");
    }
}
