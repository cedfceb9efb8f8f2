//! Rotation policies

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

/// Snapshot of the file currently being written to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileState {
    /// Unix time (seconds) at which the file was opened
    pub opened_at: i64,
    /// Size at open time plus every byte written since
    pub size: u64,
}

/// Decides when the active file is due for rotation
#[derive(Clone)]
pub enum RotationPolicy {
    /// Rotate once the file reaches `max_bytes`
    Size {
        /// Size threshold in bytes
        max_bytes: u64,
    },

    /// Rotate once the file has been open for at least `max_age`
    Age {
        /// Maximum time a file stays active, in whole seconds
        max_age: Duration,
    },

    /// Rotate when the predicate over the open time (Unix seconds) returns true
    OpenedAt(Arc<dyn Fn(i64) -> bool + Send + Sync>),

    /// Rotate when the predicate over the full file state returns true
    Custom(Arc<dyn Fn(&FileState) -> bool + Send + Sync>),
}

impl RotationPolicy {
    /// Size based policy
    #[must_use]
    pub const fn size(max_bytes: u64) -> Self {
        Self::Size { max_bytes }
    }

    /// Time based policy with a fixed maximum age
    #[must_use]
    pub const fn age(max_age: Duration) -> Self {
        Self::Age { max_age }
    }

    /// Time based policy with a caller supplied predicate over the open time
    pub fn opened_at<F>(predicate: F) -> Self
    where
        F: Fn(i64) -> bool + Send + Sync + 'static,
    {
        Self::OpenedAt(Arc::new(predicate))
    }

    /// Policy with a caller supplied predicate over the file state
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&FileState) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Reports whether the file described by `state` needs rotating now
    #[must_use]
    pub fn need_rotate(&self, state: &FileState) -> bool {
        self.need_rotate_at(state, Utc::now().timestamp())
    }

    /// Reports whether the file needs rotating at Unix time `now`
    #[must_use]
    pub fn need_rotate_at(&self, state: &FileState, now: i64) -> bool {
        match self {
            Self::Size { max_bytes } => state.size >= *max_bytes,
            Self::Age { max_age } => {
                let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
                now.saturating_sub(state.opened_at) >= max_age
            }
            Self::OpenedAt(predicate) => predicate(state.opened_at),
            Self::Custom(predicate) => predicate(state),
        }
    }
}

impl fmt::Debug for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size { max_bytes } => f.debug_struct("Size").field("max_bytes", max_bytes).finish(),
            Self::Age { max_age } => f.debug_struct("Age").field("max_age", max_age).finish(),
            Self::OpenedAt(_) => f.write_str("OpenedAt(..)"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
