//! Numbered retention of rotated files
//!
//! For a canonical path `app.log` with keep count 3 the chain is
//! `app.log.1` (newest) through `app.log.3` (oldest). A shift moves every
//! existing member one slot older, drops whatever falls off the end and
//! frees the `.1` slot by renaming `app.log` into it:
//!
//! ```text
//! app.log -> app.log.1 | app.log.1 -> app.log.2 | app.log.2 -> app.log.3 | app.log.3 removed
//! app.log -> app.log.1 | app.log.1 -> app.log.2 |                        | app.log.3 kept
//! ```
//!
//! Gaps left by external tooling are compacted on the next shift.

use std::cmp::Reverse;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Path of the `n`th retained file for `path`
#[must_use]
pub fn rotated_path(path: &Path, n: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// What a shift did on disk
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShiftOutcome {
    /// Oldest file discarded to stay within the keep count
    pub removed: Option<PathBuf>,
    /// Renames performed, oldest first
    pub renamed: Vec<(PathBuf, PathBuf)>,
}

impl ShiftOutcome {
    /// Whether the shift touched anything
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.removed.is_none() && self.renamed.is_empty()
    }
}

/// Make room for `path` to become the newest retained file
///
/// Returns without touching anything when `path` itself does not exist.
///
/// # Errors
///
/// Returns [`Error::Stat`], [`Error::Remove`] or [`Error::Rename`] when the
/// filesystem refuses an operation for a reason other than the file having
/// disappeared in the meantime.
pub fn shift(path: &Path, keep: usize) -> Result<ShiftOutcome> {
    let mut outcome = ShiftOutcome::default();
    if !exists(path)? {
        return Ok(outcome);
    }

    // [app.log.3, app.log.2, app.log.1, app.log] or with gaps [app.log.3, app.log.1, app.log]
    let mut files = retained(path, keep)?;
    files.push(path.to_path_buf());

    if files.len() > keep {
        let oldest = files.remove(0);
        match fs::remove_file(&oldest) {
            Ok(()) => outcome.removed = Some(oldest),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::Remove {
                    path: oldest,
                    source,
                });
            }
        }
    }

    let len = files.len();
    for (i, from) in files.into_iter().enumerate() {
        let to = rotated_path(path, len - i);
        if from == to {
            continue;
        }
        match fs::rename(&from, &to) {
            Ok(()) => outcome.renamed.push((from, to)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(Error::Rename { from, to, source }),
        }
    }

    Ok(outcome)
}

/// Existing `path.1..=path.keep`, oldest first
///
/// Scans the directory instead of probing every slot so large keep counts
/// cost the same as small ones.
fn retained(path: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Ok(Vec::new());
    };
    if keep == 0 {
        return Ok(Vec::new());
    }
    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let prefix = format!("{}.", name.to_string_lossy());
    let stat_error = |source| Error::Stat {
        path: dir.to_path_buf(),
        source,
    };

    let mut numbers = Vec::new();
    for entry in fs::read_dir(dir).map_err(stat_error)? {
        let entry_name = entry.map_err(stat_error)?.file_name();
        let entry_name = entry_name.to_string_lossy();
        let Some(suffix) = entry_name.strip_prefix(&prefix) else {
            continue;
        };
        // Only canonical numbers: `app.log.01` and `app.log.+1` are not ours.
        if suffix.starts_with('0') || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        match suffix.parse::<usize>() {
            Ok(n) if (1..=keep).contains(&n) => numbers.push(n),
            _ => {}
        }
    }

    numbers.sort_unstable_by_key(|n| Reverse(*n));
    Ok(numbers.into_iter().map(|n| rotated_path(path, n)).collect())
}

fn exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(Error::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}
