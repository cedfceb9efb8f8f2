//! Rotating writer and background rotation

use std::any::Any;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use crate::open::OpenMode;
use crate::policy::FileState;
use crate::retention;
use crate::state::{FileStateCell, RotationFlag, RotationState};

/// Append-only file writer that rotates in the background
///
/// `write` takes `&self`, so a writer can be shared between threads behind an
/// `Arc`. The write that pushes the file over its policy threshold starts a
/// rotation on a background thread and returns immediately; writes that race
/// with the rotation keep landing in the old file until the new one is
/// swapped in.
pub struct RotatingWriter {
    shared: Arc<Shared>,
}

struct Shared {
    path: PathBuf,
    config: FileLoggerConfig,
    /// `None` once closed. Appends hold the read side, the swap and close
    /// hold the write side.
    file: RwLock<Option<File>>,
    state: FileStateCell,
    rotation: RotationFlag,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl RotatingWriter {
    /// Open (or create) `dir/filename` for appending
    ///
    /// # Errors
    ///
    /// Returns [`Error::CreateDirectory`], [`Error::Open`] or [`Error::Stat`]
    /// when the active file cannot be prepared.
    pub fn open(
        dir: impl AsRef<Path>,
        filename: impl AsRef<Path>,
        config: FileLoggerConfig,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| Error::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(filename);
        let file = config
            .opener
            .open(&path, OpenMode::Append, config.permission)
            .map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
        let size = file
            .metadata()
            .map_err(|source| Error::Stat {
                path: path.clone(),
                source,
            })?
            .len();

        debug!(path = %path.display(), size, "opened rotating writer");

        Ok(Self {
            shared: Arc::new(Shared {
                path,
                config,
                file: RwLock::new(Some(file)),
                state: FileStateCell::new(Utc::now().timestamp(), size),
                rotation: RotationFlag::new(),
                pending: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Append `buf` to the active file
    ///
    /// The whole payload goes to a single file. If the append pushes the file
    /// over the policy threshold a background rotation is started.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error, or an error wrapping
    /// [`Error::Closed`] after [`close`](Self::close).
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let guard = self.shared.file.read();
        let Some(mut file) = guard.as_ref() else {
            return Err(Error::Closed.into());
        };
        file.write_all(buf)?;

        let written = u64::try_from(buf.len()).unwrap_or(u64::MAX);
        let state = self.shared.state.add_size(written);
        if self.shared.config.policy.need_rotate(&state) && self.shared.rotation.try_begin() {
            self.spawn_rotation();
        }

        Ok(buf.len())
    }

    /// Close the active file
    ///
    /// The writer is released even when an error is returned. Closing again
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Close`] if the file could not be synced to disk.
    pub fn close(&self) -> Result<()> {
        self.shared.rotation.close();
        let file = self.shared.file.write().take();
        match file {
            Some(file) => close_file(&self.shared.path, file),
            None => Ok(()),
        }
    }

    /// Path of the active file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Current open time and size of the active file
    #[must_use]
    pub fn file_state(&self) -> FileState {
        self.shared.state.snapshot()
    }

    /// Current rotation state
    #[must_use]
    pub fn rotation_state(&self) -> RotationState {
        self.shared.rotation.load()
    }

    /// Block until every rotation started so far has finished or given up
    ///
    /// Returns whether there was anything to wait for.
    pub fn wait_for_rotation(&self) -> bool {
        let handles = std::mem::take(&mut *self.shared.pending.lock());
        let waited = !handles.is_empty();
        for handle in handles {
            if handle.join().is_err() {
                self.shared.config.sink.error("rotation thread panicked");
            }
        }
        waited
    }

    fn spawn_rotation(&self) {
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("logger-file-rotate".to_string())
            .spawn(move || {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| shared.rotate())) {
                    shared.config.sink.error(&format!(
                        "rotation of {} panicked: {}",
                        shared.path.display(),
                        panic_message(payload.as_ref())
                    ));
                }
            });

        match spawned {
            Ok(handle) => {
                let mut pending = self.shared.pending.lock();
                pending.retain(|handle| !handle.is_finished());
                pending.push(handle);
            }
            Err(e) => {
                self.shared.report_failure(&Error::Spawn(e));
                self.shared.rotation.end();
            }
        }
    }
}

impl Shared {
    fn rotate(&self) {
        let mut in_flight = InFlight::new(&self.rotation);
        let next = match self.prepare_next() {
            Ok(next) => next,
            Err(e) => {
                self.report_failure(&e);
                return;
            }
        };

        let mut current = self.file.write();
        if self.rotation.is_closed() {
            drop(current);
            self.config.sink.debug(&format!(
                "writer for {} closed during rotation, discarding new file",
                self.path.display()
            ));
            self.release(next);
            return;
        }

        let old = current.replace(next);
        self.state.reset(Utc::now().timestamp());
        in_flight.settle();
        drop(current);

        if let Some(old) = old {
            self.release(old);
        }
        self.config
            .sink
            .debug(&format!("rotated {}", self.path.display()));
    }

    /// Shift the retained files and install a fresh file at the canonical path
    ///
    /// The fresh file is created under a unique sibling name first so the
    /// canonical path is only ever missing between the two renames.
    fn prepare_next(&self) -> Result<File> {
        let temp = temp_path(&self.path);
        let next = self
            .config
            .opener
            .open(&temp, OpenMode::CreateNew, self.config.permission)
            .map_err(|source| Error::Open {
                path: temp.clone(),
                source,
            })?;

        let installed = retention::shift(&self.path, self.config.keep_count).and_then(|outcome| {
            trace!(path = %self.path.display(), ?outcome, "shifted retained files");
            fs::rename(&temp, &self.path).map_err(|source| Error::Rename {
                from: temp.clone(),
                to: self.path.clone(),
                source,
            })
        });

        if let Err(e) = installed {
            drop(next);
            match fs::remove_file(&temp) {
                Ok(()) => {}
                Err(remove) if remove.kind() == io::ErrorKind::NotFound => {}
                Err(remove) => self.config.sink.error(&format!(
                    "failed to remove temporary file {}: {remove}",
                    temp.display()
                )),
            }
            return Err(e);
        }

        Ok(next)
    }

    fn report_failure(&self, error: &Error) {
        self.config.sink.error(&format!(
            "rotation of {} failed: {error}",
            self.path.display()
        ));
    }

    fn release(&self, file: File) {
        if let Err(e) = close_file(&self.path, file) {
            self.config.sink.error(&e.to_string());
        }
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            self.shared.config.sink.error(&e.to_string());
        }
    }
}

impl std::fmt::Debug for RotatingWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingWriter")
            .field("path", &self.shared.path)
            .field("state", &self.shared.state.snapshot())
            .field("rotation", &self.shared.rotation.load())
            .finish_non_exhaustive()
    }
}

/// Returns the flag to `NotRotating` unless the swap settled it first
///
/// Dropped on every early return and on unwind, so a failed or panicking
/// rotation never leaves the writer stuck in `Rotating`. Once closed the
/// revert is a no-op.
struct InFlight<'a> {
    rotation: &'a RotationFlag,
    settled: bool,
}

impl<'a> InFlight<'a> {
    const fn new(rotation: &'a RotationFlag) -> Self {
        Self {
            rotation,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.rotation.end();
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.rotation.end();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn close_file(path: &Path, file: File) -> Result<()> {
    file.sync_all().map_err(|source| Error::Close {
        path: path.to_path_buf(),
        source,
    })
}

/// `<path>-<pid>-<nanos>-<random hex>`
fn temp_path(path: &Path) -> PathBuf {
    let nonce: [u8; 8] = rand::random();
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(
        "-{}-{}-{}",
        std::process::id(),
        nanos,
        hex::encode(nonce)
    ));
    PathBuf::from(name)
}
