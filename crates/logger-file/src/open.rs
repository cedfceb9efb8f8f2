//! Platform file opening
//!
//! Rotation renames and deletes files that the writer (or another process)
//! still holds open. Unix allows this natively; Windows only does when the
//! handle was opened with `FILE_SHARE_DELETE`.

use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// How a file should be opened
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Write-only append, creating the file if missing
    Append,
    /// Write-only, failing if the file already exists
    CreateNew,
}

/// Capability for opening files the writer appends to
pub trait FileOpener: Debug + Send + Sync + 'static {
    /// Open `path` with `mode`, creating it with `permission` when needed
    fn open(&self, path: &Path, mode: OpenMode, permission: u32) -> io::Result<File>;
}

/// Default opener; files stay renameable and deletable while open
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedDeleteOpener;

impl FileOpener for SharedDeleteOpener {
    fn open(&self, path: &Path, mode: OpenMode, permission: u32) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.write(true);
        match mode {
            OpenMode::Append => options.create(true).append(true),
            OpenMode::CreateNew => options.create_new(true),
        };
        platform::apply(&mut options, permission);
        options.open(path)
    }
}

#[cfg(unix)]
mod platform {
    use std::fs::OpenOptions;
    use std::os::unix::fs::OpenOptionsExt;

    pub(super) fn apply(options: &mut OpenOptions, permission: u32) {
        options.mode(permission);
    }
}

#[cfg(windows)]
mod platform {
    use std::fs::OpenOptions;
    use std::os::windows::fs::OpenOptionsExt;

    use windows_sys::Win32::Storage::FileSystem::{FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE};

    // Permission bits are not mapped; a read-only attribute blocks removing
    // the oldest retained file.
    pub(super) fn apply(options: &mut OpenOptions, _permission: u32) {
        options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE);
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    use std::fs::OpenOptions;

    pub(super) fn apply(_options: &mut OpenOptions, _permission: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        let mut file = SharedDeleteOpener.open(&path, OpenMode::Append, 0o600).unwrap();
        file.write_all(b"one").unwrap();
        drop(file);

        let mut file = SharedDeleteOpener.open(&path, OpenMode::Append, 0o600).unwrap();
        file.write_all(b"two").unwrap();
        drop(file);

        assert_eq!(std::fs::read(&path).unwrap(), b"onetwo");
    }

    #[test]
    fn test_create_new_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"x").unwrap();

        let err = SharedDeleteOpener
            .open(&path, OpenMode::CreateNew, 0o600)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_rename_and_remove_while_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let renamed = dir.path().join("app.log.1");

        let mut file = SharedDeleteOpener.open(&path, OpenMode::Append, 0o600).unwrap();
        std::fs::rename(&path, &renamed).unwrap();
        file.write_all(b"after rename").unwrap();
        assert_eq!(std::fs::read(&renamed).unwrap(), b"after rename");

        std::fs::remove_file(&renamed).unwrap();
        assert!(!renamed.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        SharedDeleteOpener.open(&path, OpenMode::CreateNew, 0o600).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
