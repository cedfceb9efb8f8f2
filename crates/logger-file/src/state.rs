//! Shared counters and the rotation flag

use std::sync::atomic::{AtomicI64, AtomicU8, AtomicU64, Ordering};

use crate::policy::FileState;

/// Lifecycle of a writer with respect to rotation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RotationState {
    /// No rotation in flight
    NotRotating = 0,
    /// A background rotation is in flight
    Rotating = 1,
    /// The writer has been closed; terminal
    Closed = 2,
}

impl RotationState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotRotating,
            1 => Self::Rotating,
            _ => Self::Closed,
        }
    }
}

/// Atomic cell holding a [`RotationState`]
#[derive(Debug)]
pub(crate) struct RotationFlag(AtomicU8);

impl RotationFlag {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(RotationState::NotRotating as u8))
    }

    pub(crate) fn load(&self) -> RotationState {
        RotationState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn transition(&self, from: RotationState, to: RotationState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// `NotRotating -> Rotating`; only one concurrent caller gets `true`
    pub(crate) fn try_begin(&self) -> bool {
        self.transition(RotationState::NotRotating, RotationState::Rotating)
    }

    /// `Rotating -> NotRotating`; fails once closed
    pub(crate) fn end(&self) -> bool {
        self.transition(RotationState::Rotating, RotationState::NotRotating)
    }

    /// Terminal store, valid from any state
    pub(crate) fn close(&self) {
        self.0.store(RotationState::Closed as u8, Ordering::SeqCst);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.load() == RotationState::Closed
    }
}

/// Live counters for the active file
#[derive(Debug)]
pub(crate) struct FileStateCell {
    opened_at: AtomicI64,
    size: AtomicU64,
}

impl FileStateCell {
    pub(crate) const fn new(opened_at: i64, size: u64) -> Self {
        Self {
            opened_at: AtomicI64::new(opened_at),
            size: AtomicU64::new(size),
        }
    }

    /// Adds `written` bytes and returns the state after the addition
    pub(crate) fn add_size(&self, written: u64) -> FileState {
        let size = self.size.fetch_add(written, Ordering::SeqCst) + written;
        FileState {
            opened_at: self.opened_at.load(Ordering::SeqCst),
            size,
        }
    }

    pub(crate) fn snapshot(&self) -> FileState {
        FileState {
            opened_at: self.opened_at.load(Ordering::SeqCst),
            size: self.size.load(Ordering::SeqCst),
        }
    }

    /// Must only be called while no writer is appending
    pub(crate) fn reset(&self, opened_at: i64) {
        self.opened_at.store(opened_at, Ordering::SeqCst);
        self.size.store(0, Ordering::SeqCst);
    }
}
