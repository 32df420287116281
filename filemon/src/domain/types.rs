//! Core domain types for decoded file activity.

use serde::{Deserialize, Serialize};

/// The syscall kind behind a [`FileActivityEvent`].
///
/// The raw value is the x86-64 syscall number carried on the wire; only the
/// file-touching syscalls the kernel programs hook are representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOperation {
    /// `open(2)`
    Open,
    /// `execve(2)`
    Execve,
    /// `openat(2)`
    OpenAt,
}

impl FileOperation {
    /// Maps a raw syscall number to an operation, `None` for anything the
    /// monitor does not trace.
    #[must_use]
    pub const fn from_syscall_nr(nr: i32) -> Option<Self> {
        match nr {
            2 => Some(Self::Open),
            59 => Some(Self::Execve),
            257 => Some(Self::OpenAt),
            _ => None,
        }
    }

    /// The syscall number this operation travels as on the wire.
    #[must_use]
    pub const fn syscall_nr(self) -> i32 {
        match self {
            Self::Open => 2,
            Self::Execve => 59,
            Self::OpenAt => 257,
        }
    }

    /// Short human-readable name for display output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Execve => "execve",
            Self::OpenAt => "openat",
        }
    }
}

/// One decoded file-activity record, produced once per ring buffer record.
///
/// `file` and `comm` are never longer than their wire buffer capacities
/// (4096 and 16 bytes); the codec never reads past the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileActivityEvent {
    /// Monotonic kernel time of the event, in nanoseconds.
    pub timestamp: u64,
    /// Mount namespace inode number, correlates the event with a container.
    pub mount_ns_id: u64,
    /// Process id of the acting process.
    pub pid: u32,
    /// Cgroup id of the acting process.
    pub cgroup_id: u64,
    /// Directory fd used by the syscall, -1 when not applicable.
    pub dirfd: i32,
    /// Path argument of the syscall, as passed by the caller.
    pub file: String,
    /// Short process name.
    pub comm: String,
    /// Which syscall produced the event.
    pub operation: FileOperation,
}
