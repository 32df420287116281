//! # Shared Wire Definitions (eBPF ↔ Userspace)
//!
//! Single source of truth for the binary record format that the kernel-side
//! tracepoint programs write into the `EVENTS` ring buffer and that the
//! userspace codec decodes.
//!
//! The layout is fixed-width and little-endian. Any change to field order,
//! width, or buffer capacity is a breaking change that requires rebuilding
//! both `filemon-ebpf` and the userspace decoder together.

#![no_std]

/// Name of the ring buffer map shared between kernel and userspace.
pub const EVENTS_MAP: &str = "EVENTS";

/// Capacity of the NUL-padded path buffer (matches the kernel's `PATH_MAX`).
pub const PATH_CAP: usize = 4096;

/// Capacity of the NUL-padded process-name buffer (kernel `TASK_COMM_LEN`).
pub const COMM_CAP: usize = 16;

/// Byte offsets of each field within a record. The record is packed: the
/// cgroup id sits at offset 20, deliberately unaligned, so userspace must
/// decode field-by-field rather than casting the buffer to a struct.
pub const TIMESTAMP_OFFSET: usize = 0;
pub const MOUNT_NS_ID_OFFSET: usize = 8;
pub const PID_OFFSET: usize = 16;
pub const CGROUP_ID_OFFSET: usize = 20;
pub const DIRFD_OFFSET: usize = 28;
pub const SYSCALL_NR_OFFSET: usize = 32;
pub const PATH_OFFSET: usize = 36;
pub const COMM_OFFSET: usize = PATH_OFFSET + PATH_CAP;

/// Total size of one wire record.
pub const RECORD_SIZE: usize = COMM_OFFSET + COMM_CAP;

/// One file-activity record as written by the kernel-side programs.
///
/// `#[repr(C, packed)]` pins the layout to the offsets above on a
/// little-endian target. The kernel side writes this through a ring buffer
/// reservation (the struct is far larger than the BPF stack allows);
/// userspace never casts to this type and instead decodes by offset.
#[repr(C, packed)]
pub struct RawFileEvent {
    /// Monotonic kernel time of the event, from `bpf_ktime_get_ns`.
    pub timestamp: u64,
    /// Mount namespace inode number of the acting process.
    pub mount_ns_id: u64,
    /// Process id (TGID) of the acting process.
    pub pid: u32,
    /// Cgroup id of the acting process.
    pub cgroup_id: u64,
    /// Directory fd used by the syscall, -1 when not applicable.
    pub dirfd: i32,
    /// Syscall number identifying the operation.
    pub syscall_nr: i32,
    /// Path argument, NUL-padded. No terminator when it exactly fills.
    pub path: [u8; PATH_CAP],
    /// Process name, NUL-padded. No terminator when it exactly fills.
    pub comm: [u8; COMM_CAP],
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};

    #[test]
    fn raw_event_matches_published_offsets() {
        assert_eq!(offset_of!(RawFileEvent, timestamp), TIMESTAMP_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, mount_ns_id), MOUNT_NS_ID_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, pid), PID_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, cgroup_id), CGROUP_ID_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, dirfd), DIRFD_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, syscall_nr), SYSCALL_NR_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, path), PATH_OFFSET);
        assert_eq!(offset_of!(RawFileEvent, comm), COMM_OFFSET);
        assert_eq!(size_of::<RawFileEvent>(), RECORD_SIZE);
    }
}
