//! # Event Codec
//!
//! Decodes the fixed-layout, little-endian records the kernel programs
//! write into the ring buffer (layout pinned in `filemon-common`).
//!
//! The record is packed, so fields are read by offset rather than by
//! casting the buffer to a struct. A record shorter than the wire format,
//! or one carrying a syscall number the monitor does not trace, yields a
//! [`DecodeError`] and is skipped by the caller; decoding never reads past
//! the record.

use filemon_common::{
    CGROUP_ID_OFFSET, COMM_CAP, COMM_OFFSET, DIRFD_OFFSET, MOUNT_NS_ID_OFFSET, PATH_CAP,
    PATH_OFFSET, PID_OFFSET, RECORD_SIZE, SYSCALL_NR_OFFSET, TIMESTAMP_OFFSET,
};

use crate::domain::{DecodeError, FileActivityEvent, FileOperation};

/// Decodes one wire record into a [`FileActivityEvent`].
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] for records shorter than the wire
/// format and [`DecodeError::UnknownSyscall`] for syscall numbers outside
/// the monitored set.
pub fn decode(record: &[u8]) -> Result<FileActivityEvent, DecodeError> {
    if record.len() < RECORD_SIZE {
        return Err(DecodeError::Truncated(record.len()));
    }

    let syscall_nr = i32_at(record, SYSCALL_NR_OFFSET);
    let operation =
        FileOperation::from_syscall_nr(syscall_nr).ok_or(DecodeError::UnknownSyscall(syscall_nr))?;

    Ok(FileActivityEvent {
        timestamp: u64_at(record, TIMESTAMP_OFFSET),
        mount_ns_id: u64_at(record, MOUNT_NS_ID_OFFSET),
        pid: u32_at(record, PID_OFFSET),
        cgroup_id: u64_at(record, CGROUP_ID_OFFSET),
        dirfd: i32_at(record, DIRFD_OFFSET),
        file: buffer_str(&record[PATH_OFFSET..PATH_OFFSET + PATH_CAP]),
        comm: buffer_str(&record[COMM_OFFSET..COMM_OFFSET + COMM_CAP]),
        operation,
    })
}

/// Extracts a string from a NUL-padded buffer: bytes up to (not including)
/// the first NUL, or the full buffer when no NUL is present. Non-UTF-8
/// bytes are replaced lossily.
fn buffer_str(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn u64_at(record: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&record[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

fn u32_at(record: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&record[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

fn i32_at(record: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&record[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a wire record from an event, the inverse of `decode`. Panics
    /// if `file`/`comm` exceed their wire capacities.
    pub(crate) fn encode(event: &FileActivityEvent) -> Vec<u8> {
        assert!(event.file.len() <= PATH_CAP);
        assert!(event.comm.len() <= COMM_CAP);

        let mut record = vec![0u8; RECORD_SIZE];
        record[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 8]
            .copy_from_slice(&event.timestamp.to_le_bytes());
        record[MOUNT_NS_ID_OFFSET..MOUNT_NS_ID_OFFSET + 8]
            .copy_from_slice(&event.mount_ns_id.to_le_bytes());
        record[PID_OFFSET..PID_OFFSET + 4].copy_from_slice(&event.pid.to_le_bytes());
        record[CGROUP_ID_OFFSET..CGROUP_ID_OFFSET + 8]
            .copy_from_slice(&event.cgroup_id.to_le_bytes());
        record[DIRFD_OFFSET..DIRFD_OFFSET + 4].copy_from_slice(&event.dirfd.to_le_bytes());
        record[SYSCALL_NR_OFFSET..SYSCALL_NR_OFFSET + 4]
            .copy_from_slice(&event.operation.syscall_nr().to_le_bytes());
        record[PATH_OFFSET..PATH_OFFSET + event.file.len()]
            .copy_from_slice(event.file.as_bytes());
        record[COMM_OFFSET..COMM_OFFSET + event.comm.len()]
            .copy_from_slice(event.comm.as_bytes());
        record
    }

    pub(crate) fn sample_event() -> FileActivityEvent {
        FileActivityEvent {
            timestamp: 123_456_789_000,
            mount_ns_id: 4_026_531_840,
            pid: 4321,
            cgroup_id: 77,
            dirfd: -1,
            file: "/bin/ls".to_string(),
            comm: "bash".to_string(),
            operation: FileOperation::Execve,
        }
    }

    #[test]
    fn roundtrips_a_valid_event() {
        let event = sample_event();
        assert_eq!(decode(&encode(&event)), Ok(event));
    }

    #[test]
    fn roundtrips_an_openat_event() {
        let event = FileActivityEvent {
            dirfd: 3,
            file: "relative/config.toml".to_string(),
            operation: FileOperation::OpenAt,
            ..sample_event()
        };
        assert_eq!(decode(&encode(&event)), Ok(event));
    }

    #[test]
    fn short_record_is_a_decode_error_not_a_panic() {
        assert_eq!(decode(&[]), Err(DecodeError::Truncated(0)));
        let truncated = vec![0u8; RECORD_SIZE - 1];
        assert_eq!(decode(&truncated), Err(DecodeError::Truncated(RECORD_SIZE - 1)));
    }

    #[test]
    fn path_filling_capacity_without_nul_decodes_in_full() {
        let event = FileActivityEvent {
            file: "x".repeat(PATH_CAP),
            comm: "y".repeat(COMM_CAP),
            ..sample_event()
        };
        let decoded = decode(&encode(&event)).unwrap();
        assert_eq!(decoded.file.len(), PATH_CAP);
        assert_eq!(decoded.comm.len(), COMM_CAP);
        assert_eq!(decoded, event);
    }

    #[test]
    fn bytes_after_the_first_nul_are_ignored() {
        let event = sample_event();
        let mut record = encode(&event);
        // Simulate a reused kernel buffer: junk past the terminator.
        record[PATH_OFFSET + event.file.len() + 1] = b'Z';
        assert_eq!(decode(&record).unwrap().file, event.file);
    }

    #[test]
    fn unknown_syscall_number_is_rejected() {
        let mut record = encode(&sample_event());
        record[SYSCALL_NR_OFFSET..SYSCALL_NR_OFFSET + 4].copy_from_slice(&1234i32.to_le_bytes());
        assert_eq!(decode(&record), Err(DecodeError::UnknownSyscall(1234)));
    }

    #[test]
    fn oversized_record_decodes_its_fixed_prefix() {
        let event = sample_event();
        let mut record = encode(&event);
        record.extend_from_slice(&[0xAA; 32]);
        assert_eq!(decode(&record), Ok(event));
    }
}
