//! Structured error types for filemon
//!
//! Using thiserror for automatic Display implementation and error chaining.

use filemon_common::RECORD_SIZE;
use thiserror::Error;

/// Fatal failures surfaced from the monitor lifecycle.
///
/// Everything here aborts the `start` attempt and leaves no half-attached
/// session behind; recoverable conditions (malformed records, transient
/// ring buffer read errors) are logged inside the loop instead.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("failed to load eBPF object {path}: {source}")]
    LoadFailed {
        path: String,
        #[source]
        source: aya::EbpfError,
    },

    #[error("eBPF program {0} not found in object")]
    ProgramNotFound(&'static str),

    #[error("failed to attach to tracepoint syscalls:{category}: {source}")]
    AttachFailed {
        category: &'static str,
        #[source]
        source: aya::programs::ProgramError,
    },

    #[error("eBPF map {0} not found in object")]
    MapNotFound(&'static str),

    #[error("monitor is {0}; a session can only be started on a fresh instance")]
    InvalidState(&'static str),

    #[error(transparent)]
    Program(#[from] aya::programs::ProgramError),

    #[error(transparent)]
    Map(#[from] aya::maps::MapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Recoverable per-record decode failures. The loop drops the record and
/// keeps draining.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record too short: {0} bytes, wire format is {RECORD_SIZE}")]
    Truncated(usize),

    #[error("record carries unmonitored syscall number {0}")]
    UnknownSyscall(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_display_names_the_state() {
        let err = MonitorError::InvalidState("stopped");
        assert!(err.to_string().contains("stopped"));
    }

    #[test]
    fn truncated_display_includes_wire_size() {
        let err = DecodeError::Truncated(12);
        assert!(err.to_string().contains("12"));
        assert!(err.to_string().contains(&RECORD_SIZE.to_string()));
    }
}
