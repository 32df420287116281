//! # eBPF Program Loading and Tracepoint Attachment
//!
//! Loads the compiled `filemon-ebpf` object and binds one program per
//! monitored syscall to its `syscalls:<category>` tracepoint.
//!
//! The monitored set is an explicit static table: the program name inside
//! the object equals the syscall category, so adding a syscall means adding
//! one entry here and one handler in `filemon-ebpf`.

use aya::programs::trace_point::{TracePoint, TracePointLink};
use aya::Ebpf;
use aya_log::EbpfLogger;
use log::{debug, info, warn};

use crate::domain::MonitorError;

/// Syscall categories the monitor attaches to. Each entry names both the
/// program in the eBPF object and the tracepoint under `syscalls:`.
pub const MONITORED_SYSCALLS: &[&str] =
    &["sys_enter_execve", "sys_enter_open", "sys_enter_openat"];

/// Environment variable overriding the eBPF object path.
pub const BPF_PATH_ENV: &str = "FILEMON_BPF_PATH";

/// Where `cargo xtask build-ebpf` leaves the object.
pub const DEFAULT_BPF_PATH: &str = "target/bpfel-unknown-none/release/filemon";

/// A live attachment of one loaded program to its kernel tracepoint.
///
/// Owned exclusively by the monitor lifecycle; dropping it detaches the
/// kernel-side hook. A binding has no meaning after the session stops.
pub struct TracepointBinding {
    category: &'static str,
    _link: TracePointLink,
}

impl TracepointBinding {
    /// The syscall category this binding traces.
    #[must_use]
    pub fn category(&self) -> &'static str {
        self.category
    }
}

impl Drop for TracepointBinding {
    fn drop(&mut self) {
        debug!("detaching tracepoint syscalls:{}", self.category);
    }
}

/// Loads the eBPF object file into the kernel.
///
/// The path comes from `FILEMON_BPF_PATH` when set, otherwise the default
/// build location. Loading from a file (rather than embedding bytes at
/// compile time) keeps the userspace build independent of the nightly
/// cross-compilation the eBPF object needs.
///
/// # Errors
/// Returns an error if the object cannot be read or fails verification.
pub fn load_ebpf_program() -> Result<Ebpf, MonitorError> {
    let path =
        std::env::var(BPF_PATH_ENV).unwrap_or_else(|_| DEFAULT_BPF_PATH.to_string());
    Ebpf::load_file(&path).map_err(|source| MonitorError::LoadFailed { path, source })
}

/// Initialize the kernel-side logger bridge. Failure is non-fatal: the
/// monitor works without kernel log output.
pub fn init_ebpf_logger(bpf: &mut Ebpf) {
    if let Err(e) = EbpfLogger::init(bpf) {
        warn!("failed to initialize eBPF logger: {e}");
    }
}

/// Attaches every monitored category, producing one live binding per entry.
///
/// Fail-fast: the first failure aborts the whole attach sequence. Bindings
/// already created during the failed attempt are dropped (detached) before
/// the error propagates, so no half-attached session survives. Successful
/// attaches start delivering events into the ring buffer immediately, even
/// before anything drains it; kernel-side drops under overload are accepted.
///
/// # Errors
/// Returns an error if any program is missing from the object or fails to
/// load or attach.
pub fn attach_tracepoints(bpf: &mut Ebpf) -> Result<Vec<TracepointBinding>, MonitorError> {
    let mut bindings = Vec::with_capacity(MONITORED_SYSCALLS.len());
    for &category in MONITORED_SYSCALLS {
        let program: &mut TracePoint = bpf
            .program_mut(category)
            .ok_or(MonitorError::ProgramNotFound(category))?
            .try_into()?;
        program.load()?;
        let link_id = program
            .attach("syscalls", category)
            .map_err(|source| MonitorError::AttachFailed { category, source })?;
        let link = program.take_link(link_id)?;
        info!("attached tracepoint syscalls:{category}");
        bindings.push(TracepointBinding { category, _link: link });
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitored_table_matches_decodable_operations() {
        use crate::domain::FileOperation;

        // Every monitored category must decode to an operation, otherwise the
        // loop would silently drop everything that category produces.
        for &category in MONITORED_SYSCALLS {
            let operation = match category {
                "sys_enter_open" => FileOperation::from_syscall_nr(2),
                "sys_enter_execve" => FileOperation::from_syscall_nr(59),
                "sys_enter_openat" => FileOperation::from_syscall_nr(257),
                other => panic!("no syscall number known for {other}"),
            };
            assert!(operation.is_some(), "{category} has no decodable operation");
        }
    }

    #[test]
    fn load_fails_cleanly_when_object_is_missing() {
        std::env::set_var(BPF_PATH_ENV, "/nonexistent/filemon-object");
        let result = load_ebpf_program();
        std::env::remove_var(BPF_PATH_ENV);

        let err = result.err().expect("loading a missing object must fail");
        assert!(err.to_string().contains("/nonexistent/filemon-object"));
    }
}
