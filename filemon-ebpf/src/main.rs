//! # eBPF Kernel-Side Instrumentation
//!
//! Tracepoint programs that capture file-touching syscalls and stream one
//! fixed-layout record per call into the `EVENTS` ring buffer.
//!
//! ## Programs
//!
//! - `sys_enter_execve` - execve(2), path = filename argument, dirfd = -1
//! - `sys_enter_open` - open(2), path = filename argument, dirfd = -1
//! - `sys_enter_openat` - openat(2), path + dirfd arguments
//!
//! The record layout is pinned in `filemon-common`; records are reserved
//! directly in the ring buffer because they are far larger than the BPF
//! stack allows. A full buffer drops the event silently.
//!
//! ## Build
//!
//! ```bash
//! cargo xtask build-ebpf
//! ```

#![no_std]
#![no_main]
#![allow(unused_unsafe)]

mod vmlinux;

use aya_ebpf::{
    helpers::{
        bpf_get_current_cgroup_id, bpf_get_current_comm, bpf_get_current_pid_tgid,
        bpf_get_current_task, bpf_ktime_get_ns, bpf_probe_read_kernel,
        bpf_probe_read_user_str_bytes,
    },
    macros::{map, tracepoint},
    maps::RingBuf,
    programs::TracePointContext,
};
use filemon_common::RawFileEvent;
use vmlinux::task_struct;

/// Ring buffer for streaming records to userspace. Sized like the original
/// deployment: large enough to ride out a slow subscriber for a while,
/// after which the kernel drops new records.
#[map]
static EVENTS: RingBuf = RingBuf::with_byte_size(1 << 24, 0); // 16MB buffer

// Argument offsets from
// /sys/kernel/debug/tracing/events/syscalls/sys_enter_*/format:
// 8 bytes of common fields, 8 bytes of syscall nr, then the arguments.
const ARG0_OFFSET: usize = 16;
const ARG1_OFFSET: usize = 24;

// x86-64 syscall numbers carried in the record's syscall_nr field.
const SYS_OPEN: i32 = 2;
const SYS_EXECVE: i32 = 59;
const SYS_OPENAT: i32 = 257;

#[tracepoint]
pub fn sys_enter_execve(ctx: TracePointContext) -> u32 {
    match try_sys_enter_execve(&ctx) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn try_sys_enter_execve(ctx: &TracePointContext) -> Result<(), i64> {
    let filename_ptr: *const u8 = unsafe { ctx.read_at(ARG0_OFFSET)? };
    submit_event(SYS_EXECVE, -1, filename_ptr)
}

#[tracepoint]
pub fn sys_enter_open(ctx: TracePointContext) -> u32 {
    match try_sys_enter_open(&ctx) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn try_sys_enter_open(ctx: &TracePointContext) -> Result<(), i64> {
    let filename_ptr: *const u8 = unsafe { ctx.read_at(ARG0_OFFSET)? };
    submit_event(SYS_OPEN, -1, filename_ptr)
}

#[tracepoint]
pub fn sys_enter_openat(ctx: TracePointContext) -> u32 {
    match try_sys_enter_openat(&ctx) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn try_sys_enter_openat(ctx: &TracePointContext) -> Result<(), i64> {
    let dirfd: i32 = unsafe { ctx.read_at(ARG0_OFFSET)? };
    let filename_ptr: *const u8 = unsafe { ctx.read_at(ARG1_OFFSET)? };
    submit_event(SYS_OPENAT, dirfd, filename_ptr)
}

/// Reserve a record in the ring buffer, fill the common and per-syscall
/// fields, and submit it. Reservation failure means the buffer is full and
/// the event is dropped, unsignaled.
fn submit_event(syscall_nr: i32, dirfd: i32, path_ptr: *const u8) -> Result<(), i64> {
    let Some(mut entry) = EVENTS.reserve::<RawFileEvent>(0) else {
        return Ok(());
    };

    let event = entry.as_mut_ptr();
    unsafe {
        // Zero the whole slot first so no uninitialized kernel memory ever
        // reaches userspace, and so path/comm are NUL-padded.
        core::ptr::write_bytes(event.cast::<u8>(), 0, core::mem::size_of::<RawFileEvent>());

        (*event).timestamp = bpf_ktime_get_ns();
        (*event).mount_ns_id = current_mount_ns_id();
        (*event).pid = (bpf_get_current_pid_tgid() >> 32) as u32;
        (*event).cgroup_id = bpf_get_current_cgroup_id();
        (*event).dirfd = dirfd;
        (*event).syscall_nr = syscall_nr;
        if let Ok(comm) = bpf_get_current_comm() {
            (*event).comm = comm;
        }
        let _ = bpf_probe_read_user_str_bytes(path_ptr, &mut (*event).path);
    }

    entry.submit(0);
    Ok(())
}

/// Walk task_struct -> nsproxy -> mnt_ns -> ns.inum for the current task.
/// Returns 0 when any step fails (e.g. a task mid-exit with nsproxy torn
/// down), which userspace treats as "no namespace information".
unsafe fn current_mount_ns_id() -> u64 {
    let task = bpf_get_current_task() as *const task_struct;
    let Ok(nsproxy) = bpf_probe_read_kernel(&(*task).nsproxy) else {
        return 0;
    };
    if nsproxy.is_null() {
        return 0;
    }
    let Ok(mnt_ns) = bpf_probe_read_kernel(&(*nsproxy).mnt_ns) else {
        return 0;
    };
    if mnt_ns.is_null() {
        return 0;
    }
    bpf_probe_read_kernel(&(*mnt_ns).ns.inum).map_or(0, u64::from)
}

#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { core::hint::unreachable_unchecked() }
}
