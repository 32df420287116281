//! # filemon - eBPF File Activity Monitor
//!
//! filemon observes file-related syscall activity (open, openat, execve)
//! system-wide by attaching eBPF programs to kernel tracepoints and
//! streaming decoded events to an application-supplied subscriber. It is
//! aimed at security and audit tooling that needs low-overhead, kernel-level
//! visibility into which processes touch which files.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                eBPF Programs (Kernel)                   │
//! │   tracepoints: syscalls/sys_enter_{execve,open,openat}  │
//! └──────────────────────────┬──────────────────────────────┘
//!                            │ fixed-layout binary records
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  filemon (This Crate)                   │
//! │                                                         │
//! │   ┌───────────┐    ┌─────────┐    ┌──────────────┐      │
//! │   │ Ring Buf  │──▶│  Codec  │──▶│  Subscriber  │        │
//! │   │   Loop    │    └─────────┘    │  (callback)  │      │
//! │   └───────────┘                   └──────────────┘      │
//! │         ▲                                               │
//! │         │ Start / Stop                                  │
//! │   ┌───────────────────┐                                 │
//! │   │ Monitor Lifecycle │                                 │
//! │   └───────────────────┘                                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`monitor`]: the core: lifecycle state machine, tracepoint
//!   attachment, ring buffer drain loop, and the event codec.
//! - [`domain`]: decoded event types and structured errors.
//! - [`preflight`]: privilege and kernel-version checks plus the memlock
//!   rlimit bump.
//! - [`cli`]: command-line argument parsing for the `filemon` binary.
//!
//! The wire format lives in the `filemon-common` crate, shared with the
//! kernel-side programs in `filemon-ebpf`.
//!
//! ## Typical Usage
//!
//! ```bash
//! cargo xtask build-ebpf
//! sudo ./target/debug/filemon --json
//! ```

pub mod cli;
pub mod domain;
pub mod monitor;
pub mod preflight;
