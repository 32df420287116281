//! # File Activity Monitor
//!
//! Orchestrates the monitoring session: loads the kernel tracer backend,
//! attaches tracepoints, opens the ring buffer, and runs the drain loop as
//! a background task.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start()──▶ Running ──stop()──▶ Stopped
//! ```
//!
//! One session per instance: `start` on a stopped monitor is rejected.
//! `stop` is idempotent and safe even if the loop already exited.
//!
//! ## Data flow
//!
//! ```text
//! kernel tracepoints ─▶ EVENTS ring buffer ─▶ drain loop ─▶ codec ─▶ subscriber
//! ```
//!
//! The ring buffer handle and the binding list are owned here and mutated
//! only during `start`/`stop`; the loop task only reads the ring buffer and
//! calls the subscriber, so no locking is needed.

pub mod codec;
pub mod ebpf_setup;
pub(crate) mod event_loop;

use std::sync::Arc;

use aya::maps::RingBuf;
use aya::Ebpf;
use filemon_common::EVENTS_MAP;
use log::{debug, warn};
use tokio::io::unix::AsyncFd;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{FileActivityEvent, MonitorError};
use ebpf_setup::TracepointBinding;
use event_loop::KernelRingSource;

pub use ebpf_setup::MONITORED_SYSCALLS;

/// Receives decoded events from the drain loop.
///
/// `notify` is called synchronously from the loop's background task, never
/// from the thread that called `start`, potentially many times per second.
/// It must not block indefinitely: its execution time directly throttles
/// how fast the kernel-side buffer is freed.
pub trait Subscriber: Send + Sync {
    fn notify(&self, event: FileActivityEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorState {
    Idle,
    Running,
    Stopped,
}

impl MonitorState {
    const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Everything a running session owns. Created by `start`, torn down by
/// `stop`; the drop order inside `stop` is the teardown order.
struct MonitorSession {
    /// Loaded programs and maps; dropping releases them.
    ebpf: Ebpf,
    /// Live tracepoint attachments; dropping detaches them.
    bindings: Vec<TracepointBinding>,
    /// Close signal for the ring buffer reader.
    close: watch::Sender<bool>,
    /// The drain loop task.
    loop_task: JoinHandle<()>,
}

/// System-wide file activity monitor.
///
/// Call [`start`](Self::start) from within a Tokio runtime, then
/// [`stop`](Self::stop) before discarding the instance.
pub struct FileActivityMonitor {
    subscriber: Arc<dyn Subscriber>,
    state: MonitorState,
    session: Option<MonitorSession>,
}

impl FileActivityMonitor {
    /// Creates an idle monitor dispatching to `subscriber`.
    #[must_use]
    pub fn new(subscriber: Arc<dyn Subscriber>) -> Self {
        Self { subscriber, state: MonitorState::Idle, session: None }
    }

    /// Starts the monitoring session: loads the eBPF object, attaches every
    /// monitored tracepoint, opens the ring buffer, and spawns the drain
    /// loop. Returns without waiting for any events.
    ///
    /// Must be called from within a Tokio runtime (the ring buffer reader
    /// registers with the runtime's I/O driver).
    ///
    /// # Errors
    ///
    /// Any load or attach failure aborts the attempt and surfaces here;
    /// partially attached tracepoints are detached before the error
    /// returns. Also fails if the monitor is not idle, since each instance
    /// runs at most one session.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.state != MonitorState::Idle {
            return Err(MonitorError::InvalidState(self.state.name()));
        }

        let mut ebpf = ebpf_setup::load_ebpf_program()?;
        ebpf_setup::init_ebpf_logger(&mut ebpf);

        let bindings = ebpf_setup::attach_tracepoints(&mut ebpf)?;

        let ring_map =
            ebpf.take_map(EVENTS_MAP).ok_or(MonitorError::MapNotFound(EVENTS_MAP))?;
        let ring = RingBuf::try_from(ring_map)?;
        let ring = AsyncFd::new(ring)?;

        let (close, closed) = watch::channel(false);
        let source = KernelRingSource::new(ring, closed);
        let loop_task =
            tokio::spawn(event_loop::run_event_loop(source, Arc::clone(&self.subscriber)));

        self.session = Some(MonitorSession { ebpf, bindings, close, loop_task });
        self.state = MonitorState::Running;
        debug!("monitor running, {} tracepoints attached", MONITORED_SYSCALLS.len());
        Ok(())
    }

    /// Stops the session: fires the close signal (which unblocks the drain
    /// loop's current or next read), waits for the loop to exit, then
    /// detaches every tracepoint and releases the loaded programs and maps.
    ///
    /// Idempotent: stopping an idle or already-stopped monitor is a no-op.
    /// Release problems are logged, never returned.
    pub async fn stop(&mut self) {
        if self.state == MonitorState::Stopped {
            return;
        }

        if let Some(session) = self.session.take() {
            let MonitorSession { ebpf, bindings, close, loop_task } = session;

            // The reader treats a fired or dropped sender as closed, so this
            // cannot fail in a way that leaves the loop blocked.
            let _ = close.send(true);
            if let Err(err) = loop_task.await {
                warn!("ring buffer loop task failed: {err}");
            }

            drop(bindings);
            drop(ebpf);
        }

        self.state = MonitorState::Stopped;
        debug!("monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSubscriber;

    impl Subscriber for NullSubscriber {
        fn notify(&self, _event: FileActivityEvent) {}
    }

    fn monitor() -> FileActivityMonitor {
        FileActivityMonitor::new(Arc::new(NullSubscriber))
    }

    #[tokio::test]
    async fn stop_before_start_is_a_noop() {
        let mut monitor = monitor();
        monitor.stop().await;
        monitor.stop().await; // idempotent
        assert_eq!(monitor.state, MonitorState::Stopped);
    }

    #[tokio::test]
    async fn start_after_stop_is_rejected() {
        let mut monitor = monitor();
        monitor.stop().await;

        let err = monitor.start().err().expect("restart must be rejected");
        assert!(matches!(err, MonitorError::InvalidState("stopped")));
    }
}
