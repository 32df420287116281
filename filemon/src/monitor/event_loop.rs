//! # Ring Buffer Loop
//!
//! Long-lived background task, one per running session, that drains the
//! kernel ring buffer, decodes each record, and dispatches it to the
//! subscriber in kernel delivery order.
//!
//! Subscriber notification is synchronous: the loop only asks for the next
//! record after `notify` returns, so a slow subscriber throttles the drain
//! rate and thereby how fast the kernel-side buffer is freed.
//!
//! The loop never touches lifecycle state. Its only termination path is the
//! close signal the lifecycle fires during `stop`, observed through the
//! [`RecordSource`] as a `Closed` read.

use std::sync::Arc;

use aya::maps::{MapData, RingBuf};
use log::{debug, warn};
use tokio::io::unix::AsyncFd;
use tokio::sync::watch;

use super::{codec, Subscriber};

/// Outcome of one blocking read from the record source.
pub(crate) enum RingRead {
    /// One complete record, in kernel delivery order.
    Record(Vec<u8>),
    /// A read failed for a reason other than closing; retry.
    Transient,
    /// The buffer was closed; the loop must exit.
    Closed,
}

/// The ring buffer reader boundary. Production uses [`KernelRingSource`];
/// tests script the read sequence to exercise the loop without a kernel.
pub(crate) trait RecordSource {
    async fn next_record(&mut self) -> RingRead;
}

/// Reads records from the kernel ring buffer, honoring the session's close
/// signal. Owns the ring buffer handle for the lifetime of the loop task.
pub(crate) struct KernelRingSource {
    ring: AsyncFd<RingBuf<MapData>>,
    closed: watch::Receiver<bool>,
}

impl KernelRingSource {
    pub(crate) fn new(ring: AsyncFd<RingBuf<MapData>>, closed: watch::Receiver<bool>) -> Self {
        Self { ring, closed }
    }
}

impl RecordSource for KernelRingSource {
    async fn next_record(&mut self) -> RingRead {
        loop {
            if *self.closed.borrow() {
                return RingRead::Closed;
            }
            // Drain anything already queued before suspending.
            if let Some(record) = self.ring.get_mut().next() {
                return RingRead::Record(record.to_vec());
            }
            tokio::select! {
                // Fires on the close signal, or when the lifecycle that owns
                // the sender is dropped mid-session. Either way: closed.
                _ = self.closed.changed() => return RingRead::Closed,
                guard = self.ring.readable_mut() => match guard {
                    Ok(mut guard) => guard.clear_ready(),
                    Err(err) => {
                        warn!("ring buffer poll failed: {err}");
                        return RingRead::Transient;
                    }
                },
            }
        }
    }
}

/// Drives the drain loop until the source reports `Closed`.
///
/// Malformed records and transient read errors are logged and skipped;
/// neither terminates the loop.
pub(crate) async fn run_event_loop<S: RecordSource>(
    mut source: S,
    subscriber: Arc<dyn Subscriber>,
) {
    loop {
        match source.next_record().await {
            RingRead::Record(record) => match codec::decode(&record) {
                Ok(event) => subscriber.notify(event),
                Err(err) => debug!("dropping malformed record: {err}"),
            },
            RingRead::Transient => {}
            RingRead::Closed => break,
        }
    }
    debug!("ring buffer loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileActivityEvent;
    use crate::monitor::codec::tests::{encode, sample_event};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays a fixed read sequence, then reports `Closed`.
    struct ScriptedSource {
        reads: VecDeque<RingRead>,
    }

    impl ScriptedSource {
        fn new(reads: Vec<RingRead>) -> Self {
            Self { reads: reads.into() }
        }
    }

    impl RecordSource for ScriptedSource {
        async fn next_record(&mut self) -> RingRead {
            self.reads.pop_front().unwrap_or(RingRead::Closed)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<FileActivityEvent>>,
    }

    impl Subscriber for Recorder {
        fn notify(&self, event: FileActivityEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn event_with_pid(pid: u32) -> FileActivityEvent {
        FileActivityEvent { pid, ..sample_event() }
    }

    #[tokio::test]
    async fn dispatches_records_in_delivery_order() {
        let first = event_with_pid(1);
        let second = event_with_pid(2);
        let third = event_with_pid(3);
        let source = ScriptedSource::new(vec![
            RingRead::Record(encode(&first)),
            RingRead::Record(encode(&second)),
            RingRead::Record(encode(&third)),
        ]);
        let recorder = Arc::new(Recorder::default());

        run_event_loop(source, recorder.clone()).await;

        assert_eq!(*recorder.events.lock().unwrap(), vec![first, second, third]);
    }

    #[tokio::test]
    async fn malformed_record_is_skipped_not_fatal() {
        let good = sample_event();
        let source = ScriptedSource::new(vec![
            RingRead::Record(vec![0u8; 10]), // truncated
            RingRead::Record(encode(&good)),
        ]);
        let recorder = Arc::new(Recorder::default());

        run_event_loop(source, recorder.clone()).await;

        assert_eq!(*recorder.events.lock().unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn transient_read_errors_are_retried() {
        let good = sample_event();
        let source = ScriptedSource::new(vec![
            RingRead::Transient,
            RingRead::Transient,
            RingRead::Record(encode(&good)),
        ]);
        let recorder = Arc::new(Recorder::default());

        run_event_loop(source, recorder.clone()).await;

        assert_eq!(recorder.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_read_exits_promptly() {
        let source = ScriptedSource::new(vec![RingRead::Closed]);
        let recorder = Arc::new(Recorder::default());

        tokio::time::timeout(
            Duration::from_secs(1),
            run_event_loop(source, recorder.clone()),
        )
        .await
        .expect("loop must exit on the closed read");

        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_after_closed_are_never_dispatched() {
        let source = ScriptedSource::new(vec![
            RingRead::Closed,
            RingRead::Record(encode(&sample_event())),
        ]);
        let recorder = Arc::new(Recorder::default());

        run_event_loop(source, recorder.clone()).await;

        assert!(recorder.events.lock().unwrap().is_empty());
    }
}
