//! Echoes lifecycle events to stderr while the command runs
//!
//! A pump thread watches the event bus and hands each line to a bounded
//! single-thread pool as it arrives. While the printer is still busy with a
//! line, newer lines are dropped instead of piling up.

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use stash_core::{EnhancedEvent, EventBus};
use stash_utils::WorkerPool;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};
use tracing::{trace, warn};

const REPORTER_POOL_NAME: &str = "console_reporter";
const PUMP_THREAD_NAME: &str = "console_reporter_pump";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicUsize,
    dropped: AtomicUsize,
}

pub struct ConsoleReporter {
    /// Carries the flush timeout to the pump; dropping it also stops the pump
    stop: Option<Sender<Duration>>,
    pump: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl ConsoleReporter {
    pub fn new(events: &EventBus) -> Self {
        Self::with_writer(events, io::stderr())
    }

    /// Report to `writer` instead of stderr
    pub fn with_writer<W>(events: &EventBus, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let receiver = events.subscribe();
        let counters = Arc::new(Counters::default());
        let (stop_tx, stop_rx) = channel::bounded::<Duration>(1);
        let sink = Arc::new(Mutex::new(writer));
        let pool = WorkerPool::new_bounded_pool(REPORTER_POOL_NAME);

        let pump_counters = Arc::clone(&counters);
        let pump = thread::Builder::new()
            .name(PUMP_THREAD_NAME.to_string())
            .spawn(move || {
                let mut pump = Pump {
                    receiver,
                    pool,
                    sink,
                    counters: pump_counters,
                };
                let timeout = loop {
                    pump.forward_pending();
                    match stop_rx.recv_timeout(POLL_INTERVAL) {
                        Ok(timeout) => break timeout,
                        Err(RecvTimeoutError::Disconnected) => break Duration::ZERO,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                };
                pump.finish(timeout);
            });

        let pump = match pump {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Could not start console reporter");
                None
            }
        };

        Self {
            stop: Some(stop_tx),
            pump,
            counters,
        }
    }

    /// Lines written so far
    pub fn delivered(&self) -> usize {
        self.counters.delivered.load(Ordering::Acquire)
    }

    /// Lines discarded because the printer was busy
    pub fn dropped(&self) -> usize {
        self.counters.dropped.load(Ordering::Acquire)
    }

    /// Report what is left and give the printer `timeout` to finish
    pub fn finish(mut self, timeout: Duration) {
        self.stop(timeout);
    }

    fn stop(&mut self, timeout: Duration) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(timeout);
        }
        if let Some(pump) = self.pump.take() {
            if pump.join().is_err() {
                warn!("console reporter pump panicked");
            }
            trace!(
                delivered = self.delivered(),
                dropped = self.dropped(),
                "console reporter finished"
            );
        }
    }
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.stop(Duration::ZERO);
    }
}

struct Pump<W> {
    receiver: Receiver<EnhancedEvent>,
    pool: WorkerPool,
    sink: Arc<Mutex<W>>,
    counters: Arc<Counters>,
}

impl<W: Write + Send + 'static> Pump<W> {
    /// Hand every event received so far to the printer, one line at a time
    fn forward_pending(&mut self) {
        loop {
            let line = match self.receiver.try_recv() {
                Ok(event) => format_event(&event),
                Err(TryRecvError::Lagged(missed)) => format!("... {missed} events not shown"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return,
            };

            let sink = Arc::clone(&self.sink);
            let counters = Arc::clone(&self.counters);
            let submission = self.pool.submit(move || {
                if writeln!(sink.lock(), "{line}").is_ok() {
                    counters.delivered.fetch_add(1, Ordering::AcqRel);
                }
            });
            if !submission.is_accepted() {
                self.counters.dropped.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    fn finish(mut self, timeout: Duration) {
        self.forward_pending();
        self.pool.shutdown();
        if !self.pool.await_termination(timeout) {
            trace!("console reporter still busy at exit");
        }
    }
}

fn format_event(event: &EnhancedEvent) -> String {
    match &event.correlation_id {
        Some(id) => {
            let short: String = id.chars().take(8).collect();
            format!("[{short}] {}", event.event)
        }
        None => event.event.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::CacheEvent;
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_format_event_shortens_correlation_id() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.set_correlation_id("0123456789abcdef");
        bus.publish(CacheEvent::CloseStarted {
            cache: "dir".to_string(),
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(format_event(&event), "[01234567] [dir] closing");
    }

    #[test]
    fn test_paced_events_are_all_printed_in_order() {
        let bus = EventBus::new(256);
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::with_writer(&bus, buffer.clone());

        for i in 0..10 {
            thread::sleep(Duration::from_millis(50));
            bus.publish(CacheEvent::ConnectFinished {
                cache: format!("c{i}"),
            });
        }
        thread::sleep(Duration::from_millis(100));

        assert_eq!(reporter.dropped(), 0);
        assert_eq!(reporter.delivered(), 10);
        reporter.finish(Duration::from_secs(1));

        let expected: Vec<String> = (0..10)
            .map(|i| format!("cache connect finished (c{i})"))
            .collect();
        assert_eq!(buffer.lines(), expected);
    }

    #[test]
    fn test_burst_is_accounted_for_without_blocking() {
        let bus = EventBus::new(256);
        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::with_writer(&bus, buffer.clone());

        let start = Instant::now();
        for i in 0..200 {
            bus.publish(CacheEvent::ConnectFinished {
                cache: format!("c{i}"),
            });
        }
        assert!(start.elapsed() < Duration::from_secs(1));

        let counters = Arc::clone(&reporter.counters);
        reporter.finish(Duration::from_secs(1));

        let delivered = counters.delivered.load(Ordering::Acquire);
        let dropped = counters.dropped.load(Ordering::Acquire);
        assert!(delivered >= 1);
        assert_eq!(delivered + dropped, 200);
        assert_eq!(buffer.lines().len(), delivered);
    }

    #[test]
    fn test_events_before_subscription_are_not_reported() {
        let bus = EventBus::new(16);
        bus.publish(CacheEvent::ConnectStarted);

        let buffer = SharedBuffer::default();
        let reporter = ConsoleReporter::with_writer(&bus, buffer.clone());
        reporter.finish(Duration::from_secs(1));

        assert!(buffer.lines().is_empty());
    }
}
