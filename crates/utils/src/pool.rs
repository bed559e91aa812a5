//! Thread pools with descriptive thread names and explicit rejection policy
//!
//! Two shapes are offered:
//!
//! - [`WorkerPool::new_bounded_pool`]: one worker behind a zero-depth queue.
//!   A task is handed over only if the worker is idle at the moment of
//!   submission; otherwise it is dropped without a word. Nothing piles up and
//!   nothing complains on the console.
//! - [`WorkerPool::new_fixed_pool`]: `N` workers sharing an unbounded queue.
//!
//! Every thread is named `<prefix>-<n>` with `n` counting from 1 per pool, so a
//! stuck shutdown shows up as e.g. `close_artifact_caches-3` in a thread dump.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// What happens to a task no worker can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionPolicy {
    /// Drop the task silently when no worker is idle
    Discard,
    /// Queue the task without bound
    Enqueue,
}

/// Result of handing a task to a pool
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    /// The pool was busy (discard policy) or already shut down
    Discarded,
}

impl Submission {
    pub fn is_accepted(self) -> bool {
        matches!(self, Submission::Accepted)
    }
}

/// Hands out `<prefix>-<n>` thread names
struct ThreadNamer {
    prefix: String,
    count: AtomicUsize,
}

impl ThreadNamer {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            count: AtomicUsize::new(0),
        }
    }

    fn next_name(&self) -> String {
        let n = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// A pool of named worker threads
pub struct WorkerPool {
    name: String,
    size: usize,
    policy: RejectionPolicy,
    /// `None` once the pool has been shut down
    sender: Option<Sender<Job>>,
    /// Never written to; disconnects once every worker thread has exited
    terminated: Receiver<()>,
}

impl WorkerPool {
    /// Single-worker pool that silently discards tasks it cannot start right away
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create the worker thread.
    pub fn new_bounded_pool(name: impl Into<String>) -> Self {
        Self::spawn(name.into(), 1, RejectionPolicy::Discard)
    }

    /// `size`-worker pool with an unbounded queue. A size of 0 is treated as 1.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create a worker thread.
    pub fn new_fixed_pool(name: impl Into<String>, size: usize) -> Self {
        Self::spawn(name.into(), size.max(1), RejectionPolicy::Enqueue)
    }

    fn spawn(name: String, size: usize, policy: RejectionPolicy) -> Self {
        let (sender, receiver) = match policy {
            RejectionPolicy::Discard => channel::bounded::<Job>(0),
            RejectionPolicy::Enqueue => channel::unbounded::<Job>(),
        };
        let (alive_tx, terminated) = channel::bounded::<()>(0);
        let (ready_tx, ready_rx) = channel::bounded::<()>(size);
        let namer = ThreadNamer::new(&name);

        for _ in 0..size {
            let thread_name = namer.next_name();
            let jobs = receiver.clone();
            let alive = alive_tx.clone();
            let ready = ready_tx.clone();

            thread::Builder::new()
                .name(thread_name.clone())
                .spawn(move || {
                    let _alive = alive;
                    let _ = ready.send(());
                    drop(ready);
                    run_worker(jobs);
                })
                .unwrap_or_else(|e| panic!("failed to spawn worker thread {thread_name}: {e}"));
        }
        drop(alive_tx);
        drop(ready_tx);

        // Wait until every worker is up so an idle pool can take work at once.
        for _ in 0..size {
            if ready_rx.recv().is_err() {
                break;
            }
        }

        debug!(pool = %name, size, ?policy, "worker pool started");

        Self {
            name,
            size,
            policy,
            sender: Some(sender),
            terminated,
        }
    }

    /// Hand a task to the pool
    pub fn submit<F>(&self, task: F) -> Submission
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            trace!(pool = %self.name, "pool is shut down, discarding task");
            return Submission::Discarded;
        };

        let job: Job = Box::new(task);
        let accepted = match self.policy {
            RejectionPolicy::Discard => sender.try_send(job).is_ok(),
            RejectionPolicy::Enqueue => sender.send(job).is_ok(),
        };

        if accepted {
            Submission::Accepted
        } else {
            trace!(pool = %self.name, "no idle worker, discarding task");
            Submission::Discarded
        }
    }

    /// Stop accepting tasks. Already accepted tasks still run to completion.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_some() {
            debug!(pool = %self.name, "worker pool shut down");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.is_none()
    }

    /// Block until every worker has exited or `timeout` elapses.
    ///
    /// Returns `true` if all workers exited. Workers only exit after
    /// [`shutdown`](Self::shutdown), so calling this on a running pool simply
    /// waits out the timeout. A zero timeout never blocks.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let result = match deadline {
                Some(deadline) => self.terminated.recv_deadline(deadline),
                None => self
                    .terminated
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };
            match result {
                Ok(()) => continue,
                Err(RecvTimeoutError::Disconnected) => return true,
                Err(RecvTimeoutError::Timeout) => return false,
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn policy(&self) -> RejectionPolicy {
        self.policy
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("policy", &self.policy)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

fn run_worker(jobs: Receiver<Job>) {
    while let Ok(job) = jobs.recv() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!(
                thread = thread::current().name().unwrap_or("unnamed"),
                "worker task panicked"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Barrier};

    fn submit_until_accepted<F, T>(pool: &WorkerPool, make_task: F)
    where
        F: Fn() -> T,
        T: FnOnce() + Send + 'static,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !pool.submit(make_task()).is_accepted() {
            assert!(Instant::now() < deadline, "pool never accepted the task");
            thread::yield_now();
        }
    }

    #[test]
    fn test_fixed_pool_runs_tasks_concurrently_on_named_threads() {
        let mut pool = WorkerPool::new_fixed_pool("fixed", 3);
        let barrier = Arc::new(Barrier::new(3));
        let names = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let barrier = Arc::clone(&barrier);
            let names = Arc::clone(&names);
            let submission = pool.submit(move || {
                // Deadlocks unless all three tasks are in flight together.
                barrier.wait();
                let name = thread::current().name().map(str::to_string);
                names.lock().push(name.unwrap_or_default());
            });
            assert!(submission.is_accepted());
        }

        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));

        let mut names = names.lock().clone();
        names.sort();
        assert_eq!(names, vec!["fixed-1", "fixed-2", "fixed-3"]);
    }

    #[test]
    fn test_fixed_pool_queues_beyond_worker_count() {
        let mut pool = WorkerPool::new_fixed_pool("queue", 2);
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let count = Arc::clone(&count);
            assert!(pool
                .submit(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .is_accepted());
        }

        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));
        assert_eq!(count.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn test_bounded_pool_discards_while_busy() {
        let mut pool = WorkerPool::new_bounded_pool("single");
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.policy(), RejectionPolicy::Discard);

        let (release_tx, release_rx) = channel::bounded::<()>(0);
        let ran = Arc::new(AtomicUsize::new(0));

        submit_until_accepted(&pool, || {
            let release_rx = release_rx.clone();
            let ran = Arc::clone(&ran);
            move || {
                let _ = release_rx.recv();
                ran.fetch_add(1, Ordering::SeqCst);
            }
        });

        // The only worker is parked inside the first task.
        let ran_clone = Arc::clone(&ran);
        let second = pool.submit(move || {
            ran_clone.fetch_add(100, Ordering::SeqCst);
        });
        assert_eq!(second, Submission::Discarded);

        drop(release_tx);
        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bounded_pool_thread_name() {
        let mut pool = WorkerPool::new_bounded_pool("reporter");
        let name = Arc::new(Mutex::new(None));

        submit_until_accepted(&pool, || {
            let name = Arc::clone(&name);
            move || {
                *name.lock() = thread::current().name().map(str::to_string);
            }
        });

        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));
        assert_eq!(name.lock().as_deref(), Some("reporter-1"));
    }

    #[test]
    fn test_submit_after_shutdown_is_discarded() {
        let mut pool = WorkerPool::new_fixed_pool("closed", 1);
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert_eq!(pool.submit(|| {}), Submission::Discarded);
        assert!(pool.await_termination(Duration::from_secs(5)));
    }

    #[test]
    fn test_await_termination_is_bounded_by_timeout() {
        let mut pool = WorkerPool::new_fixed_pool("hung", 1);
        let (_never_tx, never_rx) = channel::bounded::<()>(0);
        assert!(pool
            .submit(move || {
                let _ = never_rx.recv();
            })
            .is_accepted());
        pool.shutdown();

        let start = Instant::now();
        assert!(!pool.await_termination(Duration::from_millis(200)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_does_not_block() {
        let mut pool = WorkerPool::new_fixed_pool("zero", 1);
        let (_never_tx, never_rx) = channel::bounded::<()>(0);
        let _ = pool.submit(move || {
            let _ = never_rx.recv();
        });
        pool.shutdown();

        let start = Instant::now();
        assert!(!pool.await_termination(Duration::ZERO));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let mut pool = WorkerPool::new_fixed_pool("panics", 1);
        let flag = Arc::new(AtomicBool::new(false));

        let _ = pool.submit(|| panic!("boom"));
        let flag_clone = Arc::clone(&flag);
        let _ = pool.submit(move || flag_clone.store(true, Ordering::SeqCst));

        pool.shutdown();
        assert!(pool.await_termination(Duration::from_secs(5)));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_zero_size_fixed_pool_gets_one_worker() {
        let pool = WorkerPool::new_fixed_pool("empty", 0);
        assert_eq!(pool.size(), 1);
    }
}
