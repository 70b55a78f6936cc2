//! # Task Management System
//!
//! A [`QueueManager`] runs an open-ended backlog of work items with bounded
//! parallelism while the backlog keeps changing underneath it: items are
//! enqueued and canceled from other threads at any time.
//!
//! ## Architecture Overview
//!
//! - `QueueManager`: owns the backlog and one coordinator thread
//! - `QueueHandler`: the pluggable policy (validity, readiness, order, work)
//! - `WorkerPool`: the threads child jobs run on
//! - `QueueHandle`: a weak, cloneable reference for enqueueing from callbacks
//!
//! ## Item Lifecycle
//! 1. `enqueue` adds items not already queued and sorts the backlog
//! 2. The coordinator scans the backlog front to back. Canceled items are
//!    removed first; invalid items are removed and reported as rejected
//! 3. Every ready item is dispatched while fewer than `max_concurrency` jobs run.
//!    Items that are not ready stay where they are without blocking the rest
//! 4. The job runs the handler's `do_work` exactly once and releases its slot
//!    on completion, failure or panic
//!
//! ## Waking
//! The coordinator sleeps on a condition variable. Enqueue, dequeue, job
//! completion and [`QueueManager::wake`] all wake it. While items are waiting on
//! readiness it also wakes every `readiness_poll_interval`, since readiness can
//! change without the queue hearing about it.
//!
//! ## Example Usage
//! ```rust
//! use std::time::Duration;
//! use voxel_streaming::task_management::{QueueHandler, QueueManager};
//!
//! struct Printer;
//!
//! impl QueueHandler for Printer {
//!     type Item = u32;
//!     type Error = String;
//!
//!     fn name(&self) -> &str {
//!         "printer"
//!     }
//!
//!     fn do_work(&self, item: u32) -> Result<(), String> {
//!         log::info!("item {item}");
//!         Ok(())
//!     }
//! }
//!
//! let queue = QueueManager::new(Printer, 4, Duration::from_millis(10)).unwrap();
//! queue.enqueue([1, 2, 3], true);
//! assert!(queue.wait_until_idle(Duration::from_secs(5)));
//! assert_eq!(queue.stats().completed, 3);
//! ```

pub mod queue_handler;
pub mod worker_pool;

pub use queue_handler::{InvalidReason, QueueHandler};
pub use worker_pool::WorkerPool;

use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::io;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, trace};
use web_time::Instant;

use crate::core::lock;

/// Counters of everything a queue has done since it was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items admitted by `enqueue`.
    pub enqueued: u64,
    /// Items handed to a worker.
    pub dispatched: u64,
    /// Jobs whose work succeeded.
    pub completed: u64,
    /// Jobs whose work returned an error or panicked.
    pub failed: u64,
    /// Items removed by `dequeue` before they started.
    pub canceled: u64,
    /// Items removed because the handler found them invalid.
    pub rejected: u64,
    /// Total time spent inside `do_work`.
    pub work_time: Duration,
}

struct QueueState<T> {
    queue: VecDeque<T>,
    queued: HashSet<T>,
    canceled: HashSet<T>,
    running: usize,
    shutdown: bool,
    version: u64,
    stats: QueueStats,
}

impl<T: Clone + Eq + std::hash::Hash> QueueState<T> {
    fn new() -> Self {
        QueueState {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            canceled: HashSet::new(),
            running: 0,
            shutdown: false,
            version: 0,
            stats: QueueStats::default(),
        }
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.running == 0
    }

    /// Removes every item marked for cancellation from the backlog.
    fn drain_canceled(&mut self) -> Vec<T> {
        if self.canceled.is_empty() {
            return Vec::new();
        }
        let canceled = mem::take(&mut self.canceled);
        self.queue.retain(|item| !canceled.contains(item));
        for item in &canceled {
            self.queued.remove(item);
        }
        self.stats.canceled += canceled.len() as u64;
        canceled.into_iter().collect()
    }

    fn remove_queued(&mut self, item: &T) -> bool {
        if !self.queued.remove(item) {
            return false;
        }
        if let Some(index) = self.queue.iter().position(|queued| queued == item) {
            self.queue.remove(index);
        }
        true
    }
}

struct Shared<H: QueueHandler> {
    handler: H,
    state: Mutex<QueueState<H::Item>>,
    changed: Condvar,
    max_concurrency: usize,
    poll_interval: Duration,
}

impl<H: QueueHandler> Shared<H> {
    fn name(&self) -> &str {
        self.handler.name()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<H::Item>> {
        lock(&self.state)
    }

    /// Records a state change and wakes the coordinator and any idle waiters.
    fn touch(&self, state: &mut QueueState<H::Item>) {
        state.version = state.version.wrapping_add(1);
        self.changed.notify_all();
    }

    fn enqueue(&self, items: impl IntoIterator<Item = H::Item>, sort: bool) -> usize {
        let mut state = self.lock();
        if state.shutdown {
            return 0;
        }

        let mut added = 0;
        for item in items {
            // still queued; dropping the mark keeps it
            if state.canceled.remove(&item) {
                continue;
            }
            if state.queued.insert(item.clone()) {
                state.queue.push_back(item);
                added += 1;
            }
        }
        state.stats.enqueued += added as u64;

        if sort && added > 0 {
            self.handler.sort_queue(&mut state.queue);
        }
        self.touch(&mut state);
        added
    }

    fn dequeue(&self, items: impl IntoIterator<Item = H::Item>) -> usize {
        let mut state = self.lock();
        let mut marked = 0;
        for item in items {
            if state.queued.contains(&item) && state.canceled.insert(item) {
                marked += 1;
            }
        }
        if marked > 0 {
            self.touch(&mut state);
        }
        marked
    }

    fn sort(&self) {
        let mut state = self.lock();
        self.handler.sort_queue(&mut state.queue);
        self.touch(&mut state);
    }

    fn wake(&self) {
        let mut state = self.lock();
        self.touch(&mut state);
    }

    fn wait_until_idle(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .changed
            .wait_timeout_while(state, timeout, |state| !state.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
        state.is_idle()
    }
}

/// Releases a concurrency slot when dropped, whether the job ran, failed,
/// panicked or never reached a worker.
struct SlotGuard<H: QueueHandler> {
    shared: Arc<Shared<H>>,
}

impl<H: QueueHandler> Drop for SlotGuard<H> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.running = state.running.saturating_sub(1);
        self.shared.touch(&mut state);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Runs one dispatched item on a pool worker.
fn run_item<H: QueueHandler>(slot: SlotGuard<H>, item: H::Item) {
    let shared = &slot.shared;
    debug!("{}: working on {:?}", shared.name(), item);

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| shared.handler.do_work(item.clone())));
    let elapsed = started.elapsed();

    let succeeded = match outcome {
        Ok(Ok(())) => {
            debug!("{}: finished {:?} in {:?}", shared.name(), item, elapsed);
            true
        }
        Ok(Err(err)) => {
            error!("{}: work on {:?} failed: {}", shared.name(), item, err);
            false
        }
        Err(payload) => {
            error!(
                "{}: work on {:?} panicked: {}",
                shared.name(),
                item,
                panic_message(payload.as_ref())
            );
            false
        }
    };

    let mut state = shared.lock();
    if succeeded {
        state.stats.completed += 1;
    } else {
        state.stats.failed += 1;
    }
    state.stats.work_time += elapsed;
    // the slot guard drops after this and wakes the coordinator
}

/// The coordinator loop. Exits on shutdown, then waits for the pool to drain.
fn coordinate<H: QueueHandler>(shared: Arc<Shared<H>>, mut pool: WorkerPool) {
    loop {
        let mut state = shared.lock();
        if state.shutdown {
            break;
        }

        let canceled = state.drain_canceled();
        if !canceled.is_empty() {
            // the backlog shrank; idle waiters must re-check
            shared.touch(&mut state);
            drop(state);
            trace!("{}: dropping {} canceled items", shared.name(), canceled.len());
            for item in canceled {
                shared.handler.on_invalid(item, InvalidReason::Canceled);
            }
            continue;
        }

        if state.queue.is_empty() || state.running >= shared.max_concurrency {
            drop(shared.changed.wait(state).unwrap_or_else(PoisonError::into_inner));
            continue;
        }

        let snapshot: Vec<H::Item> = state.queue.iter().cloned().collect();
        let seen = state.version;
        drop(state);

        if scan(&shared, &mut pool, snapshot) {
            continue;
        }

        // nothing could start; sleep until something changes or readiness may have
        let state = shared.lock();
        if state.version == seen && !state.shutdown {
            drop(
                shared
                    .changed
                    .wait_timeout(state, shared.poll_interval)
                    .unwrap_or_else(PoisonError::into_inner),
            );
        }
    }

    trace!("{}: coordinator stopping", shared.name());
    pool.join();
}

/// One pass over the backlog. Returns true if any item left the queue.
fn scan<H: QueueHandler>(shared: &Arc<Shared<H>>, pool: &mut WorkerPool, snapshot: Vec<H::Item>) -> bool {
    let mut progressed = false;

    for item in snapshot {
        {
            let state = shared.lock();
            if state.shutdown || state.running >= shared.max_concurrency {
                break;
            }
        }

        if !shared.handler.is_valid(&item) {
            let removed = {
                let mut state = shared.lock();
                let removed = !state.canceled.contains(&item) && state.remove_queued(&item);
                if removed {
                    state.stats.rejected += 1;
                    shared.touch(&mut state);
                }
                removed
            };
            if removed {
                trace!("{}: rejected {:?}", shared.name(), item);
                shared.handler.on_invalid(item, InvalidReason::Rejected);
                progressed = true;
            }
            continue;
        }

        if !shared.handler.is_ready(&item) {
            continue;
        }

        {
            let mut state = shared.lock();
            if state.shutdown || state.running >= shared.max_concurrency {
                break;
            }
            if state.canceled.contains(&item) || !state.remove_queued(&item) {
                continue;
            }
            state.running += 1;
            state.stats.dispatched += 1;
            shared.touch(&mut state);
        }

        let slot = SlotGuard {
            shared: shared.clone(),
        };
        let job_item = item.clone();
        if pool.execute(Box::new(move || run_item(slot, job_item))).is_err() {
            // the returned job is dropped here, which releases its slot
            error!("{}: no worker accepted {:?}; dropping it", shared.name(), item);
        }
        progressed = true;
    }

    progressed
}

/// A bounded-concurrency work queue driven by a [`QueueHandler`].
///
/// Dropping the manager shuts it down.
pub struct QueueManager<H: QueueHandler> {
    shared: Arc<Shared<H>>,
    coordinator: Mutex<Option<JoinHandle<()>>>,
}

impl<H: QueueHandler> QueueManager<H> {
    /// Starts a queue with `max_concurrency` workers and its coordinator thread.
    pub fn new(handler: H, max_concurrency: usize, poll_interval: Duration) -> io::Result<Self> {
        let max_concurrency = max_concurrency.max(1);
        let name = handler.name().to_string();
        let pool = WorkerPool::new(&name, max_concurrency)?;

        let shared = Arc::new(Shared {
            handler,
            state: Mutex::new(QueueState::new()),
            changed: Condvar::new(),
            max_concurrency,
            poll_interval,
        });

        let coordinator_shared = shared.clone();
        let coordinator = thread::Builder::new()
            .name(format!("{name}-coordinator"))
            .spawn(move || coordinate(coordinator_shared, pool))?;

        Ok(QueueManager {
            shared,
            coordinator: Mutex::new(Some(coordinator)),
        })
    }

    /// The handler's name.
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// The handler driving this queue.
    pub fn handler(&self) -> &H {
        &self.shared.handler
    }

    /// Adds items that are not already queued and returns how many were added.
    ///
    /// An item that is queued but marked for cancellation loses the mark
    /// instead of being added twice. With `sort`, the backlog is re-sorted.
    pub fn enqueue(&self, items: impl IntoIterator<Item = H::Item>, sort: bool) -> usize {
        self.shared.enqueue(items, sort)
    }

    /// Marks queued items for cancellation and returns how many were marked.
    ///
    /// Items already handed to a worker are unaffected.
    pub fn dequeue(&self, items: impl IntoIterator<Item = H::Item>) -> usize {
        self.shared.dequeue(items)
    }

    /// Re-sorts the backlog with the handler's order.
    pub fn sort(&self) {
        self.shared.sort()
    }

    /// Wakes the coordinator to re-check readiness now.
    pub fn wake(&self) {
        self.shared.wake()
    }

    /// Items waiting in the backlog, including those marked for cancellation.
    pub fn len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// True if the backlog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `item` is in the backlog and not marked for cancellation.
    pub fn contains(&self, item: &H::Item) -> bool {
        let state = self.shared.lock();
        state.queued.contains(item) && !state.canceled.contains(item)
    }

    /// Jobs currently running.
    pub fn running(&self) -> usize {
        self.shared.lock().running
    }

    /// True if nothing is queued or running.
    pub fn is_idle(&self) -> bool {
        self.shared.lock().is_idle()
    }

    /// A snapshot of the counters.
    pub fn stats(&self) -> QueueStats {
        self.shared.lock().stats
    }

    /// Blocks until the queue is idle or `timeout` passes. Returns true if idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.shared.wait_until_idle(timeout)
    }

    /// A weak handle for enqueueing from callbacks without keeping the queue alive.
    pub fn handle(&self) -> QueueHandle<H> {
        QueueHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Stops the coordinator and waits for running jobs to finish. Items still
    /// queued are dropped. Calling it again does nothing.
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            self.shared.touch(&mut state);
        }

        let coordinator = lock(&self.coordinator).take();
        if let Some(coordinator) = coordinator {
            if coordinator.join().is_err() {
                error!("{}: coordinator thread panicked", self.name());
            }
            debug!("{}: shut down", self.name());
        }
    }
}

impl<H: QueueHandler> Drop for QueueManager<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A weak reference to a [`QueueManager`]. Every call is a no-op once the
/// queue is gone.
pub struct QueueHandle<H: QueueHandler> {
    shared: Weak<Shared<H>>,
}

impl<H: QueueHandler> Clone for QueueHandle<H> {
    fn clone(&self) -> Self {
        QueueHandle {
            shared: self.shared.clone(),
        }
    }
}

impl<H: QueueHandler> QueueHandle<H> {
    /// See [`QueueManager::enqueue`].
    pub fn enqueue(&self, items: impl IntoIterator<Item = H::Item>, sort: bool) -> usize {
        self.shared
            .upgrade()
            .map_or(0, |shared| shared.enqueue(items, sort))
    }

    /// See [`QueueManager::dequeue`].
    pub fn dequeue(&self, items: impl IntoIterator<Item = H::Item>) -> usize {
        self.shared.upgrade().map_or(0, |shared| shared.dequeue(items))
    }

    /// See [`QueueManager::wake`].
    pub fn wake(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.wake();
        }
    }
}
