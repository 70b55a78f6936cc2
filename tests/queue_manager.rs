use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use voxel_streaming::task_management::{InvalidReason, QueueHandler, QueueManager};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Items from 100 fail, items from 200 panic.
const FAILING: u32 = 100;
const PANICKING: u32 = 200;

#[derive(Default)]
struct Recorder {
    runs: Mutex<Vec<u32>>,
    started: Mutex<Option<Sender<u32>>>,
    blocked: Mutex<HashSet<u32>>,
    released: Condvar,
    not_ready: Mutex<HashSet<u32>>,
    invalid: Mutex<HashSet<u32>>,
    dropped: Mutex<Vec<(u32, InvalidReason)>>,
}

impl Recorder {
    fn release(&self, item: u32) {
        self.blocked.lock().unwrap().remove(&item);
        self.released.notify_all();
    }

    fn runs(&self) -> Vec<u32> {
        self.runs.lock().unwrap().clone()
    }

    fn dropped(&self) -> Vec<(u32, InvalidReason)> {
        self.dropped.lock().unwrap().clone()
    }
}

impl QueueHandler for Recorder {
    type Item = u32;
    type Error = String;

    fn name(&self) -> &str {
        "recorder"
    }

    fn is_valid(&self, item: &u32) -> bool {
        !self.invalid.lock().unwrap().contains(item)
    }

    fn is_ready(&self, item: &u32) -> bool {
        !self.not_ready.lock().unwrap().contains(item)
    }

    fn on_invalid(&self, item: u32, reason: InvalidReason) {
        self.dropped.lock().unwrap().push((item, reason));
    }

    fn sort_queue(&self, queue: &mut VecDeque<u32>) {
        queue.make_contiguous().sort();
    }

    fn do_work(&self, item: u32) -> Result<(), String> {
        if let Some(started) = self.started.lock().unwrap().as_ref() {
            let _ = started.send(item);
        }

        let mut blocked = self.blocked.lock().unwrap();
        while blocked.contains(&item) {
            blocked = self.released.wait(blocked).unwrap();
        }
        drop(blocked);

        self.runs.lock().unwrap().push(item);
        if item >= PANICKING {
            panic!("test item {item} panicked");
        }
        if item >= FAILING {
            return Err(format!("test item {item} failed"));
        }
        Ok(())
    }
}

/// A single-slot queue whose item `0` is running and held until released.
fn occupied_queue() -> (QueueManager<Recorder>, Receiver<u32>) {
    let recorder = Recorder::default();
    let (started_tx, started_rx) = channel();
    *recorder.started.lock().unwrap() = Some(started_tx);
    recorder.blocked.lock().unwrap().insert(0);

    let queue = QueueManager::new(recorder, 1, Duration::from_millis(5)).unwrap();
    queue.enqueue([0], true);
    assert_eq!(started_rx.recv_timeout(TIMEOUT), Ok(0));
    (queue, started_rx)
}

#[test]
fn duplicate_enqueues_run_once() {
    let (queue, _started) = occupied_queue();

    assert_eq!(queue.enqueue([5, 5, 5], true), 1);
    assert_eq!(queue.enqueue([5], true), 0);
    assert_eq!(queue.len(), 1);

    queue.handler().release(0);
    assert!(queue.wait_until_idle(TIMEOUT));
    assert_eq!(queue.handler().runs(), vec![0, 5]);
    assert_eq!(queue.stats().enqueued, 2);
}

#[test]
fn dequeue_before_start_prevents_work() {
    let (queue, _started) = occupied_queue();

    queue.enqueue([1, 2], true);
    assert_eq!(queue.dequeue([1]), 1);
    assert!(!queue.contains(&1));
    // not queued, so nothing to mark
    assert_eq!(queue.dequeue([42]), 0);

    queue.handler().release(0);
    assert!(queue.wait_until_idle(TIMEOUT));

    assert_eq!(queue.handler().runs(), vec![0, 2]);
    assert_eq!(queue.handler().dropped(), vec![(1, InvalidReason::Canceled)]);
    assert_eq!(queue.stats().canceled, 1);
}

#[test]
fn dequeue_after_start_has_no_effect() {
    let (queue, _started) = occupied_queue();

    assert_eq!(queue.dequeue([0]), 0);
    queue.handler().release(0);
    assert!(queue.wait_until_idle(TIMEOUT));

    assert_eq!(queue.handler().runs(), vec![0]);
    assert!(queue.handler().dropped().is_empty());
}

#[test]
fn enqueue_revives_an_item_pending_cancellation() {
    let (queue, _started) = occupied_queue();

    queue.enqueue([3], true);
    queue.dequeue([3]);
    assert_eq!(queue.enqueue([3], true), 0);
    assert!(queue.contains(&3));

    queue.handler().release(0);
    assert!(queue.wait_until_idle(TIMEOUT));
    assert_eq!(queue.handler().runs(), vec![0, 3]);
}

#[test]
fn dequeuing_the_last_waiting_item_wakes_idle_waiters() {
    let recorder = Recorder::default();
    recorder.not_ready.lock().unwrap().insert(1);
    // long enough that only a wake-up can end the wait in time
    let queue = QueueManager::new(recorder, 1, Duration::from_secs(3600)).unwrap();
    queue.enqueue([1], true);

    thread::scope(|scope| {
        let (waiting_tx, waiting_rx) = channel();
        let queue = &queue;
        let waiter = scope.spawn(move || {
            waiting_tx.send(()).unwrap();
            let start = Instant::now();
            (queue.wait_until_idle(TIMEOUT), start.elapsed())
        });
        waiting_rx.recv_timeout(TIMEOUT).unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(queue.dequeue([1]), 1);
        let (idle, waited) = waiter.join().unwrap();
        assert!(idle);
        assert!(waited < TIMEOUT / 2, "waited {waited:?}");
    });

    assert!(queue.handler().runs().is_empty());
    assert_eq!(queue.handler().dropped(), vec![(1, InvalidReason::Canceled)]);
}

#[test]
fn backlog_is_served_in_sorted_order() {
    let (queue, _started) = occupied_queue();

    queue.enqueue([9, 3, 7, 1], true);
    queue.handler().release(0);
    assert!(queue.wait_until_idle(TIMEOUT));

    assert_eq!(queue.handler().runs(), vec![0, 1, 3, 7, 9]);
}

#[test]
fn invalid_items_are_rejected_without_work() {
    let recorder = Recorder::default();
    recorder.invalid.lock().unwrap().insert(4);
    let queue = QueueManager::new(recorder, 2, Duration::from_millis(5)).unwrap();

    queue.enqueue([4, 6], true);
    assert!(queue.wait_until_idle(TIMEOUT));

    assert_eq!(queue.handler().runs(), vec![6]);
    assert_eq!(queue.handler().dropped(), vec![(4, InvalidReason::Rejected)]);
    assert_eq!(queue.stats().rejected, 1);
}

#[test]
fn item_waiting_on_readiness_does_not_block_the_rest() {
    let recorder = Recorder::default();
    let (started_tx, started_rx) = channel();
    *recorder.started.lock().unwrap() = Some(started_tx);
    recorder.not_ready.lock().unwrap().insert(1);
    let queue = QueueManager::new(recorder, 1, Duration::from_millis(5)).unwrap();

    queue.enqueue([1, 2], true);
    assert_eq!(started_rx.recv_timeout(TIMEOUT), Ok(2));
    assert!(!queue.wait_until_idle(Duration::from_millis(100)));
    assert_eq!(queue.len(), 1);
    assert!(!queue.handler().runs().contains(&1));

    queue.handler().not_ready.lock().unwrap().remove(&1);
    queue.wake();
    assert_eq!(started_rx.recv_timeout(TIMEOUT), Ok(1));
    assert!(queue.wait_until_idle(TIMEOUT));
    assert_eq!(queue.handler().runs(), vec![2, 1]);
}

#[test]
fn readiness_is_rechecked_without_a_wake() {
    let recorder = Recorder::default();
    recorder.not_ready.lock().unwrap().insert(8);
    let queue = QueueManager::new(recorder, 1, Duration::from_millis(5)).unwrap();

    queue.enqueue([8], true);
    assert!(!queue.wait_until_idle(Duration::from_millis(50)));

    // no wake: the poll interval picks the change up
    queue.handler().not_ready.lock().unwrap().remove(&8);
    assert!(queue.wait_until_idle(TIMEOUT));
    assert_eq!(queue.handler().runs(), vec![8]);
}

#[test]
fn failed_and_panicking_jobs_release_their_slot() {
    let queue = QueueManager::new(Recorder::default(), 1, Duration::from_millis(5)).unwrap();

    queue.enqueue([FAILING, PANICKING, 7], true);
    assert!(queue.wait_until_idle(TIMEOUT));

    let stats = queue.stats();
    assert_eq!(stats.dispatched, 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(queue.running(), 0);

    let mut runs = queue.handler().runs();
    runs.sort();
    assert_eq!(runs, vec![7, FAILING, PANICKING]);
}

#[test]
fn concurrency_never_exceeds_the_cap() {
    let recorder = Recorder::default();
    let (started_tx, started_rx) = channel();
    *recorder.started.lock().unwrap() = Some(started_tx);
    recorder.blocked.lock().unwrap().extend(0..6);
    let queue = QueueManager::new(recorder, 3, Duration::from_millis(5)).unwrap();

    queue.enqueue(0..6, true);
    for _ in 0..3 {
        started_rx.recv_timeout(TIMEOUT).unwrap();
    }
    assert!(started_rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(queue.running(), 3);
    assert_eq!(queue.len(), 3);

    for item in 0..6 {
        queue.handler().release(item);
    }
    assert!(queue.wait_until_idle(TIMEOUT));
    assert_eq!(queue.stats().completed, 6);
}
