//! # Queue Handlers
//!
//! A [`QueueHandler`] is everything a [`QueueManager`](super::QueueManager) needs
//! to know about a kind of work: which items are worth doing, which can start
//! now, how to order the backlog, and the work itself. The engine owns the
//! scheduling; the handler owns the meaning.
//!
//! ## Hook Contract
//! - `is_valid`, `is_ready` and `do_work` are called without any queue lock held
//!   and may take locks of their own.
//! - `sort_queue` is called with the queue lock held. It must not call back into
//!   the same queue.
//! - `on_invalid` is called on the coordinator thread after the item has left
//!   the queue. It may enqueue into other queues, or this one.
//! - Enqueueing an item that is still queued but marked for cancellation clears
//!   the mark. The item stays queued once, and `on_invalid` is never called for
//!   the cancellation.

use std::collections::VecDeque;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Why an item left the queue without being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// The item was dequeued before it started.
    Canceled,
    /// [`QueueHandler::is_valid`] rejected the item.
    Rejected,
}

/// The work a [`QueueManager`](super::QueueManager) schedules.
pub trait QueueHandler: Send + Sync + 'static {
    /// One unit of work. Equal items are deduplicated while queued.
    type Item: Clone + Eq + Hash + Debug + Send + 'static;

    /// Failure of a single item's work.
    type Error: Display + Send + 'static;

    /// Name used for threads and log lines.
    fn name(&self) -> &str;

    /// Whether the item should be worked on at all. Invalid items are removed
    /// and passed to [`on_invalid`](Self::on_invalid) with
    /// [`InvalidReason::Rejected`].
    fn is_valid(&self, _item: &Self::Item) -> bool {
        true
    }

    /// Whether the item can start now. Items that are not ready stay queued and
    /// are re-checked when the queue is woken or the readiness poll interval passes.
    fn is_ready(&self, _item: &Self::Item) -> bool {
        true
    }

    /// Called once for every item removed without being worked on.
    fn on_invalid(&self, _item: Self::Item, _reason: InvalidReason) {}

    /// Reorders the backlog; the front is served first.
    fn sort_queue(&self, _queue: &mut VecDeque<Self::Item>) {}

    /// Does the work for one item. Runs on a pool worker.
    fn do_work(&self, item: Self::Item) -> Result<(), Self::Error>;
}
