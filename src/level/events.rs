//! # Level Events
//!
//! Pipelines never call each other. When one finishes a stage it publishes an
//! event on a typed channel, and whoever cares subscribes: the level wires the
//! load channel to the generation and mesh queues, and an external renderer
//! subscribes to the mesh channel to turn meshes into drawables.
//!
//! A subscriber is either an `mpsc` receiver handed out by
//! [`EventChannel::subscribe`] or a callback registered with
//! [`EventChannel::subscribe_with`]. Callbacks run synchronously on the
//! publishing worker thread and must not block.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::coordinate::Coordinate;
use crate::core::lock;

/// Lifecycle of a chunk's voxel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    /// Voxel data was loaded from a blob or generated.
    DataLoaded(Coordinate),
    /// No blob exists for the chunk; it needs generating.
    DataNotFound(Coordinate),
    /// Voxel data and mesh were saved and dropped from memory.
    DataUnloaded(Coordinate),
}

/// Lifecycle of a chunk's mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshEvent {
    /// A non-empty mesh was newly stored for the chunk.
    MeshReady(Coordinate),
    /// A mesh job for the chunk ran to completion, whatever it produced.
    MeshGenerationFinished(Coordinate),
    /// These chunks left the meshed region. Their meshes are still stored.
    ChunksLeftMeshRegion(Vec<Coordinate>),
}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

enum Subscriber<E> {
    Channel(Sender<E>),
    Callback(Callback<E>),
}

impl<E> Clone for Subscriber<E> {
    fn clone(&self) -> Self {
        match self {
            Subscriber::Channel(sender) => Subscriber::Channel(sender.clone()),
            Subscriber::Callback(callback) => Subscriber::Callback(callback.clone()),
        }
    }
}

/// A broadcast channel for one kind of event.
pub struct EventChannel<E> {
    subscribers: Mutex<Subscribers<E>>,
}

struct Subscribers<E> {
    next_id: u64,
    entries: Vec<(u64, Subscriber<E>)>,
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        EventChannel {
            subscribers: Mutex::new(Subscribers {
                next_id: 0,
                entries: Vec::new(),
            }),
        }
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &lock(&self.subscribers).entries.len())
            .finish()
    }
}

impl<E: Clone + Send + 'static> EventChannel<E> {
    /// Creates a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a receiver that gets every event published from now on.
    ///
    /// Dropping the receiver unsubscribes it at the next publish.
    pub fn subscribe(&self) -> Receiver<E> {
        let (sender, receiver) = channel();
        self.push(Subscriber::Channel(sender));
        receiver
    }

    /// Registers a callback run on the publishing thread for every event.
    pub fn subscribe_with(&self, callback: impl Fn(&E) + Send + Sync + 'static) {
        self.push(Subscriber::Callback(Arc::new(callback)));
    }

    fn push(&self, subscriber: Subscriber<E>) {
        let mut subscribers = lock(&self.subscribers);
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, subscriber));
    }

    /// Delivers `event` to every subscriber.
    pub fn notify(&self, event: E) {
        // the lock is not held while callbacks run, so they may publish or subscribe
        let entries = lock(&self.subscribers).entries.clone();

        let mut disconnected = Vec::new();
        for (id, subscriber) in &entries {
            match subscriber {
                Subscriber::Channel(sender) => {
                    if sender.send(event.clone()).is_err() {
                        disconnected.push(*id);
                    }
                }
                Subscriber::Callback(callback) => callback(&event),
            }
        }

        if !disconnected.is_empty() {
            lock(&self.subscribers)
                .entries
                .retain(|(id, _)| !disconnected.contains(id));
        }
    }

    /// Number of registered subscribers, including receivers dropped since the last publish.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).entries.len()
    }
}

/// The channels a level publishes on.
#[derive(Debug, Default)]
pub struct LevelEvents {
    /// Voxel data lifecycle.
    pub load: EventChannel<LoadEvent>,
    /// Mesh lifecycle.
    pub mesh: EventChannel<MeshEvent>,
}

impl LevelEvents {
    /// Creates the channels with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }
}
