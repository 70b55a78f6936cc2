//! # Worker Pool
//!
//! A fixed set of worker threads, each fed through its own channel. Jobs are
//! handed out round-robin, preferring workers with fewer than
//! [`MAX_JOBS_IN_FLIGHT`] jobs; when every worker is busy the job joins the
//! least-loaded worker's channel and runs as soon as that worker frees up.
//!
//! The pool does no admission control of its own. The
//! [`QueueManager`](super::QueueManager) caps running jobs before they get here.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{error, trace};

/// A unit of work for a pool worker.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Preferred number of jobs per worker at once.
pub const MAX_JOBS_IN_FLIGHT: usize = 1;

/// A channel to one worker thread.
#[derive(Debug)]
struct WorkerChannel {
    job_sender: Option<Sender<Job>>,
    jobs_in_flight: Arc<AtomicUsize>,
    worker: Option<JoinHandle<()>>,
}

/// Pool of named worker threads.
#[derive(Debug)]
pub struct WorkerPool {
    name: String,
    channels: Vec<WorkerChannel>,
    current_channel: usize,
}

impl WorkerPool {
    /// Spawns `num_workers` threads named `{name}-worker-{i}`.
    pub fn new(name: &str, num_workers: usize) -> io::Result<Self> {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (job_tx, job_rx) = channel::<Job>();
            let jobs_in_flight = Arc::new(AtomicUsize::new(0));
            let worker_in_flight = jobs_in_flight.clone();

            let worker = thread::Builder::new()
                .name(format!("{name}-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        job();
                        worker_in_flight.fetch_sub(1, Ordering::AcqRel);
                    }
                })?;

            channels.push(WorkerChannel {
                job_sender: Some(job_tx),
                jobs_in_flight,
                worker: Some(worker),
            });
        }

        trace!("Spawned {num_workers} workers for {name}");

        Ok(WorkerPool {
            name: name.to_string(),
            channels,
            current_channel: 0,
        })
    }

    /// Number of worker threads.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// True if the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Jobs sent to workers that have not finished yet.
    pub fn jobs_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.jobs_in_flight.load(Ordering::Acquire))
            .sum()
    }

    /// Picks the next worker round-robin, skipping workers at
    /// [`MAX_JOBS_IN_FLIGHT`], or the least-loaded one if all are.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let count = self.channels.len();
        let load = |index: usize| self.channels[index].jobs_in_flight.load(Ordering::Acquire);

        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&index| load(index) < MAX_JOBS_IN_FLIGHT)
            .or_else(|| (0..count).min_by_key(|&index| load(index)))
    }

    /// Sends `job` to a worker. Returns the job back if no worker can take it.
    pub fn execute(&mut self, job: Job) -> Result<(), Job> {
        let Some(index) = self.find_available_channel() else {
            return Err(job);
        };

        let channel = &self.channels[index];
        let Some(sender) = &channel.job_sender else {
            return Err(job);
        };

        channel.jobs_in_flight.fetch_add(1, Ordering::AcqRel);
        match sender.send(job) {
            Ok(()) => {
                self.current_channel = (index + 1) % self.channels.len();
                Ok(())
            }
            Err(failed) => {
                channel.jobs_in_flight.fetch_sub(1, Ordering::AcqRel);
                Err(failed.0)
            }
        }
    }

    /// Closes every channel and waits for the workers to finish the jobs they
    /// already received.
    pub fn join(&mut self) {
        for channel in &mut self.channels {
            channel.job_sender.take();
        }
        for channel in &mut self.channels {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    error!("A {} worker thread panicked", self.name);
                }
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join();
    }
}
