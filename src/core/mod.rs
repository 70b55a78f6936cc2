//! # Core Module
//!
//! Shared concurrency primitives used by the level and the pipelines.
//!
//! ## Key Components
//! - `MtResource`: thread-safe reference-counted resource behind a read-write lock
//! - `lock`: mutex acquisition that survives poisoning
//!
//! Every lock in the crate is taken through these helpers. A lock poisoned by a
//! panicking pipeline job is recovered rather than propagated.

pub mod mt_resource;

pub use mt_resource::MtResource;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
