use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource with read-write locking.
///
/// Chunk voxel data lives in these: the level's chunk storage keeps one handle,
/// every [`Chunk`](crate::voxels::chunk::Chunk) view built over the chunk keeps
/// another, and writes through any of them land in the same data.
///
/// # Examples
///
/// ```
/// use voxel_streaming::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let shared = counter.clone();
/// *shared.get_mut() += 1;
/// assert_eq!(*counter.get(), 1);
/// ```
pub struct MtResource<T: ?Sized + Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Wraps `resource` in a new shared container.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }
}

impl<T: ?Sized + Send + Sync> MtResource<T> {
    /// Returns a read guard. Concurrent readers do not block each other.
    ///
    /// A lock poisoned by a panicking writer is recovered rather than re-panicking.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns an exclusive write guard.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if both handles point at the same resource.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T: ?Sized + Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: ?Sized + Send + Sync> fmt::Debug for MtResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MtResource")
            .field("strong_count", &Arc::strong_count(&self.resource))
            .finish()
    }
}
