use std::collections::HashMap;
use std::sync::Mutex;

use crate::coordinate::Coordinate;
use crate::core::lock;
use crate::error::PersistenceError;

use super::ChunkBlobStore;

/// Keeps blobs in memory, for tests and worlds that are never saved to disk.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<(i32, Coordinate), Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs across all seeds.
    pub fn len(&self) -> usize {
        lock(&self.blobs).len()
    }

    /// True if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.blobs).is_empty()
    }
}

impl ChunkBlobStore for MemoryBlobStore {
    fn exists(&self, seed: i32, location: Coordinate) -> bool {
        lock(&self.blobs).contains_key(&(seed, location))
    }

    fn read(&self, seed: i32, location: Coordinate) -> Result<Vec<u8>, PersistenceError> {
        lock(&self.blobs)
            .get(&(seed, location))
            .cloned()
            .ok_or(PersistenceError::Missing { seed, location })
    }

    fn write(&self, seed: i32, location: Coordinate, blob: &[u8]) -> Result<(), PersistenceError> {
        lock(&self.blobs).insert((seed, location), blob.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_replaces_previous_blob() {
        let store = MemoryBlobStore::new();
        store.write(0, Coordinate::ONE, b"first").unwrap();
        store.write(0, Coordinate::ONE, b"second").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(0, Coordinate::ONE).unwrap(), b"second");
    }
}
