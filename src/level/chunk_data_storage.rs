use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::coordinate::{ChunkKey, Coordinate};
use crate::core::lock;
use crate::error::ChunkKeyError;
use crate::mesh::Mesh;
use crate::voxels::chunk::VoxelHandle;

/// The level's chunk data: one map of voxel handles and one of meshes, keyed by
/// [`ChunkKey`].
///
/// Each map has its own lock and every method takes it for a single lookup or
/// mutation, so check-then-insert sequences across two calls are not atomic.
/// Use [`insert_voxels`](Self::insert_voxels) and
/// [`insert_mesh_if_absent`](Self::insert_mesh_if_absent) where a race matters.
#[derive(Debug, Default)]
pub struct ChunkDataStorage {
    voxels: Mutex<HashMap<ChunkKey, VoxelHandle>>,
    meshes: Mutex<HashMap<ChunkKey, Arc<Mesh>>>,
}

impl ChunkDataStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// The voxel handle stored for a chunk.
    pub fn voxels(&self, location: Coordinate) -> Option<VoxelHandle> {
        let key = ChunkKey::new(location).ok()?;
        lock(&self.voxels).get(&key).cloned()
    }

    /// Stores voxels for a chunk unless some are already present.
    ///
    /// Returns false, leaving the stored handle untouched, if the chunk was loaded.
    pub fn insert_voxels(&self, location: Coordinate, voxels: VoxelHandle) -> Result<bool, ChunkKeyError> {
        let key = ChunkKey::new(location)?;
        let mut map = lock(&self.voxels);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, voxels);
        Ok(true)
    }

    /// Drops the voxels of a chunk, returning them.
    pub fn remove_voxels(&self, location: Coordinate) -> Option<VoxelHandle> {
        let key = ChunkKey::new(location).ok()?;
        lock(&self.voxels).remove(&key)
    }

    /// True if voxels are stored for the chunk.
    pub fn has_voxels(&self, location: Coordinate) -> bool {
        ChunkKey::new(location).is_ok_and(|key| lock(&self.voxels).contains_key(&key))
    }

    /// True if voxels are stored for every chunk in `locations`, checked under
    /// a single lock.
    pub fn all_have_voxels(&self, locations: impl IntoIterator<Item = Coordinate>) -> bool {
        let map = lock(&self.voxels);
        locations
            .into_iter()
            .all(|location| ChunkKey::new(location).is_ok_and(|key| map.contains_key(&key)))
    }

    /// The mesh stored for a chunk.
    pub fn mesh(&self, location: Coordinate) -> Option<Arc<Mesh>> {
        let key = ChunkKey::new(location).ok()?;
        lock(&self.meshes).get(&key).cloned()
    }

    /// Stores a mesh unless one is already present. Returns true if stored.
    pub fn insert_mesh_if_absent(&self, location: Coordinate, mesh: Arc<Mesh>) -> Result<bool, ChunkKeyError> {
        let key = ChunkKey::new(location)?;
        let mut map = lock(&self.meshes);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, mesh);
        Ok(true)
    }

    /// Drops the mesh of a chunk, returning it.
    pub fn remove_mesh(&self, location: Coordinate) -> Option<Arc<Mesh>> {
        let key = ChunkKey::new(location).ok()?;
        lock(&self.meshes).remove(&key)
    }

    /// Number of chunks with voxels in memory.
    pub fn loaded_count(&self) -> usize {
        lock(&self.voxels).len()
    }

    /// Number of stored meshes.
    pub fn mesh_count(&self) -> usize {
        lock(&self.meshes).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::storage::StorageKind;

    fn handle() -> VoxelHandle {
        VoxelHandle::new(StorageKind::Flat.create(Coordinate::splat(2)))
    }

    #[test]
    fn second_voxel_insert_keeps_the_first_handle() {
        let storage = ChunkDataStorage::new();
        let first = handle();
        assert_eq!(storage.insert_voxels(Coordinate::ONE, first.clone()), Ok(true));
        assert_eq!(storage.insert_voxels(Coordinate::ONE, handle()), Ok(false));

        let stored = storage.voxels(Coordinate::ONE).unwrap();
        assert!(stored.ptr_eq(&first));
    }

    #[test]
    fn meshes_are_stored_once() {
        let storage = ChunkDataStorage::new();
        assert_eq!(storage.insert_mesh_if_absent(Coordinate::ZERO, Arc::new(Mesh::new())), Ok(true));
        assert_eq!(storage.insert_mesh_if_absent(Coordinate::ZERO, Arc::new(Mesh::new())), Ok(false));
        assert_eq!(storage.mesh_count(), 1);
        assert!(storage.remove_mesh(Coordinate::ZERO).is_some());
        assert!(storage.mesh(Coordinate::ZERO).is_none());
    }

    #[test]
    fn unkeyable_coordinates_are_rejected_on_insert_and_absent_on_read() {
        let storage = ChunkDataStorage::new();
        let far = Coordinate::new(ChunkKey::MAX_AXIS + 1, 0, 0);
        assert!(storage.insert_voxels(far, handle()).is_err());
        assert!(storage.voxels(far).is_none());
        assert!(!storage.has_voxels(far));
    }
}
