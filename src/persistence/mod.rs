//! # Persistence
//!
//! Chunk voxel data is saved as an opaque blob keyed by `(seed, chunk coordinate)`.
//! The pipelines only ever talk to a [`ChunkBlobStore`]; what a blob contains is
//! decided by [`encode_voxels`] and [`decode_voxels`].
//!
//! ## Blob Format
//!
//! A blob is a JSON-serialized [`VoxelBlob`]: the storage bounds plus a run-length
//! encoding of the voxel ids in linear order (x fastest, then y, then z). Chunks
//! are mostly long runs of air or stone, so this stays small without a binary
//! format.

mod file_store;
mod memory_store;

pub use file_store::{FileBlobStore, BLOB_EXTENSION};
pub use memory_store::MemoryBlobStore;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::{PersistenceError, RangeError};
use crate::voxels::storage::VoxelStorage;
use crate::voxels::voxel_type::VoxelId;

/// Key/value store of persisted chunk blobs.
pub trait ChunkBlobStore: Send + Sync {
    /// True if a blob is stored for the chunk.
    fn exists(&self, seed: i32, location: Coordinate) -> bool;

    /// Reads the blob for the chunk, failing with [`PersistenceError::Missing`] if none exists.
    fn read(&self, seed: i32, location: Coordinate) -> Result<Vec<u8>, PersistenceError>;

    /// Stores the blob for the chunk, replacing any previous one.
    fn write(&self, seed: i32, location: Coordinate, blob: &[u8]) -> Result<(), PersistenceError>;
}

/// Serialized form of one chunk's voxels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelBlob {
    /// Bounds of the storage the blob was taken from.
    pub bounds: Coordinate,
    /// `(voxel id, run length)` pairs covering every location in linear order.
    pub runs: Vec<(VoxelId, u32)>,
}

impl VoxelBlob {
    /// Run-length encodes every voxel of `storage`.
    pub fn from_storage(storage: &dyn VoxelStorage) -> Result<Self, PersistenceError> {
        let bounds = storage.bounds();
        let mut runs: Vec<(VoxelId, u32)> = Vec::new();
        for location in linear_locations(bounds) {
            let voxel = storage.get(location)?;
            match runs.last_mut() {
                Some((id, length)) if *id == voxel => *length += 1,
                _ => runs.push((voxel, 1)),
            }
        }
        Ok(VoxelBlob { bounds, runs })
    }

    /// Writes the blob's voxels into `storage`, which must have the same bounds.
    ///
    /// Air runs are skipped, so a freshly created storage stays empty when the
    /// blob holds only air.
    pub fn apply_to(&self, storage: &mut dyn VoxelStorage) -> Result<(), PersistenceError> {
        let expected = storage.bounds();
        if expected != self.bounds {
            return Err(PersistenceError::BoundsMismatch {
                expected,
                found: self.bounds,
            });
        }

        let mut locations = linear_locations(self.bounds);
        for &(voxel, length) in &self.runs {
            for _ in 0..length {
                let location = locations.next().ok_or(RangeError {
                    location: self.bounds,
                    bounds: self.bounds,
                })?;
                if voxel != 0 {
                    storage.set(location, voxel)?;
                }
            }
        }
        Ok(())
    }
}

/// Locations of `[0, bounds)` in linear storage order, x fastest.
fn linear_locations(bounds: Coordinate) -> impl Iterator<Item = Coordinate> {
    Coordinate::ZERO.until(bounds)
}

/// Serializes the voxels of `storage` into a blob.
pub fn encode_voxels(storage: &dyn VoxelStorage) -> Result<Vec<u8>, PersistenceError> {
    let blob = VoxelBlob::from_storage(storage)?;
    Ok(serde_json::to_vec(&blob)?)
}

/// Fills `storage` from a blob produced by [`encode_voxels`].
pub fn decode_voxels(bytes: &[u8], storage: &mut dyn VoxelStorage) -> Result<(), PersistenceError> {
    let blob: VoxelBlob = serde_json::from_slice(bytes)?;
    blob.apply_to(storage)
}
