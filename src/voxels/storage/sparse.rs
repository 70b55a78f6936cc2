use std::collections::HashMap;

use crate::coordinate::Coordinate;
use crate::error::RangeError;
use crate::voxels::voxel_type::VoxelId;

use super::{StorageKind, VoxelStorage};

/// A map from location to voxel id holding only solid voxels.
#[derive(Debug, Clone, Default)]
pub struct SparseVoxels {
    bounds: Coordinate,
    points: HashMap<Coordinate, VoxelId>,
    written: bool,
}

impl SparseVoxels {
    /// Creates an empty map-backed storage.
    pub fn new(bounds: Coordinate) -> Self {
        SparseVoxels {
            bounds,
            points: HashMap::new(),
            written: false,
        }
    }

    /// Number of solid voxels held.
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl VoxelStorage for SparseVoxels {
    fn bounds(&self) -> Coordinate {
        self.bounds
    }

    fn get(&self, location: Coordinate) -> Result<VoxelId, RangeError> {
        self.check_bounds(location)?;
        Ok(self.points.get(&location).copied().unwrap_or(0))
    }

    fn set(&mut self, location: Coordinate, voxel: VoxelId) -> Result<(), RangeError> {
        self.check_bounds(location)?;
        if voxel == 0 {
            self.points.remove(&location);
        } else {
            self.points.insert(location, voxel);
            self.written = true;
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        !self.written
    }

    fn is_full(&self) -> bool {
        self.points.len() == self.bounds.volume()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Sparse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_solid_voxels_take_entries() {
        let mut voxels = SparseVoxels::new(Coordinate::splat(4));
        voxels.set(Coordinate::new(0, 0, 0), 0).unwrap();
        voxels.set(Coordinate::new(1, 0, 0), 2).unwrap();
        voxels.set(Coordinate::new(2, 0, 0), 3).unwrap();
        voxels.set(Coordinate::new(2, 0, 0), 0).unwrap();
        assert_eq!(voxels.len(), 1);
    }
}
