use crate::coordinate::Coordinate;
use crate::error::RangeError;
use crate::voxels::voxel_type::VoxelId;

use super::{linear_index, StorageKind, VoxelStorage};

/// Dense storage: one byte per voxel in a single row-major vector.
///
/// The vector is only allocated on the first non-air write, so chunks of pure
/// air cost nothing beyond the struct itself.
#[derive(Debug, Clone)]
pub struct FlatVoxels {
    bounds: Coordinate,
    points: Option<Vec<VoxelId>>,
    solid_count: usize,
}

impl FlatVoxels {
    /// Creates an empty, unallocated storage.
    pub fn new(bounds: Coordinate) -> Self {
        FlatVoxels {
            bounds,
            points: None,
            solid_count: 0,
        }
    }
}

impl VoxelStorage for FlatVoxels {
    fn bounds(&self) -> Coordinate {
        self.bounds
    }

    fn get(&self, location: Coordinate) -> Result<VoxelId, RangeError> {
        self.check_bounds(location)?;
        Ok(self
            .points
            .as_ref()
            .map_or(0, |points| points[linear_index(location, self.bounds)]))
    }

    fn set(&mut self, location: Coordinate, voxel: VoxelId) -> Result<(), RangeError> {
        self.check_bounds(location)?;
        if self.points.is_none() && voxel == 0 {
            return Ok(());
        }
        let volume = self.bounds.volume();
        let points = self.points.get_or_insert_with(|| vec![0; volume]);

        let slot = &mut points[linear_index(location, self.bounds)];
        match (*slot != 0, voxel != 0) {
            (false, true) => self.solid_count += 1,
            (true, false) => self.solid_count -= 1,
            _ => {}
        }
        *slot = voxel;
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.points.is_none()
    }

    fn is_full(&self) -> bool {
        self.solid_count == self.bounds.volume()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Flat
    }
}
