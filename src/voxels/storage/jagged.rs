use crate::coordinate::Coordinate;
use crate::error::RangeError;
use crate::voxels::voxel_type::VoxelId;

use super::{StorageKind, VoxelStorage};

/// Nested `x -> y -> z` vectors, each grown only as far as the furthest solid
/// voxel written along it.
///
/// Reads past the end of any row are air. Air writes never grow a row.
#[derive(Debug, Clone, Default)]
pub struct JaggedVoxels {
    bounds: Coordinate,
    points: Vec<Vec<Vec<VoxelId>>>,
    solid_count: usize,
}

impl JaggedVoxels {
    /// Creates an empty storage with no rows allocated.
    pub fn new(bounds: Coordinate) -> Self {
        JaggedVoxels {
            bounds,
            points: Vec::new(),
            solid_count: 0,
        }
    }

    fn value_at(&self, x: usize, y: usize, z: usize) -> VoxelId {
        self.points
            .get(x)
            .and_then(|column| column.get(y))
            .and_then(|row| row.get(z))
            .copied()
            .unwrap_or(0)
    }
}

/// Grows `row` so that `index` is addressable.
fn grow_to<T: Default + Clone>(row: &mut Vec<T>, index: usize) {
    if row.len() <= index {
        row.resize(index + 1, T::default());
    }
}

impl VoxelStorage for JaggedVoxels {
    fn bounds(&self) -> Coordinate {
        self.bounds
    }

    fn get(&self, location: Coordinate) -> Result<VoxelId, RangeError> {
        self.check_bounds(location)?;
        Ok(self.value_at(location.x as usize, location.y as usize, location.z as usize))
    }

    fn set(&mut self, location: Coordinate, voxel: VoxelId) -> Result<(), RangeError> {
        self.check_bounds(location)?;
        let (x, y, z) = (location.x as usize, location.y as usize, location.z as usize);
        let previous = self.value_at(x, y, z);

        if voxel == 0 {
            // nothing to clear if the row never grew this far
            if previous != 0 {
                self.points[x][y][z] = 0;
                self.solid_count -= 1;
            }
            return Ok(());
        }

        grow_to(&mut self.points, x);
        grow_to(&mut self.points[x], y);
        grow_to(&mut self.points[x][y], z);
        self.points[x][y][z] = voxel;
        if previous == 0 {
            self.solid_count += 1;
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn is_full(&self) -> bool {
        self.solid_count == self.bounds.volume()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Jagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_grow_only_to_the_written_voxel() {
        let mut voxels = JaggedVoxels::new(Coordinate::splat(16));
        voxels.set(Coordinate::new(2, 3, 4), 1).unwrap();

        assert_eq!(voxels.points.len(), 3);
        assert!(voxels.points[0].is_empty());
        assert_eq!(voxels.points[2].len(), 4);
        assert_eq!(voxels.points[2][3].len(), 5);
        assert_eq!(voxels.get(Coordinate::new(15, 15, 15)), Ok(0));
    }

    #[test]
    fn air_write_past_the_end_allocates_nothing() {
        let mut voxels = JaggedVoxels::new(Coordinate::splat(16));
        voxels.set(Coordinate::new(10, 10, 10), 0).unwrap();
        assert!(voxels.points.is_empty());
    }
}
