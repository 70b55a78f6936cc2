//! Bit-packed voxel storage.
//!
//! Two structures kept in lockstep:
//! - `solid`: one bit per location, set where the voxel is not air
//! - `materials`: the ids of the solid voxels only, in location order
//!
//! The material of a solid voxel sits at the index equal to the number of set
//! bits before its location. For a grid `0110 1000` the storage holds
//! `solid = 01101000`, `materials = [a, b, c]`.
//!
//! ### Performance Characteristics
//! - **Solidity check**: O(1), a single bit
//! - **Material lookup**: O(n / word size), a popcount over the preceding bits
//! - **Write that changes solidity**: O(m), shifts the material list
//! - **Memory**: 1 bit per air voxel plus 1 byte per solid voxel

use bitvec::prelude::BitVec;

use crate::coordinate::Coordinate;
use crate::error::RangeError;
use crate::voxels::voxel_type::VoxelId;

use super::{linear_index, StorageKind, VoxelStorage};

/// Solidity bitset plus a compacted material list.
#[derive(Debug, Clone)]
pub struct PackedVoxels {
    bounds: Coordinate,
    /// Allocated on the first solid write.
    solid: Option<BitVec>,
    materials: Vec<VoxelId>,
}

impl PackedVoxels {
    /// Creates an empty storage with nothing allocated.
    pub fn new(bounds: Coordinate) -> Self {
        PackedVoxels {
            bounds,
            solid: None,
            materials: Vec::new(),
        }
    }

    /// O(1) solidity check for an in-bounds location.
    pub fn is_solid(&self, location: Coordinate) -> Result<bool, RangeError> {
        self.check_bounds(location)?;
        Ok(self
            .solid
            .as_ref()
            .is_some_and(|solid| solid[linear_index(location, self.bounds)]))
    }

    /// Index into `materials` for the solid voxel at bit `index`.
    fn material_offset(solid: &BitVec, index: usize) -> usize {
        solid[..index].count_ones()
    }
}

impl VoxelStorage for PackedVoxels {
    fn bounds(&self) -> Coordinate {
        self.bounds
    }

    fn get(&self, location: Coordinate) -> Result<VoxelId, RangeError> {
        self.check_bounds(location)?;
        let Some(solid) = &self.solid else {
            return Ok(0);
        };

        let index = linear_index(location, self.bounds);
        if !solid[index] {
            return Ok(0);
        }
        Ok(self.materials[Self::material_offset(solid, index)])
    }

    fn set(&mut self, location: Coordinate, voxel: VoxelId) -> Result<(), RangeError> {
        self.check_bounds(location)?;
        if self.solid.is_none() && voxel == 0 {
            return Ok(());
        }

        let volume = self.bounds.volume();
        let solid = self.solid.get_or_insert_with(|| BitVec::repeat(false, volume));
        let index = linear_index(location, self.bounds);
        let offset = Self::material_offset(solid, index);

        match (solid[index], voxel != 0) {
            (true, true) => self.materials[offset] = voxel,
            (false, true) => {
                solid.set(index, true);
                self.materials.insert(offset, voxel);
            }
            (true, false) => {
                solid.set(index, false);
                self.materials.remove(offset);
            }
            (false, false) => {}
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.solid.is_none()
    }

    fn is_full(&self) -> bool {
        self.materials.len() == self.bounds.volume()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Packed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materials_stay_in_location_order() {
        let mut voxels = PackedVoxels::new(Coordinate::new(8, 1, 1));
        voxels.set(Coordinate::new(5, 0, 0), 3).unwrap();
        voxels.set(Coordinate::new(1, 0, 0), 1).unwrap();
        voxels.set(Coordinate::new(2, 0, 0), 2).unwrap();

        assert_eq!(voxels.materials, vec![1, 2, 3]);
        assert_eq!(voxels.get(Coordinate::new(5, 0, 0)), Ok(3));

        voxels.set(Coordinate::new(2, 0, 0), 0).unwrap();
        assert_eq!(voxels.materials, vec![1, 3]);
        assert_eq!(voxels.get(Coordinate::new(5, 0, 0)), Ok(3));
    }

    #[test]
    fn solidity_check_reads_one_bit() {
        let mut voxels = PackedVoxels::new(Coordinate::splat(4));
        assert_eq!(voxels.is_solid(Coordinate::new(1, 1, 1)), Ok(false));
        voxels.set(Coordinate::new(1, 1, 1), 2).unwrap();
        assert_eq!(voxels.is_solid(Coordinate::new(1, 1, 1)), Ok(true));
        assert!(voxels.is_solid(Coordinate::new(4, 1, 1)).is_err());
    }
}
