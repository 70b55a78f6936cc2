use crate::coordinate::Coordinate;
use crate::voxels::voxel_type::VoxelType;

use super::VoxelSource;

/// A perfectly flat world: grass at `sea_level`, stone below, air above.
#[derive(Debug, Clone, Copy)]
pub struct FlatPlainsSource {
    /// World y of the grass layer.
    pub sea_level: i32,
}

impl FlatPlainsSource {
    /// Creates a plain with its surface at `sea_level`.
    pub fn new(sea_level: i32) -> Self {
        FlatPlainsSource { sea_level }
    }
}

impl VoxelSource for FlatPlainsSource {
    fn seed(&self) -> i32 {
        0
    }

    fn voxel_at(&self, location: Coordinate) -> VoxelType {
        match location.y.cmp(&self.sea_level) {
            std::cmp::Ordering::Greater => VoxelType::Air,
            std::cmp::Ordering::Equal => VoxelType::Grass,
            std::cmp::Ordering::Less => VoxelType::Stone,
        }
    }
}
