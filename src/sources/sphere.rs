use crate::coordinate::Coordinate;
use crate::voxels::voxel_type::VoxelType;

use super::VoxelSource;

/// A single stone sphere in an otherwise empty world.
#[derive(Debug, Clone, Copy)]
pub struct SphereSource {
    /// Radius in voxels.
    pub radius: i32,
    /// World-space centre.
    pub center: Coordinate,
}

impl SphereSource {
    /// Creates a sphere of `radius` voxels around `center`.
    pub fn new(radius: i32, center: Coordinate) -> Self {
        SphereSource { radius, center }
    }
}

impl VoxelSource for SphereSource {
    fn seed(&self) -> i32 {
        0
    }

    fn voxel_at(&self, location: Coordinate) -> VoxelType {
        let radius = self.radius as i64;
        if location.distance_squared(self.center) <= radius * radius {
            VoxelType::Stone
        } else {
            VoxelType::Air
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_points_are_inside() {
        let sphere = SphereSource::new(5, Coordinate::new(10, 10, 10));
        assert_eq!(sphere.voxel_at(Coordinate::new(15, 10, 10)), VoxelType::Stone);
        assert_eq!(sphere.voxel_at(Coordinate::new(16, 10, 10)), VoxelType::Air);
        assert_eq!(sphere.voxel_at(Coordinate::new(10, 10, 10)), VoxelType::Stone);
    }
}
