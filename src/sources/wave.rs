use noise::{NoiseFn, Perlin};

use crate::coordinate::Coordinate;
use crate::voxels::voxel_type::VoxelType;

use super::VoxelSource;

/// Rolling hills: a 2D noise heightfield with grass on top of dirt over stone.
#[derive(Clone)]
pub struct WaveSource {
    seed: i32,
    perlin: Perlin,
    /// Voxels per noise period along x.
    pub x_wavelength: f64,
    /// Voxels per noise period along z.
    pub z_wavelength: f64,
    /// Height of the terrain where the noise is zero.
    pub base_height: f64,
    /// Maximum deviation from `base_height`.
    pub amplitude: f64,
}

impl WaveSource {
    /// Creates a source for `seed` with gentle default hills.
    pub fn new(seed: i32) -> Self {
        WaveSource {
            seed,
            perlin: Perlin::new(seed as u32),
            x_wavelength: 40.0,
            z_wavelength: 40.0,
            base_height: 20.0,
            amplitude: 10.0,
        }
    }

    /// Terrain surface height at a world column.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let sample = self
            .perlin
            .get([x as f64 / self.x_wavelength, z as f64 / self.z_wavelength]);
        (self.base_height + sample * self.amplitude).round() as i32
    }
}

impl VoxelSource for WaveSource {
    fn seed(&self) -> i32 {
        self.seed
    }

    fn voxel_at(&self, location: Coordinate) -> VoxelType {
        let height = self.height_at(location.x, location.z);
        match location.y {
            y if y > height => VoxelType::Air,
            y if y == height => VoxelType::Grass,
            y if y > height - 3 => VoxelType::Dirt,
            _ => VoxelType::Stone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_layered_grass_dirt_stone() {
        let source = WaveSource::new(3);
        let height = source.height_at(5, 9);
        assert_eq!(source.voxel_at(Coordinate::new(5, height + 1, 9)), VoxelType::Air);
        assert_eq!(source.voxel_at(Coordinate::new(5, height, 9)), VoxelType::Grass);
        assert_eq!(source.voxel_at(Coordinate::new(5, height - 1, 9)), VoxelType::Dirt);
        assert_eq!(source.voxel_at(Coordinate::new(5, height - 10, 9)), VoxelType::Stone);
    }
}
