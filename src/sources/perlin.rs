use noise::{NoiseFn, Perlin};

use crate::coordinate::Coordinate;
use crate::voxels::voxel_type::VoxelType;

use super::VoxelSource;

/// Noise above this is solid.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Noise below this is solid.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling the noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// Cave-like terrain from 3D Perlin noise.
///
/// A voxel is solid where the sampled noise leaves the
/// `[PERLIN_NEGATIVE_THRESHOLD, PERLIN_POSITIVE_THRESHOLD]` band, which carves
/// winding tunnels and overhangs. The material of each solid voxel comes from an
/// RNG seeded with the world seed and the voxel location, so it is stable across
/// regenerations.
pub struct PerlinSource {
    seed: i32,
    perlin: Perlin,
}

impl PerlinSource {
    /// Creates a source for `seed`.
    pub fn new(seed: i32) -> Self {
        PerlinSource {
            seed,
            perlin: Perlin::new(seed as u32),
        }
    }

    /// Converts a world voxel location to a noise sample point.
    fn to_perlin_pos(location: Coordinate, scale_factor: f64) -> [f64; 3] {
        [
            location.x as f64 * scale_factor,
            location.y as f64 * scale_factor,
            location.z as f64 * scale_factor,
        ]
    }

    fn material_rng(&self, location: Coordinate) -> fastrand::Rng {
        let mut state = self.seed as u32 as u64;
        for axis in [location.x, location.y, location.z] {
            state = state
                .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                .wrapping_add(axis as u32 as u64);
        }
        fastrand::Rng::with_seed(state)
    }
}

impl VoxelSource for PerlinSource {
    fn seed(&self) -> i32 {
        self.seed
    }

    fn voxel_at(&self, location: Coordinate) -> VoxelType {
        let sample = self
            .perlin
            .get(Self::to_perlin_pos(location, PERLIN_SCALE_FACTOR));
        if (PERLIN_NEGATIVE_THRESHOLD..=PERLIN_POSITIVE_THRESHOLD).contains(&sample) {
            VoxelType::Air
        } else {
            VoxelType::random_solid(&mut self.material_rng(location))
        }
    }
}
