//! # Voxel Sources
//!
//! Procedural generators that fill a chunk's storage when no persisted blob
//! exists. A source answers one question, "what material is at this world voxel",
//! and [`VoxelSource::generate_all_at`] walks a storage asking it.
//!
//! Every source is deterministic for its seed: generating the same chunk twice
//! yields identical voxels, which is what lets unloaded chunks that were never
//! edited be regenerated instead of saved.

mod flat_plains;
mod perlin;
mod sphere;
mod wave;

pub use flat_plains::FlatPlainsSource;
pub use perlin::PerlinSource;
pub use sphere::SphereSource;
pub use wave::WaveSource;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::RangeError;
use crate::voxels::storage::VoxelStorage;
use crate::voxels::voxel_type::VoxelType;

/// A deterministic source of voxels.
pub trait VoxelSource: Send + Sync {
    /// The seed everything this source generates derives from.
    fn seed(&self) -> i32;

    /// The material at a world-space voxel location.
    fn voxel_at(&self, location: Coordinate) -> VoxelType;

    /// Fills `storage` with the voxels of the chunk at chunk coordinate `offset`.
    ///
    /// Local location `c` maps to world location `c + offset * bounds`. Only solid
    /// voxels are written so an all-air chunk leaves the storage empty.
    fn generate_all_at(
        &self,
        offset: Coordinate,
        storage: &mut dyn VoxelStorage,
    ) -> Result<(), RangeError> {
        let bounds = storage.bounds();
        let origin = offset * bounds;
        for local in Coordinate::ZERO.until(bounds) {
            let voxel = self.voxel_at(local + origin);
            if voxel.is_solid() {
                storage.set(local, voxel.id())?;
            }
        }
        Ok(())
    }

    /// Fills `storage` as the chunk at the origin.
    fn generate_all(&self, storage: &mut dyn VoxelStorage) -> Result<(), RangeError> {
        self.generate_all_at(Coordinate::ZERO, storage)
    }
}

/// Serializable choice of source, used by the demo binary's config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// [`PerlinSource`]
    Perlin {
        /// World seed.
        seed: i32,
    },
    /// [`WaveSource`]
    Wave {
        /// World seed.
        seed: i32,
    },
    /// [`FlatPlainsSource`]
    FlatPlains {
        /// Height of the grass layer, in voxels.
        sea_level: i32,
    },
    /// [`SphereSource`]
    Sphere {
        /// Radius in voxels.
        radius: i32,
        /// World-space centre.
        center: Coordinate,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Perlin { seed: 1234 }
    }
}

impl SourceConfig {
    /// Builds the configured source.
    pub fn build(self) -> Box<dyn VoxelSource> {
        match self {
            SourceConfig::Perlin { seed } => Box::new(PerlinSource::new(seed)),
            SourceConfig::Wave { seed } => Box::new(WaveSource::new(seed)),
            SourceConfig::FlatPlains { sea_level } => Box::new(FlatPlainsSource::new(sea_level)),
            SourceConfig::Sphere { radius, center } => Box::new(SphereSource::new(radius, center)),
        }
    }
}
