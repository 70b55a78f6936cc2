//! # Level Configuration
//!
//! Every tunable of a level lives in [`LevelConfig`]. It deserializes from JSON
//! with every field optional, so a config file only names what it changes:
//!
//! ```json
//! { "meshed_chunk_diameter": 7, "chunk_load_buffer": 2, "storage": "packed" }
//! ```
//!
//! The config is validated once, when a [`Level`](crate::level::Level) is built,
//! and then carried through the pipelines inside their shared context.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coordinate::{ChunkKey, ChunkRegion, Coordinate};
use crate::error::ConfigError;
use crate::sources::SourceConfig;
use crate::voxels::storage::StorageKind;

/// Tunables of a streamed level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Voxels per chunk edge.
    pub chunk_diameter: i32,
    /// Inclusive lower corner of the world, in chunks.
    pub world_min: Coordinate,
    /// Exclusive upper corner of the world, in chunks.
    pub world_max: Coordinate,
    /// Width of the meshed prism on x and z, in chunks.
    pub meshed_chunk_diameter: i32,
    /// Extra chunks loaded beyond the meshed prism on every side that has one.
    pub chunk_load_buffer: i32,
    /// How far below the focus chunks are meshed.
    pub chunks_below_to_mesh: i32,
    /// Maximum concurrently running jobs per pipeline.
    pub max_concurrent_jobs: usize,
    /// Upper bound on how long a pipeline waits before re-checking items that
    /// were not ready.
    pub readiness_poll_interval_ms: u64,
    /// Storage strategy for new chunks.
    pub storage: StorageKind,
    /// Root directory for [`FileBlobStore`](crate::persistence::FileBlobStore).
    pub save_directory: PathBuf,
    /// Voxel source used by the demo binary.
    pub source: SourceConfig,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            chunk_diameter: 16,
            world_min: Coordinate::ZERO,
            world_max: Coordinate::new(64, 16, 64),
            meshed_chunk_diameter: 15,
            chunk_load_buffer: 5,
            chunks_below_to_mesh: 5,
            max_concurrent_jobs: 10,
            readiness_poll_interval_ms: 25,
            storage: StorageKind::Flat,
            save_directory: PathBuf::from("leveldata"),
            source: SourceConfig::default(),
        }
    }
}

impl LevelConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses and validates a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: LevelConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("chunk_diameter", self.chunk_diameter),
            ("meshed_chunk_diameter", self.meshed_chunk_diameter),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("chunk_load_buffer", self.chunk_load_buffer),
            ("chunks_below_to_mesh", self.chunks_below_to_mesh),
        ];
        for (name, value) in non_negative {
            if value < 0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }

        if self.max_concurrent_jobs == 0 {
            return Err(ConfigError::Invalid("max_concurrent_jobs must be at least 1".into()));
        }

        let world = self.world_region();
        if world.is_empty() {
            return Err(ConfigError::Invalid(format!("world region {world} is empty")));
        }

        let keyable = ChunkKey::keyable_region();
        if world.intersection(&keyable) != world {
            return Err(ConfigError::Invalid(format!(
                "world region {world} exceeds the chunk key range {keyable}"
            )));
        }

        Ok(())
    }

    /// The whole world, in chunks.
    pub fn world_region(&self) -> ChunkRegion {
        ChunkRegion::new(self.world_min, self.world_max)
    }

    /// Width of the loaded prism on x and z.
    pub fn loaded_chunk_diameter(&self) -> i32 {
        self.meshed_chunk_diameter + self.chunk_load_buffer
    }

    /// How far below the focus chunks are loaded.
    pub fn chunks_below_to_load(&self) -> i32 {
        self.chunks_below_to_mesh + self.chunk_load_buffer
    }

    /// Voxel bounds of one chunk.
    pub fn chunk_bounds(&self) -> Coordinate {
        Coordinate::splat(self.chunk_diameter)
    }

    /// [`readiness_poll_interval_ms`](Self::readiness_poll_interval_ms) as a duration.
    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }

    /// The loaded prism around `focus`.
    pub fn loaded_region_around(&self, focus: Coordinate) -> ChunkRegion {
        self.region_around(focus, self.loaded_chunk_diameter(), self.chunks_below_to_load())
    }

    /// The meshed prism around `focus`.
    pub fn meshed_region_around(&self, focus: Coordinate) -> ChunkRegion {
        self.region_around(focus, self.meshed_chunk_diameter, self.chunks_below_to_mesh)
    }

    /// A prism `diameter` chunks wide on x and z centred on `focus`, reaching
    /// from `below` chunks under the focus up to the world ceiling, clamped to
    /// the world.
    fn region_around(&self, focus: Coordinate, diameter: i32, below: i32) -> ChunkRegion {
        let half = diameter / 2;
        let min = Coordinate::new(
            focus.x.saturating_sub(half),
            focus.y.saturating_sub(below),
            focus.z.saturating_sub(half),
        );
        let max = Coordinate::new(
            min.x.saturating_add(diameter),
            self.world_max.y,
            min.z.saturating_add(diameter),
        );
        ChunkRegion::new(min, max).clamped_to(&self.world_region())
    }
}
