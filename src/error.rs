//! # Errors
//!
//! Every fallible operation in the crate returns one of the enums below. They are
//! layered: storage and key errors are leaves, persistence wraps storage, and the
//! pipeline and level errors wrap whatever their operations can hit.

use std::io;

use thiserror::Error;

use crate::coordinate::Coordinate;

/// A voxel location fell outside the `[0, bounds)` box of a storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("voxel location {location} is outside storage bounds {bounds}")]
pub struct RangeError {
    /// The rejected location.
    pub location: Coordinate,
    /// The bounds of the storage that rejected it.
    pub bounds: Coordinate,
}

/// A chunk coordinate cannot be packed into a [`ChunkKey`](crate::coordinate::ChunkKey).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chunk coordinate {location} exceeds the {bits}-bit per-axis key range")]
pub struct ChunkKeyError {
    /// The coordinate that overflowed.
    pub location: Coordinate,
    /// Bits available per axis.
    pub bits: u32,
}

/// Failures reading, writing or decoding persisted chunk blobs.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("chunk blob i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The blob could not be (de)serialized.
    #[error("chunk blob codec failed: {0}")]
    Codec(#[from] serde_json::Error),
    /// No blob exists for the requested chunk.
    #[error("no chunk blob stored for seed {seed} at {location}")]
    Missing {
        /// World seed.
        seed: i32,
        /// Chunk coordinate.
        location: Coordinate,
    },
    /// The blob was written for a different chunk size.
    #[error("chunk blob has bounds {found}, storage expects {expected}")]
    BoundsMismatch {
        /// Bounds of the storage being filled.
        expected: Coordinate,
        /// Bounds recorded in the blob.
        found: Coordinate,
    },
    /// The blob described more voxels than its bounds hold.
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Problems loading or validating a [`LevelConfig`](crate::config::LevelConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("could not read level config: {0}")]
    Io(#[from] io::Error),
    /// The config file is not valid JSON for a level config.
    #[error("could not parse level config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of its allowed range.
    #[error("invalid level config: {0}")]
    Invalid(String),
}

/// Errors a pipeline work function can return for a single item.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading or saving the chunk blob failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// Voxel generation touched a location outside the storage.
    #[error(transparent)]
    Range(#[from] RangeError),
    /// The chunk coordinate is outside the keyable world.
    #[error(transparent)]
    Key(#[from] ChunkKeyError),
}

/// Errors surfaced by the [`Level`](crate::level::Level) public contract.
#[derive(Debug, Error)]
pub enum LevelError {
    /// `initialize_around` was called twice.
    #[error("level is already initialized")]
    AlreadyInitialized,
    /// The level config failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A coordinator or worker thread could not be spawned.
    #[error("could not spawn pipeline thread: {0}")]
    Spawn(#[from] io::Error),
    /// A chunk coordinate is outside the keyable world.
    #[error(transparent)]
    Key(#[from] ChunkKeyError),
}
