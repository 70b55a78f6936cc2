//! # Voxel Storage
//!
//! Per-chunk grids of voxel ids over a fixed `[0, bounds)` box. One trait, four
//! independent strategies, picked at construction through [`StorageKind`]:
//!
//! | Strategy | Layout | Good for |
//! |---|---|---|
//! | `FlatVoxels` | one dense `Vec<u8>`, allocated on first solid write | mostly-solid terrain |
//! | `JaggedVoxels` | nested vectors grown only as far as the highest solid voxel | columns of terrain with air above |
//! | `SparseVoxels` | `HashMap<Coordinate, u8>` | a handful of voxels |
//! | `PackedVoxels` | solidity bitset plus a compacted material list | large air pockets, cheap solidity checks |
//!
//! All strategies share the same contract:
//! - `is_empty()` is true until the first non-air id is written;
//! - any location outside `[0, bounds)` fails with a [`RangeError`] instead of
//!   touching memory.

mod flat;
mod jagged;
mod packed;
mod sparse;

pub use flat::FlatVoxels;
pub use jagged::JaggedVoxels;
pub use packed::PackedVoxels;
pub use sparse::SparseVoxels;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::RangeError;

use super::voxel_type::VoxelId;

/// Capability shared by every voxel storage strategy.
pub trait VoxelStorage: Debug + Send + Sync {
    /// The size of the grid; valid locations are `[0, bounds)`.
    fn bounds(&self) -> Coordinate;

    /// The voxel id at `location`.
    fn get(&self, location: Coordinate) -> Result<VoxelId, RangeError>;

    /// Overwrites the voxel id at `location`.
    fn set(&mut self, location: Coordinate, voxel: VoxelId) -> Result<(), RangeError>;

    /// True if no non-air voxel has ever been written.
    fn is_empty(&self) -> bool;

    /// True if every location holds a non-air voxel.
    fn is_full(&self) -> bool;

    /// Which strategy this is.
    fn kind(&self) -> StorageKind;

    /// Fails with a [`RangeError`] unless `location` is inside the bounds.
    fn check_bounds(&self, location: Coordinate) -> Result<(), RangeError> {
        let bounds = self.bounds();
        if location.is_within(Coordinate::ZERO, bounds) {
            Ok(())
        } else {
            Err(RangeError { location, bounds })
        }
    }
}

/// Selects the storage strategy new chunks are created with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// [`FlatVoxels`]
    #[default]
    Flat,
    /// [`JaggedVoxels`]
    Jagged,
    /// [`SparseVoxels`]
    Sparse,
    /// [`PackedVoxels`]
    Packed,
}

impl StorageKind {
    /// Creates an empty storage of this kind with the given bounds.
    pub fn create(self, bounds: Coordinate) -> Box<dyn VoxelStorage> {
        match self {
            StorageKind::Flat => Box::new(FlatVoxels::new(bounds)),
            StorageKind::Jagged => Box::new(JaggedVoxels::new(bounds)),
            StorageKind::Sparse => Box::new(SparseVoxels::new(bounds)),
            StorageKind::Packed => Box::new(PackedVoxels::new(bounds)),
        }
    }

    /// Every strategy, for exercising all of them in tests and tools.
    pub fn all() -> [StorageKind; 4] {
        [
            StorageKind::Flat,
            StorageKind::Jagged,
            StorageKind::Sparse,
            StorageKind::Packed,
        ]
    }
}

/// Row-major index of `location` inside `bounds`, x fastest.
fn linear_index(location: Coordinate, bounds: Coordinate) -> usize {
    location.x as usize
        + bounds.x as usize * (location.y as usize + bounds.y as usize * location.z as usize)
}
