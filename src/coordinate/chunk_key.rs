//! # Chunk Keys
//!
//! A chunk coordinate packed into one `u64` for use as a map key. Each axis gets
//! [`ChunkKey::AXIS_BITS`] bits holding the coordinate offset by half the range,
//! so negative chunk coordinates pack as well as positive ones. Coordinates outside
//! the range are rejected with a [`ChunkKeyError`] instead of aliasing another chunk.

use crate::error::ChunkKeyError;

use super::{ChunkRegion, Coordinate};

/// Packed chunk coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(u64);

impl ChunkKey {
    /// Bits per axis.
    pub const AXIS_BITS: u32 = 21;
    const AXIS_MASK: u64 = (1 << Self::AXIS_BITS) - 1;
    const AXIS_OFFSET: i64 = 1 << (Self::AXIS_BITS - 1);

    /// Smallest packable axis value.
    pub const MIN_AXIS: i32 = -(1 << (Self::AXIS_BITS - 1));
    /// Largest packable axis value.
    pub const MAX_AXIS: i32 = (1 << (Self::AXIS_BITS - 1)) - 1;

    /// The region of every packable coordinate, half-open like all regions.
    pub fn keyable_region() -> ChunkRegion {
        ChunkRegion::new(
            Coordinate::splat(Self::MIN_AXIS),
            Coordinate::splat(Self::MAX_AXIS + 1),
        )
    }

    /// Packs `location`, failing if any axis is outside `MIN_AXIS..=MAX_AXIS`.
    pub fn new(location: Coordinate) -> Result<Self, ChunkKeyError> {
        let pack = |axis: i32| -> Result<u64, ChunkKeyError> {
            if (Self::MIN_AXIS..=Self::MAX_AXIS).contains(&axis) {
                Ok((axis as i64 + Self::AXIS_OFFSET) as u64)
            } else {
                Err(ChunkKeyError {
                    location,
                    bits: Self::AXIS_BITS,
                })
            }
        };

        Ok(ChunkKey(
            pack(location.x)?
                | pack(location.y)? << Self::AXIS_BITS
                | pack(location.z)? << (2 * Self::AXIS_BITS),
        ))
    }

    /// Recovers the coordinate this key was packed from.
    pub fn coordinate(&self) -> Coordinate {
        let unpack = |shift: u32| ((self.0 >> shift) & Self::AXIS_MASK) as i64 - Self::AXIS_OFFSET;
        Coordinate::new(
            unpack(0) as i32,
            unpack(Self::AXIS_BITS) as i32,
            unpack(2 * Self::AXIS_BITS) as i32,
        )
    }

    /// The raw packed value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl TryFrom<Coordinate> for ChunkKey {
    type Error = ChunkKeyError;

    fn try_from(location: Coordinate) -> Result<Self, Self::Error> {
        ChunkKey::new(location)
    }
}
