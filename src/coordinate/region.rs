//! # Chunk Regions
//!
//! Half-open axis-aligned prisms of chunk coordinates. The level keeps two of
//! these around its focus (loaded and meshed) and diffs old against new whenever
//! the focus moves.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// The prism `[min, max)` of chunk coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRegion {
    /// Inclusive lower corner.
    pub min: Coordinate,
    /// Exclusive upper corner.
    pub max: Coordinate,
}

impl ChunkRegion {
    /// Builds the region `[min, max)`.
    pub const fn new(min: Coordinate, max: Coordinate) -> Self {
        ChunkRegion { min, max }
    }

    /// True if `location` lies inside the region.
    pub fn contains(&self, location: Coordinate) -> bool {
        location.is_within(self.min, self.max)
    }

    /// True if the region holds no coordinates.
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// Number of coordinates in the region.
    pub fn volume(&self) -> usize {
        (self.max - self.min).volume()
    }

    /// The overlap of two regions, possibly empty.
    pub fn intersection(&self, other: &ChunkRegion) -> ChunkRegion {
        ChunkRegion::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Clamps this region to lie within `bounds`.
    pub fn clamped_to(&self, bounds: &ChunkRegion) -> ChunkRegion {
        let min = self.min.max(bounds.min);
        // keep max >= min so an out-of-world region stays empty rather than inverted
        let max = self.max.min(bounds.max).max(min);
        ChunkRegion::new(min, max)
    }

    /// Iterates every coordinate in the region, x fastest.
    pub fn iter(&self) -> impl Iterator<Item = Coordinate> {
        self.min.until(self.max)
    }

    /// Box-diff: every coordinate of `self` that is not in `other`.
    ///
    /// Only the slabs of `self` outside the overlap are walked, so the cost is
    /// proportional to the result rather than to the whole region.
    pub fn difference(&self, other: &ChunkRegion) -> Vec<Coordinate> {
        let overlap = self.intersection(other);
        if overlap.is_empty() {
            return self.iter().collect();
        }

        let mut points = Vec::with_capacity(self.volume() - overlap.volume());
        // x slabs span the full y/z extent of self
        let x_slabs = [(self.min.x, overlap.min.x), (overlap.max.x, self.max.x)];
        for (x0, x1) in x_slabs {
            points.extend(
                Coordinate::new(x0, self.min.y, self.min.z)
                    .until(Coordinate::new(x1, self.max.y, self.max.z)),
            );
        }
        // y slabs inside the overlap's x range
        let y_slabs = [(self.min.y, overlap.min.y), (overlap.max.y, self.max.y)];
        for (y0, y1) in y_slabs {
            points.extend(
                Coordinate::new(overlap.min.x, y0, self.min.z)
                    .until(Coordinate::new(overlap.max.x, y1, self.max.z)),
            );
        }
        // z slabs inside the overlap's x and y range
        let z_slabs = [(self.min.z, overlap.min.z), (overlap.max.z, self.max.z)];
        for (z0, z1) in z_slabs {
            points.extend(
                Coordinate::new(overlap.min.x, overlap.min.y, z0)
                    .until(Coordinate::new(overlap.max.x, overlap.max.y, z1)),
            );
        }

        points
    }
}

impl fmt::Display for ChunkRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {})", self.min, self.max)
    }
}
