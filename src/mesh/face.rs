use crate::coordinate::{Coordinate, Direction};
use crate::voxels::voxel_type::VoxelId;

/// Represents a single quad face of a voxel.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-left,
/// upper-right) in chunk-local voxel space, ordered so that
/// [`Mesh::generate_face_indices`](super::Mesh::generate_face_indices) winds
/// both triangles outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    /// Lower-left corner
    pub ll: Coordinate,
    /// Lower-right corner
    pub lr: Coordinate,
    /// Upper-left corner
    pub ul: Coordinate,
    /// Upper-right corner
    pub ur: Coordinate,
    /// Material of the voxel this face belongs to
    pub voxel: VoxelId,
    /// Which way the face points
    pub side: Direction,
}

impl Face {
    /// Creates the face of the voxel at `at` that points towards `side`.
    pub fn new(at: Coordinate, voxel: VoxelId, side: Direction) -> Self {
        let c = |x: i32, y: i32, z: i32| at + Coordinate::new(x, y, z);
        let (ll, lr, ul, ur) = match side {
            Direction::West => (c(0, 0, 0), c(0, 0, 1), c(0, 1, 0), c(0, 1, 1)),
            Direction::East => (c(1, 0, 1), c(1, 0, 0), c(1, 1, 1), c(1, 1, 0)),
            Direction::Below => (c(0, 0, 1), c(0, 0, 0), c(1, 0, 1), c(1, 0, 0)),
            Direction::Above => (c(0, 1, 0), c(0, 1, 1), c(1, 1, 0), c(1, 1, 1)),
            Direction::South => (c(1, 0, 0), c(0, 0, 0), c(1, 1, 0), c(0, 1, 0)),
            Direction::North => (c(0, 0, 1), c(1, 0, 1), c(0, 1, 1), c(1, 1, 1)),
        };

        Face {
            ll,
            lr,
            ul,
            ur,
            voxel,
            side,
        }
    }

    /// The corners in vertex order: ll, lr, ul, ur.
    pub fn corners(&self) -> [Coordinate; 4] {
        [self.ll, self.lr, self.ul, self.ur]
    }
}
