//! # Direction Module
//!
//! The six face directions of a chunk or voxel. Neighbor lookups, cross-boundary
//! voxel forwarding and mesh face culling all iterate these in the same order.

use super::Coordinate;

/// One of the six axis-aligned face directions.
///
/// The discriminant doubles as the index into per-direction arrays (neighbor
/// slots, mesh sides). The order is: [NORTH, EAST, SOUTH, WEST, ABOVE, BELOW]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum Direction {
    /// Facing positive Z.
    North = 0,
    /// Facing positive X.
    East = 1,
    /// Facing negative Z.
    South = 2,
    /// Facing negative X.
    West = 3,
    /// Facing positive Y.
    Above = 4,
    /// Facing negative Y.
    Below = 5,
}

impl Direction {
    /// All six directions in index order.
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Above,
        Direction::Below,
    ];

    /// Returns an array containing all six directions in index order.
    pub fn all() -> [Direction; 6] {
        Self::ALL
    }

    /// Slot index for per-direction arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit offset one step in this direction.
    pub fn offset(self) -> Coordinate {
        match self {
            Direction::North => Coordinate::new(0, 0, 1),
            Direction::East => Coordinate::new(1, 0, 0),
            Direction::South => Coordinate::new(0, 0, -1),
            Direction::West => Coordinate::new(-1, 0, 0),
            Direction::Above => Coordinate::new(0, 1, 0),
            Direction::Below => Coordinate::new(0, -1, 0),
        }
    }

    /// The opposite direction.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Above => Direction::Below,
            Direction::Below => Direction::Above,
        }
    }

    /// The direction a location leaves the `[0, bounds)` box through, if any.
    ///
    /// When a location is outside on several axes the x axis wins, then y, then z,
    /// so a corner read hops through neighbors one axis at a time.
    pub fn exit_towards(location: Coordinate, bounds: Coordinate) -> Option<Direction> {
        if location.x >= bounds.x {
            Some(Direction::East)
        } else if location.x < 0 {
            Some(Direction::West)
        } else if location.y >= bounds.y {
            Some(Direction::Above)
        } else if location.y < 0 {
            Some(Direction::Below)
        } else if location.z >= bounds.z {
            Some(Direction::North)
        } else if location.z < 0 {
            Some(Direction::South)
        } else {
            None
        }
    }
}
