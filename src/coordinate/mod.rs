//! # Coordinate Module
//!
//! Integer 3D vectors used both as voxel locations inside a chunk and as chunk
//! locations inside the world.
//!
//! ## Key Components
//! - `Coordinate`: component-wise integer triple, hashable, serde-friendly
//! - `Direction`: the six face directions and their unit offsets
//! - `ChunkRegion`: half-open axis-aligned prism with iteration and box-diff
//! - `ChunkKey`: a coordinate packed into one integer, with an explicit range check
//!
//! ## Containment Convention
//!
//! Every box test in the crate is inclusive-lower and exclusive-upper: a storage
//! with bounds `b` holds `[0, b)`, a region `min..max` holds `[min, max)`.

pub mod chunk_key;
pub mod direction;
pub mod region;

pub use chunk_key::ChunkKey;
pub use direction::Direction;
pub use region::ChunkRegion;

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use cgmath::{MetricSpace, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An immutable integer (x, y, z) triple.
///
/// Arithmetic is component-wise; `Mul<Coordinate>` is the Hadamard product,
/// which is how local voxel offsets are scaled by chunk bounds.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinate {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl Coordinate {
    /// The origin.
    pub const ZERO: Coordinate = Coordinate::new(0, 0, 0);
    /// All components one.
    pub const ONE: Coordinate = Coordinate::new(1, 1, 1);

    /// Builds a coordinate from its components.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Coordinate { x, y, z }
    }

    /// Builds a coordinate with the same value on every axis.
    pub const fn splat(value: i32) -> Self {
        Coordinate::new(value, value, value)
    }

    /// Inclusive-lower, exclusive-upper box test: `lo <= self < hi` on every axis.
    pub fn is_within(&self, lo: Coordinate, hi: Coordinate) -> bool {
        self.x >= lo.x
            && self.x < hi.x
            && self.y >= lo.y
            && self.y < hi.y
            && self.z >= lo.z
            && self.z < hi.z
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Coordinate) -> f32 {
        Point3::<f32>::from(*self).distance(Point3::<f32>::from(other))
    }

    /// Squared euclidean distance to `other`, exact in integers.
    pub fn distance_squared(&self, other: Coordinate) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Component-wise minimum.
    pub fn min(self, other: Coordinate) -> Self {
        Coordinate::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    pub fn max(self, other: Coordinate) -> Self {
        Coordinate::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Product of the components, i.e. the voxel count of a `[0, self)` box.
    pub fn volume(&self) -> usize {
        if self.x <= 0 || self.y <= 0 || self.z <= 0 {
            return 0;
        }
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Iterates every coordinate in `[self, hi)`, x fastest, then y, then z.
    pub fn until(self, hi: Coordinate) -> impl Iterator<Item = Coordinate> {
        let lo = self;
        (lo.z..hi.z).flat_map(move |z| {
            (lo.y..hi.y).flat_map(move |y| (lo.x..hi.x).map(move |x| Coordinate::new(x, y, z)))
        })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i32, i32, i32)> for Coordinate {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Coordinate::new(x, y, z)
    }
}

impl From<Point3<i32>> for Coordinate {
    fn from(point: Point3<i32>) -> Self {
        Coordinate::new(point.x, point.y, point.z)
    }
}

impl From<Coordinate> for Point3<i32> {
    fn from(c: Coordinate) -> Self {
        Point3::new(c.x, c.y, c.z)
    }
}

impl From<Coordinate> for Point3<f32> {
    fn from(c: Coordinate) -> Self {
        Point3::new(c.x as f32, c.y as f32, c.z as f32)
    }
}

impl From<Coordinate> for Vector3<i32> {
    fn from(c: Coordinate) -> Self {
        Vector3::new(c.x, c.y, c.z)
    }
}

impl Add for Coordinate {
    type Output = Coordinate;
    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Coordinate {
    fn add_assign(&mut self, rhs: Coordinate) {
        *self = *self + rhs;
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;
    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Coordinate {
    fn sub_assign(&mut self, rhs: Coordinate) {
        *self = *self - rhs;
    }
}

impl Mul for Coordinate {
    type Output = Coordinate;
    fn mul(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

impl Mul<i32> for Coordinate {
    type Output = Coordinate;
    fn mul(self, rhs: i32) -> Coordinate {
        Coordinate::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;
    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.y, -self.z)
    }
}
