//! # Mesh Module
//!
//! Renderable geometry derived from chunk voxels. The streaming core treats a
//! mesh as opaque beyond "is there one" and "is it empty"; the types here give
//! the mesh pipeline something concrete to store and the renderer something to
//! draw.
//!
//! ## Key Components
//! - `MeshGenerator`: the pluggable collaborator the mesh pipeline calls
//! - `Mesh` / `MeshSide`: quads grouped by the direction they face
//! - `CulledMeshGenerator`: one quad per solid voxel face that touches air
//! - `Face`: the four corners of one voxel face

mod culled;
pub mod face;

pub use culled::CulledMeshGenerator;

use crate::coordinate::{Coordinate, Direction};
use crate::voxels::chunk::Chunk;
use crate::voxels::voxel_type::VoxelId;

use face::Face;

/// Builds a mesh for a chunk.
///
/// Called on a mesh-pipeline worker with a chunk whose neighbors are attached
/// one ring deep, each carrying its own ring. Neighbors can be empty
/// placeholders and implementations must read them as air.
pub trait MeshGenerator: Send + Sync {
    /// Generates the mesh for `chunk`.
    fn generate_mesh(&self, chunk: &Chunk) -> Mesh;
}

/// A mesh vertex in world voxel space.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    /// World-space voxel corner.
    pub position: [i32; 3],
    /// Material of the face this vertex belongs to.
    pub voxel: VoxelId,
}

/// The quads of a mesh that face one direction.
#[derive(Debug, Clone)]
pub struct MeshSide {
    /// The vertex data for this side, four per quad.
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`, six per quad.
    pub indices: Vec<u32>,
    /// Which direction these faces point.
    pub side: Direction,
}

impl MeshSide {
    /// Creates an empty side.
    pub fn new(side: Direction) -> Self {
        MeshSide {
            vertices: Vec::new(),
            indices: Vec::new(),
            side,
        }
    }
}

/// A chunk mesh, one [`MeshSide`] per face direction.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Indexed by [`Direction::index`].
    pub sides: [MeshSide; 6],
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Creates a mesh with no faces.
    pub fn new() -> Self {
        Mesh {
            sides: Direction::ALL.map(MeshSide::new),
        }
    }

    /// True if the mesh has no geometry at all.
    pub fn is_empty(&self) -> bool {
        self.sides
            .iter()
            .all(|side| side.vertices.is_empty() && side.indices.is_empty())
    }

    /// Total number of vertices over all sides.
    pub fn vertex_count(&self) -> usize {
        self.sides.iter().map(|side| side.vertices.len()).sum()
    }

    /// Total number of triangles over all sides.
    pub fn triangle_count(&self) -> usize {
        self.sides.iter().map(|side| side.indices.len() / 3).sum()
    }

    /// Appends one quad for `face`, offset into world space by `origin`.
    pub fn push_face(&mut self, face: &Face, origin: Coordinate) {
        let side = &mut self.sides[face.side.index()];
        let first = side.vertices.len() as u32;

        for corner in face.corners() {
            let world = corner + origin;
            side.vertices.push(Vertex {
                position: [world.x, world.y, world.z],
                voxel: face.voxel,
            });
        }
        side.indices
            .extend(Self::generate_face_indices(first));
    }

    /// Two counter-clockwise triangles over the quad starting at vertex `first`.
    pub fn generate_face_indices(first: u32) -> [u32; 6] {
        [first, first + 1, first + 3, first, first + 3, first + 2]
    }
}
