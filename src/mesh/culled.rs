use crate::coordinate::{Coordinate, Direction};
use crate::voxels::chunk::Chunk;

use super::face::Face;
use super::{Mesh, MeshGenerator};

/// Emits one quad for every face of a solid voxel that borders air.
///
/// Border voxels are tested against the neighbor chunks attached to the view,
/// so a wall running across a chunk boundary produces no interior faces. Faces
/// bordering a missing or empty neighbor are emitted.
#[derive(Debug, Default, Clone, Copy)]
pub struct CulledMeshGenerator;

impl MeshGenerator for CulledMeshGenerator {
    fn generate_mesh(&self, chunk: &Chunk) -> Mesh {
        let mut mesh = Mesh::new();
        if chunk.is_empty() {
            return mesh;
        }

        let origin = chunk.location() * chunk.diameter();
        for local in Coordinate::ZERO.until(chunk.bounds()) {
            let voxel = chunk.get(local);
            if voxel == 0 {
                continue;
            }
            for side in Direction::ALL {
                if chunk.get(local + side.offset()) == 0 {
                    mesh.push_face(&Face::new(local, voxel, side), origin);
                }
            }
        }

        mesh
    }
}
