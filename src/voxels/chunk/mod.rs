//! # Chunk Module
//!
//! A [`Chunk`] is a view over one chunk's voxel data, its mesh, and optionally a
//! tree of neighbor views, assembled by the level from its chunk storage.
//!
//! ## Neighbors
//!
//! Chunks never hold references back into the level or to each other. When a
//! caller asks for neighbors, the level looks each one up by coordinate and nests
//! a fresh view for it; asking for neighbors' neighbors nests one more ring. The
//! result is an owned tree with no cycles, and the voxel data inside it is shared
//! with the level through [`MtResource`] handles, so writes through any view land
//! in the stored chunk.
//!
//! ## Cross-boundary Access
//!
//! A chunk owns the voxels in `[0, diameter)` on every axis. A read or write
//! outside that box is redirected to the neighbor on the crossed face, with the
//! location shifted by one chunk diameter back along that axis. Reads that run
//! off the edge of the available neighbor tree see air.
//!
//! ## Empty Chunks
//!
//! Space beyond the level's loaded region is represented by [`Chunk::empty`]:
//! a chunk that reports itself loaded, empty, and made entirely of air.

use std::sync::Arc;

use crate::coordinate::{Coordinate, Direction};
use crate::core::MtResource;
use crate::mesh::Mesh;

use super::storage::VoxelStorage;
use super::voxel_type::VoxelId;

/// Shared handle to one chunk's voxel data.
pub type VoxelHandle = MtResource<Box<dyn VoxelStorage>>;

#[derive(Clone, Debug)]
enum ChunkContent {
    /// Outside the level; loaded and permanently empty.
    OutOfLevel,
    /// Inside the level but no voxel data yet.
    Unloaded,
    /// Voxel data present.
    Loaded(VoxelHandle),
}

/// A view of one chunk, its mesh, and optionally its neighbors.
#[derive(Clone, Debug)]
pub struct Chunk {
    location: Coordinate,
    diameter: i32,
    content: ChunkContent,
    mesh: Option<Arc<Mesh>>,
    neighbors: Option<Box<[Chunk; 6]>>,
}

impl Chunk {
    /// The placeholder for space beyond the level: loaded, empty, all air.
    pub fn empty(location: Coordinate, diameter: i32) -> Self {
        Chunk {
            location,
            diameter,
            content: ChunkContent::OutOfLevel,
            mesh: None,
            neighbors: None,
        }
    }

    /// An empty placeholder whose six neighbors are empty placeholders as well,
    /// so neighbor predicates hold on it.
    pub fn empty_with_empty_neighbors(location: Coordinate, diameter: i32) -> Self {
        let neighbors = Direction::ALL
            .map(|direction| Chunk::empty(location + direction.offset(), diameter));
        Chunk::empty(location, diameter).with_neighbors(neighbors)
    }

    /// A chunk inside the level whose voxel data has not been loaded.
    pub fn unloaded(location: Coordinate, diameter: i32) -> Self {
        Chunk {
            location,
            diameter,
            content: ChunkContent::Unloaded,
            mesh: None,
            neighbors: None,
        }
    }

    /// A chunk over loaded voxel data.
    pub fn loaded(location: Coordinate, voxels: VoxelHandle) -> Self {
        let diameter = voxels.get().bounds().x;
        Chunk {
            location,
            diameter,
            content: ChunkContent::Loaded(voxels),
            mesh: None,
            neighbors: None,
        }
    }

    /// Attaches a mesh to this view.
    pub fn with_mesh(mut self, mesh: Option<Arc<Mesh>>) -> Self {
        self.mesh = mesh;
        self
    }

    /// Attaches neighbor views, indexed by [`Direction::index`].
    pub fn with_neighbors(mut self, neighbors: [Chunk; 6]) -> Self {
        self.neighbors = Some(Box::new(neighbors));
        self
    }

    /// The chunk coordinate of this chunk.
    pub fn location(&self) -> Coordinate {
        self.location
    }

    /// Voxels per chunk edge.
    pub fn diameter(&self) -> i32 {
        self.diameter
    }

    /// Local voxel bounds, `[0, bounds)` is owned by this chunk.
    pub fn bounds(&self) -> Coordinate {
        Coordinate::splat(self.diameter)
    }

    /// True for loaded chunks and for out-of-level placeholders.
    pub fn is_loaded(&self) -> bool {
        !matches!(self.content, ChunkContent::Unloaded)
    }

    /// True if the chunk holds no solid voxels, including when it has no data at all.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            ChunkContent::Loaded(voxels) => voxels.get().is_empty(),
            _ => true,
        }
    }

    /// True if every voxel of the chunk is solid.
    pub fn is_full(&self) -> bool {
        match &self.content {
            ChunkContent::Loaded(voxels) => voxels.get().is_full(),
            _ => false,
        }
    }

    /// True if this is the out-of-level placeholder.
    pub fn is_out_of_level(&self) -> bool {
        matches!(self.content, ChunkContent::OutOfLevel)
    }

    /// The shared voxel data, if loaded.
    pub fn voxels(&self) -> Option<&VoxelHandle> {
        match &self.content {
            ChunkContent::Loaded(voxels) => Some(voxels),
            _ => None,
        }
    }

    /// The mesh attached to this view.
    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    /// The neighbor view on the given face, if neighbors were requested.
    pub fn neighbor(&self, direction: Direction) -> Option<&Chunk> {
        self.neighbors
            .as_ref()
            .map(|neighbors| &neighbors[direction.index()])
    }

    /// True if all six neighbors are present and loaded.
    pub fn neighbors_are_loaded(&self) -> bool {
        Direction::ALL.iter().all(|direction| {
            self.neighbor(*direction)
                .is_some_and(|neighbor| neighbor.is_loaded())
        })
    }

    /// True if all six neighbors are loaded and so are all of theirs.
    pub fn neighbors_neighbors_are_loaded(&self) -> bool {
        Direction::ALL.iter().all(|direction| {
            self.neighbor(*direction).is_some_and(|neighbor| {
                neighbor.is_loaded() && neighbor.neighbors_are_loaded()
            })
        })
    }

    /// The voxel id at a chunk-local location, following neighbors past the edges.
    pub fn get(&self, location: Coordinate) -> VoxelId {
        if self.is_empty() {
            return 0;
        }

        match Direction::exit_towards(location, self.bounds()) {
            None => self
                .voxels()
                .and_then(|voxels| voxels.get().get(location).ok())
                .unwrap_or(0),
            Some(direction) => match self.neighbor(direction) {
                Some(neighbor) if !neighbor.is_empty() => {
                    neighbor.get(location - direction.offset() * self.diameter)
                }
                _ => 0,
            },
        }
    }

    /// Writes a voxel id at a chunk-local location, following neighbors past the edges.
    ///
    /// Returns false if the write landed nowhere: this chunk or the target
    /// neighbor is not loaded, or the location runs off the neighbor tree.
    pub fn set(&self, location: Coordinate, voxel: VoxelId) -> bool {
        if !self.is_loaded() {
            return false;
        }

        match Direction::exit_towards(location, self.bounds()) {
            None => self
                .voxels()
                .is_some_and(|voxels| voxels.get_mut().set(location, voxel).is_ok()),
            Some(direction) => self.neighbor(direction).is_some_and(|neighbor| {
                neighbor.is_loaded() && neighbor.set(location - direction.offset() * self.diameter, voxel)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::storage::StorageKind;

    const DIAMETER: i32 = 4;

    fn loaded_chunk(location: Coordinate) -> Chunk {
        let voxels = VoxelHandle::new(StorageKind::Flat.create(Coordinate::splat(DIAMETER)));
        Chunk::loaded(location, voxels)
    }

    fn neighbors_of(location: Coordinate, make: impl Fn(Coordinate) -> Chunk) -> [Chunk; 6] {
        Direction::ALL.map(|direction| make(location + direction.offset()))
    }

    #[test]
    fn empty_chunk_is_loaded_and_empty() {
        let chunk = Chunk::empty(Coordinate::new(99, 0, 0), DIAMETER);
        assert!(chunk.is_loaded());
        assert!(chunk.is_empty());
        assert_eq!(chunk.get(Coordinate::ZERO), 0);
        assert!(!chunk.set(Coordinate::ZERO, 1));
    }

    #[test]
    fn empty_chunk_with_neighbors_passes_both_predicates() {
        let chunk = Chunk::empty_with_empty_neighbors(Coordinate::ZERO, DIAMETER);
        assert!(chunk.neighbors_are_loaded());
        // the placeholder neighbors carry no neighbors of their own
        assert!(!chunk.neighbors_neighbors_are_loaded());
    }

    #[test]
    fn unloaded_chunk_rejects_writes() {
        let chunk = Chunk::unloaded(Coordinate::ZERO, DIAMETER);
        assert!(!chunk.is_loaded());
        assert!(chunk.is_empty());
        assert!(!chunk.set(Coordinate::ZERO, 2));
    }

    #[test]
    fn reads_past_the_east_face_come_from_the_east_neighbor() {
        let center = loaded_chunk(Coordinate::ZERO);
        let east = loaded_chunk(Coordinate::new(1, 0, 0));
        east.set(Coordinate::new(0, 1, 2), 3);
        // the center must hold something or it reads as empty air
        center.set(Coordinate::ZERO, 1);

        let mut neighbors = neighbors_of(Coordinate::ZERO, |c| Chunk::empty(c, DIAMETER));
        neighbors[Direction::East.index()] = east.clone();
        let center = center.with_neighbors(neighbors);

        assert_eq!(center.get(Coordinate::new(DIAMETER, 1, 2)), 3);
        assert_eq!(center.get(Coordinate::new(-1, 1, 2)), 0);
    }

    #[test]
    fn writes_past_the_below_face_land_in_the_neighbor() {
        let below = loaded_chunk(Coordinate::new(0, -1, 0));
        let mut neighbors = neighbors_of(Coordinate::ZERO, |c| Chunk::unloaded(c, DIAMETER));
        neighbors[Direction::Below.index()] = below.clone();
        let center = loaded_chunk(Coordinate::ZERO).with_neighbors(neighbors);

        assert!(center.set(Coordinate::new(1, -1, 1), 2));
        assert_eq!(below.get(Coordinate::new(1, DIAMETER - 1, 1)), 2);

        // the north neighbor is not loaded, so the write is dropped
        assert!(!center.set(Coordinate::new(1, 1, DIAMETER), 2));
    }

    #[test]
    fn writes_without_neighbors_past_the_edge_are_dropped() {
        let chunk = loaded_chunk(Coordinate::ZERO);
        assert!(!chunk.set(Coordinate::new(DIAMETER, 0, 0), 1));
    }

    #[test]
    fn neighbor_predicates_track_each_ring() {
        let ring_of_loaded = |c: Coordinate| {
            loaded_chunk(c).with_neighbors(neighbors_of(c, loaded_chunk))
        };
        let full = loaded_chunk(Coordinate::ZERO)
            .with_neighbors(neighbors_of(Coordinate::ZERO, ring_of_loaded));
        assert!(full.neighbors_are_loaded());
        assert!(full.neighbors_neighbors_are_loaded());

        let ring_with_gap = |c: Coordinate| {
            let mut second = neighbors_of(c, loaded_chunk);
            second[Direction::Above.index()] = Chunk::unloaded(c + Direction::Above.offset(), DIAMETER);
            loaded_chunk(c).with_neighbors(second)
        };
        let gapped = loaded_chunk(Coordinate::ZERO)
            .with_neighbors(neighbors_of(Coordinate::ZERO, ring_with_gap));
        assert!(gapped.neighbors_are_loaded());
        assert!(!gapped.neighbors_neighbors_are_loaded());

        assert!(!loaded_chunk(Coordinate::ZERO).neighbors_are_loaded());
    }

    #[test]
    fn loaded_chunk_reflects_storage_changes_through_shared_handles() {
        let chunk = loaded_chunk(Coordinate::ZERO);
        let view = chunk.clone();
        assert!(view.is_empty());
        chunk.set(Coordinate::new(1, 1, 1), 1);
        assert!(!view.is_empty());
        assert_eq!(view.get(Coordinate::new(1, 1, 1)), 1);
    }
}
