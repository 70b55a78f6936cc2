//! # Chunk Pipelines
//!
//! The four [`QueueHandler`](crate::task_management::QueueHandler)s that move a
//! chunk through its lifecycle, all keyed by chunk coordinate:
//!
//! | Handler | Valid when | Ready when | Work |
//! |---|---|---|---|
//! | [`LoadHandler`] | a blob exists | always | decode the blob into new storage |
//! | [`GenerateHandler`] | always | always | fill new storage from the voxel source |
//! | [`UnloadHandler`] | always | always | save the voxels, drop voxels and mesh |
//! | [`MeshHandler`] | not loaded-and-empty | chunk and two rings of neighbors loaded | build and store a mesh |
//!
//! Handlers share one [`LevelContext`] and never hold each other. A load item
//! whose blob is missing is rejected, and the rejection is published as
//! [`LoadEvent::DataNotFound`](crate::level::events::LoadEvent::DataNotFound);
//! the level routes that event into the generation queue.
//!
//! Every queue is served nearest-to-focus first.
//!
//! A job may still be running when the focus moves past its chunk, and
//! cancellation only reaches queued items. Results are therefore reconciled
//! with the focus as it is when the job finishes: voxels and meshes are only
//! stored for chunks still in the loaded region, and an unload keeps a chunk
//! that came back into it. Both checks hold the focus lock, so a focus change
//! is seen either before the store or by the work it queues.

mod generate;
mod load;
mod mesh;
mod unload;

pub use generate::GenerateHandler;
pub use load::LoadHandler;
pub use mesh::MeshHandler;
pub use unload::UnloadHandler;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::LevelConfig;
use crate::coordinate::{ChunkRegion, Coordinate, Direction};
use crate::core::MtResource;
use crate::error::ChunkKeyError;
use crate::level::chunk_data_storage::ChunkDataStorage;
use crate::level::events::LevelEvents;
use crate::mesh::{Mesh, MeshGenerator};
use crate::persistence::ChunkBlobStore;
use crate::sources::VoxelSource;
use crate::voxels::chunk::{Chunk, VoxelHandle};

/// Where the level is centred and which chunks that puts in each region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    /// Current focus, in chunks.
    pub focus: Coordinate,
    /// Chunks that should have voxels in memory.
    pub loaded: ChunkRegion,
    /// Chunks that should have meshes.
    pub meshed: ChunkRegion,
    /// False until the level is first initialized.
    pub initialized: bool,
}

/// What became of a finished job's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The result was stored.
    Stored,
    /// Another job stored a result for the chunk first.
    AlreadyStored,
    /// The chunk is no longer in the loaded region, or its voxels are gone.
    Stale,
}

/// Everything the pipelines share: the level's config, chunk data, focus,
/// collaborators and event channels.
pub struct LevelContext {
    /// Validated level config.
    pub config: LevelConfig,
    /// Voxels and meshes of every chunk in memory.
    pub storage: ChunkDataStorage,
    /// Source of voxels for chunks with no blob.
    pub source: Arc<dyn VoxelSource>,
    /// Mesh builder.
    pub mesher: Arc<dyn MeshGenerator>,
    /// Persisted chunk blobs.
    pub blobs: Arc<dyn ChunkBlobStore>,
    /// Lifecycle event channels.
    pub events: LevelEvents,
    focus: MtResource<FocusState>,
}

impl fmt::Debug for LevelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelContext")
            .field("config", &self.config)
            .field("storage", &self.storage)
            .field("seed", &self.source.seed())
            .field("focus", &*self.focus.get())
            .finish_non_exhaustive()
    }
}

impl LevelContext {
    /// Bundles a level's collaborators. The config is assumed to be validated.
    pub fn new(
        config: LevelConfig,
        source: Arc<dyn VoxelSource>,
        mesher: Arc<dyn MeshGenerator>,
        blobs: Arc<dyn ChunkBlobStore>,
    ) -> Self {
        LevelContext {
            config,
            storage: ChunkDataStorage::new(),
            source,
            mesher,
            blobs,
            events: LevelEvents::new(),
            focus: MtResource::new(FocusState::default()),
        }
    }

    /// A copy of the current focus state.
    pub fn focus_state(&self) -> FocusState {
        *self.focus.get()
    }

    /// Replaces the focus state, returning the previous one.
    pub fn replace_focus_state(&self, state: FocusState) -> FocusState {
        std::mem::replace(&mut *self.focus.get_mut(), state)
    }

    /// The current focus.
    pub fn focus(&self) -> Coordinate {
        self.focus.get().focus
    }

    /// World seed of the voxel source, used to key blobs.
    pub fn seed(&self) -> i32 {
        self.source.seed()
    }

    /// Orders a backlog nearest-to-focus first.
    pub fn sort_by_focus_distance(&self, queue: &mut VecDeque<Coordinate>) {
        let focus = self.focus();
        queue
            .make_contiguous()
            .sort_by_key(|location| location.distance_squared(focus));
    }

    /// Stores freshly loaded or generated voxels if the chunk is still in the
    /// loaded region.
    pub fn store_voxels(&self, location: Coordinate, voxels: VoxelHandle) -> Result<StoreOutcome, ChunkKeyError> {
        let focus = self.focus.get();
        if !focus.loaded.contains(location) {
            return Ok(StoreOutcome::Stale);
        }
        Ok(if self.storage.insert_voxels(location, voxels)? {
            StoreOutcome::Stored
        } else {
            StoreOutcome::AlreadyStored
        })
    }

    /// Stores a mesh if its chunk is still loaded and has none yet.
    pub fn store_mesh(&self, location: Coordinate, mesh: Arc<Mesh>) -> Result<StoreOutcome, ChunkKeyError> {
        let focus = self.focus.get();
        if !focus.loaded.contains(location) || !self.storage.has_voxels(location) {
            return Ok(StoreOutcome::Stale);
        }
        Ok(if self.storage.insert_mesh_if_absent(location, mesh)? {
            StoreOutcome::Stored
        } else {
            StoreOutcome::AlreadyStored
        })
    }

    /// Drops a chunk's voxels and mesh unless it is back in the loaded region.
    /// Returns false if the chunk was kept.
    pub fn evict(&self, location: Coordinate) -> bool {
        let focus = self.focus.get();
        if focus.loaded.contains(location) {
            return false;
        }
        self.storage.remove_voxels(location);
        self.storage.remove_mesh(location);
        true
    }

    /// True if the chunk and every chunk within `rings` face steps of it have
    /// voxels in memory. Chunks outside the loaded region count as loaded, the
    /// same as their placeholders in [`get_chunk`](Self::get_chunk).
    ///
    /// This is the predicate a view built with `rings` levels of neighbors
    /// answers, without building the view.
    pub fn rings_are_loaded(&self, location: Coordinate, rings: i32) -> bool {
        let loaded = self.focus.get().loaded;
        let reach = (-rings..=rings).flat_map(move |x| {
            (-rings..=rings).flat_map(move |y| (-rings..=rings).map(move |z| Coordinate::new(x, y, z)))
        });
        self.storage.all_have_voxels(
            reach
                .filter(|offset| offset.x.abs() + offset.y.abs() + offset.z.abs() <= rings)
                .map(|offset| location + offset)
                .filter(|around| loaded.contains(*around)),
        )
    }

    /// Assembles a view of a chunk from storage.
    ///
    /// Outside the loaded region this is always the empty placeholder, whatever
    /// storage or disk hold. The flags pick what is attached:
    /// - `with_mesh`: the stored mesh, on this chunk and every neighbor view
    /// - `with_neighbors`: one ring of neighbor views
    /// - `with_neighbors_neighbors`: each neighbor carries its own ring
    /// - `full_encasement`: each of those carries a ring as well
    pub fn get_chunk(
        &self,
        location: Coordinate,
        with_mesh: bool,
        with_neighbors: bool,
        with_neighbors_neighbors: bool,
        full_encasement: bool,
    ) -> Chunk {
        let diameter = self.config.chunk_diameter;
        if !self.focus.get().loaded.contains(location) {
            return if with_neighbors {
                Chunk::empty_with_empty_neighbors(location, diameter)
            } else {
                Chunk::empty(location, diameter)
            };
        }

        let chunk = match self.storage.voxels(location) {
            Some(voxels) => Chunk::loaded(location, voxels),
            None => Chunk::unloaded(location, diameter),
        };
        let chunk = if with_mesh {
            chunk.with_mesh(self.storage.mesh(location))
        } else {
            chunk
        };

        if !with_neighbors {
            return chunk;
        }

        let neighbors = Direction::ALL.map(|direction| {
            self.get_chunk(
                location + direction.offset(),
                with_mesh,
                with_neighbors_neighbors,
                full_encasement,
                false,
            )
        });
        chunk.with_neighbors(neighbors)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::mesh::CulledMeshGenerator;
    use crate::persistence::MemoryBlobStore;
    use crate::sources::FlatPlainsSource;

    /// A context over a small world with an in-memory blob store, focused and
    /// initialized at the origin.
    pub(crate) fn context(blobs: Arc<MemoryBlobStore>) -> Arc<LevelContext> {
        let config = LevelConfig {
            chunk_diameter: 4,
            world_min: Coordinate::splat(-8),
            world_max: Coordinate::splat(8),
            meshed_chunk_diameter: 3,
            chunk_load_buffer: 2,
            chunks_below_to_mesh: 1,
            ..LevelConfig::default()
        };
        let context = LevelContext::new(
            config.clone(),
            Arc::new(FlatPlainsSource::new(1)),
            Arc::new(CulledMeshGenerator),
            blobs,
        );
        context.replace_focus_state(FocusState {
            focus: Coordinate::ZERO,
            loaded: config.loaded_region_around(Coordinate::ZERO),
            meshed: config.meshed_region_around(Coordinate::ZERO),
            initialized: true,
        });
        Arc::new(context)
    }

    /// Moves the context's focus without queueing anything.
    pub(crate) fn refocus(context: &LevelContext, focus: Coordinate) {
        context.replace_focus_state(FocusState {
            focus,
            loaded: context.config.loaded_region_around(focus),
            meshed: context.config.meshed_region_around(focus),
            initialized: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::context;
    use super::*;
    use crate::persistence::MemoryBlobStore;
    use crate::voxels::chunk::VoxelHandle;

    #[test]
    fn chunks_outside_the_loaded_region_are_empty_placeholders() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let far = Coordinate::new(6, 0, 0);
        let handle = VoxelHandle::new(context.config.storage.create(context.config.chunk_bounds()));
        handle.get_mut().set(Coordinate::ZERO, 1).unwrap();
        context.storage.insert_voxels(far, handle).unwrap();

        let chunk = context.get_chunk(far, false, false, false, false);
        assert!(chunk.is_loaded());
        assert!(chunk.is_empty());

        let with_neighbors = context.get_chunk(far, false, true, false, false);
        assert!(with_neighbors.neighbors_are_loaded());
    }

    #[test]
    fn chunks_inside_without_voxels_are_unloaded() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let chunk = context.get_chunk(Coordinate::ZERO, false, true, true, false);
        assert!(!chunk.is_loaded());
        assert!(!chunk.neighbors_are_loaded());
    }

    #[test]
    fn neighbor_depth_follows_the_flags() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let one_ring = context.get_chunk(Coordinate::ZERO, false, true, false, false);
        let east = one_ring.neighbor(Direction::East).unwrap();
        assert!(east.neighbor(Direction::East).is_none());

        let two_rings = context.get_chunk(Coordinate::ZERO, false, true, true, false);
        let east = two_rings.neighbor(Direction::East).unwrap();
        let east_east = east.neighbor(Direction::East).unwrap();
        assert!(east_east.neighbor(Direction::East).is_none());

        let encased = context.get_chunk(Coordinate::ZERO, false, true, true, true);
        let east_east = encased
            .neighbor(Direction::East)
            .and_then(|east| east.neighbor(Direction::East))
            .unwrap();
        assert!(east_east.neighbor(Direction::East).is_some());
    }

    fn voxels_at(context: &LevelContext, solid: bool) -> VoxelHandle {
        let handle = VoxelHandle::new(context.config.storage.create(context.config.chunk_bounds()));
        if solid {
            handle.get_mut().set(Coordinate::ZERO, 1).unwrap();
        }
        handle
    }

    #[test]
    fn voxels_are_only_stored_inside_the_loaded_region() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let far = Coordinate::new(6, 0, 0);

        assert_eq!(context.store_voxels(far, voxels_at(&context, true)), Ok(StoreOutcome::Stale));
        assert!(!context.storage.has_voxels(far));

        assert_eq!(
            context.store_voxels(Coordinate::ZERO, voxels_at(&context, true)),
            Ok(StoreOutcome::Stored)
        );
        assert_eq!(
            context.store_voxels(Coordinate::ZERO, voxels_at(&context, false)),
            Ok(StoreOutcome::AlreadyStored)
        );
    }

    #[test]
    fn meshes_need_loaded_voxels() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let mesh = Arc::new(Mesh::new());

        assert_eq!(context.store_mesh(Coordinate::ZERO, mesh.clone()), Ok(StoreOutcome::Stale));
        context.store_voxels(Coordinate::ZERO, voxels_at(&context, true)).unwrap();
        assert_eq!(context.store_mesh(Coordinate::ZERO, mesh.clone()), Ok(StoreOutcome::Stored));
        assert_eq!(context.store_mesh(Coordinate::ZERO, mesh), Ok(StoreOutcome::AlreadyStored));
    }

    #[test]
    fn eviction_keeps_chunks_back_in_range() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        context.store_voxels(Coordinate::ZERO, voxels_at(&context, true)).unwrap();

        assert!(!context.evict(Coordinate::ZERO));
        assert!(context.storage.has_voxels(Coordinate::ZERO));

        test_support::refocus(&context, Coordinate::new(5, 0, 5));
        assert!(context.evict(Coordinate::ZERO));
        assert!(!context.storage.has_voxels(Coordinate::ZERO));
    }

    #[test]
    fn ring_check_matches_the_neighbor_view() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let loaded = context.focus_state().loaded;
        let locations = [
            Coordinate::ZERO,
            Coordinate::new(1, 0, 0),
            Coordinate::new(-1, -1, 1),
            Coordinate::new(2, 0, -2),
        ];
        let agree = |context: &LevelContext| {
            for location in locations {
                let view = context.get_chunk(location, false, true, true, false);
                assert_eq!(
                    context.rings_are_loaded(location, 2),
                    view.is_loaded() && view.neighbors_neighbors_are_loaded(),
                    "at {location}"
                );
            }
        };

        agree(&context);
        // fill half the region, then all of it
        for location in loaded.iter().filter(|c| c.x <= 0) {
            context.store_voxels(location, voxels_at(&context, false)).unwrap();
        }
        agree(&context);
        for location in loaded.iter() {
            let _ = context.store_voxels(location, voxels_at(&context, false));
        }
        agree(&context);
        assert!(context.rings_are_loaded(Coordinate::ZERO, 2));
    }

    #[test]
    fn backlog_sorts_nearest_first() {
        let context = context(Arc::new(MemoryBlobStore::new()));
        let mut queue: VecDeque<Coordinate> = [
            Coordinate::new(2, 0, 0),
            Coordinate::new(0, 0, 0),
            Coordinate::new(-1, 1, 0),
        ]
        .into_iter()
        .collect();
        context.sort_by_focus_distance(&mut queue);
        assert_eq!(
            queue,
            [
                Coordinate::new(0, 0, 0),
                Coordinate::new(-1, 1, 0),
                Coordinate::new(2, 0, 0)
            ]
        );
    }
}
