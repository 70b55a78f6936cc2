//! # Level
//!
//! A [`Level`] streams a voxel world around a moving focus. It owns the chunk
//! data, the focus and its two regions, and four pipelines:
//!
//! ```text
//!   initialize_around / adjust_focus_to
//!        |                |              |
//!        v                v              v
//!     [load] --not found--> [generate]  [unload]
//!        \                   /
//!         `--- DataLoaded --'
//!                 |
//!                 v
//!              [mesh] --MeshReady--> renderer
//! ```
//!
//! ## Regions
//!
//! The loaded region is a prism [`loaded_chunk_diameter`] chunks wide on x and z,
//! reaching from [`chunks_below_to_load`] under the focus up to the world ceiling.
//! The meshed region is the same shape built from the mesh settings, and since
//! the load settings are the mesh settings plus a buffer, it always sits inside
//! the loaded region. Both are clamped to the world.
//!
//! ## Focus Changes
//!
//! Moving the focus diffs old regions against new ones:
//! - chunks entering the loaded region are queued to load, and their pending unloads canceled
//! - chunks leaving it are queued to unload, and their pending loads and generations canceled
//! - chunks entering the meshed region are queued to mesh
//! - chunks leaving it have pending mesh work canceled and are announced with
//!   [`MeshEvent::ChunksLeftMeshRegion`]. Their meshes stay stored until unload.
//!
//! None of this blocks: the level only queues work, and the pipelines report
//! back through [`LevelEvents`]. Jobs already running when the focus moves
//! check the new focus before storing or evicting, so their results never
//! outlive the move.
//!
//! [`loaded_chunk_diameter`]: crate::config::LevelConfig::loaded_chunk_diameter
//! [`chunks_below_to_load`]: crate::config::LevelConfig::chunks_below_to_load

pub mod chunk_data_storage;
pub mod events;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use web_time::Instant;

use crate::config::LevelConfig;
use crate::coordinate::{ChunkRegion, Coordinate};
use crate::error::LevelError;
use crate::mesh::{CulledMeshGenerator, MeshGenerator};
use crate::persistence::{ChunkBlobStore, FileBlobStore};
use crate::pipelines::{
    FocusState, GenerateHandler, LevelContext, LoadHandler, MeshHandler, UnloadHandler,
};
use crate::sources::VoxelSource;
use crate::task_management::{QueueManager, QueueStats};
use crate::voxels::chunk::Chunk;
use crate::voxels::voxel_type::VoxelId;

use chunk_data_storage::ChunkDataStorage;
use events::{LevelEvents, LoadEvent, MeshEvent};

/// The chunks a focus change queued or announced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusChange {
    /// Chunks queued for loading.
    pub to_load: Vec<Coordinate>,
    /// Chunks queued for unloading.
    pub to_unload: Vec<Coordinate>,
    /// Chunks queued for meshing.
    pub to_mesh: Vec<Coordinate>,
    /// Chunks that left the meshed region.
    pub left_mesh: Vec<Coordinate>,
}

impl FocusChange {
    /// True if nothing was queued or announced.
    pub fn is_empty(&self) -> bool {
        self.to_load.is_empty()
            && self.to_unload.is_empty()
            && self.to_mesh.is_empty()
            && self.left_mesh.is_empty()
    }
}

/// Counters of each pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelQueueStats {
    /// Blob loading.
    pub load: QueueStats,
    /// Voxel generation.
    pub generate: QueueStats,
    /// Saving and freeing.
    pub unload: QueueStats,
    /// Mesh generation.
    pub mesh: QueueStats,
}

/// A streamed voxel world.
pub struct Level {
    context: Arc<LevelContext>,
    load: QueueManager<LoadHandler>,
    generate: QueueManager<GenerateHandler>,
    unload: QueueManager<UnloadHandler>,
    mesh: QueueManager<MeshHandler>,
}

impl Level {
    /// Builds a level and starts its pipelines.
    pub fn new(
        config: LevelConfig,
        source: Arc<dyn VoxelSource>,
        mesher: Arc<dyn MeshGenerator>,
        blobs: Arc<dyn ChunkBlobStore>,
    ) -> Result<Self, LevelError> {
        config.validate()?;
        let concurrency = config.max_concurrent_jobs;
        let poll_interval = config.readiness_poll_interval();
        let context = Arc::new(LevelContext::new(config, source, mesher, blobs));

        let load = QueueManager::new(LoadHandler::new(context.clone()), concurrency, poll_interval)?;
        let generate =
            QueueManager::new(GenerateHandler::new(context.clone()), concurrency, poll_interval)?;
        let unload =
            QueueManager::new(UnloadHandler::new(context.clone()), concurrency, poll_interval)?;
        let mesh = QueueManager::new(MeshHandler::new(context.clone()), concurrency, poll_interval)?;

        let generate_queue = generate.handle();
        let mesh_queue = mesh.handle();
        let weak_context = Arc::downgrade(&context);
        context.events.load.subscribe_with(move |event: &LoadEvent| match event {
            LoadEvent::DataNotFound(location) => {
                generate_queue.enqueue([*location], true);
            }
            LoadEvent::DataLoaded(location) => {
                let in_mesh_region = weak_context
                    .upgrade()
                    .is_some_and(|context| context.focus_state().meshed.contains(*location));
                if in_mesh_region {
                    mesh_queue.enqueue([*location], true);
                }
                // neighbors of this chunk may have just become ready
                mesh_queue.wake();
            }
            LoadEvent::DataUnloaded(_) => {}
        });

        Ok(Level {
            context,
            load,
            generate,
            unload,
            mesh,
        })
    }

    /// Builds a level from its config alone: the configured voxel source, the
    /// face-culling mesher and a file blob store under `save_directory`.
    pub fn from_config(config: LevelConfig) -> Result<Self, LevelError> {
        let source: Arc<dyn VoxelSource> = Arc::from(config.source.build());
        let blobs = Arc::new(FileBlobStore::new(config.save_directory.clone()));
        Level::new(config, source, Arc::new(CulledMeshGenerator), blobs)
    }

    /// Centres the level on `focus` for the first time and queues every chunk
    /// of both regions.
    pub fn initialize_around(&mut self, focus: Coordinate) -> Result<FocusChange, LevelError> {
        if self.is_initialized() {
            return Err(LevelError::AlreadyInitialized);
        }

        let state = self.focus_state_at(focus);
        self.context.replace_focus_state(state);

        let change = FocusChange {
            to_load: state.loaded.iter().collect(),
            to_mesh: state.meshed.iter().collect(),
            ..FocusChange::default()
        };
        self.load.enqueue(change.to_load.iter().copied(), true);
        self.mesh.enqueue(change.to_mesh.iter().copied(), true);

        info!(
            "Level initialized around {focus}: loading {} chunks in {}, meshing {} chunks in {}",
            change.to_load.len(),
            state.loaded,
            change.to_mesh.len(),
            state.meshed
        );
        Ok(change)
    }

    /// Moves the focus and queues the work the move implies.
    ///
    /// Does nothing before [`initialize_around`](Self::initialize_around) or if
    /// the focus did not change.
    pub fn adjust_focus_to(&mut self, focus: Coordinate) -> FocusChange {
        let previous = self.context.focus_state();
        if !previous.initialized || previous.focus == focus {
            return FocusChange::default();
        }

        let state = self.focus_state_at(focus);
        self.context.replace_focus_state(state);

        let change = FocusChange {
            to_load: state.loaded.difference(&previous.loaded),
            to_unload: previous.loaded.difference(&state.loaded),
            to_mesh: state.meshed.difference(&previous.meshed),
            left_mesh: previous.meshed.difference(&state.meshed),
        };

        self.unload.dequeue(change.to_load.iter().copied());
        self.load.enqueue(change.to_load.iter().copied(), false);

        self.load.dequeue(change.to_unload.iter().copied());
        self.generate.dequeue(change.to_unload.iter().copied());
        self.unload.enqueue(change.to_unload.iter().copied(), false);

        self.mesh.dequeue(change.left_mesh.iter().copied());
        self.mesh.enqueue(change.to_mesh.iter().copied(), false);

        // every backlog is ordered by distance to the new focus
        self.load.sort();
        self.generate.sort();
        self.unload.sort();
        self.mesh.sort();

        if !change.left_mesh.is_empty() {
            self.context
                .events
                .mesh
                .notify(MeshEvent::ChunksLeftMeshRegion(change.left_mesh.clone()));
        }

        info!(
            "Focus moved {} -> {focus}: {} to load, {} to unload, {} to mesh, {} left the mesh region",
            previous.focus,
            change.to_load.len(),
            change.to_unload.len(),
            change.to_mesh.len(),
            change.left_mesh.len()
        );
        change
    }

    fn focus_state_at(&self, focus: Coordinate) -> FocusState {
        let config = &self.context.config;
        FocusState {
            focus,
            loaded: config.loaded_region_around(focus),
            meshed: config.meshed_region_around(focus),
            initialized: true,
        }
    }

    /// See [`LevelContext::get_chunk`].
    pub fn get_chunk(
        &self,
        location: Coordinate,
        with_mesh: bool,
        with_neighbors: bool,
        with_neighbors_neighbors: bool,
        full_encasement: bool,
    ) -> Chunk {
        self.context.get_chunk(
            location,
            with_mesh,
            with_neighbors,
            with_neighbors_neighbors,
            full_encasement,
        )
    }

    /// Reads a voxel of a chunk. Locations past the chunk's edges read from its neighbors.
    pub fn voxel(&self, chunk: Coordinate, local: Coordinate) -> VoxelId {
        self.get_chunk(chunk, false, true, false, false).get(local)
    }

    /// Writes a voxel of a chunk, following neighbors past its edges. Returns
    /// false if the target chunk is not loaded.
    pub fn set_voxel(&self, chunk: Coordinate, local: Coordinate, voxel: VoxelId) -> bool {
        let written = self.get_chunk(chunk, false, true, false, false).set(local, voxel);
        debug!("Set voxel {local} of chunk {chunk} to {voxel}: {written}");
        written
    }

    /// The current focus.
    pub fn focus(&self) -> Coordinate {
        self.context.focus()
    }

    /// The region of chunks kept in memory.
    pub fn loaded_bounds(&self) -> ChunkRegion {
        self.context.focus_state().loaded
    }

    /// The region of chunks kept meshed.
    pub fn meshed_bounds(&self) -> ChunkRegion {
        self.context.focus_state().meshed
    }

    /// True once [`initialize_around`](Self::initialize_around) has run.
    pub fn is_initialized(&self) -> bool {
        self.context.focus_state().initialized
    }

    /// The level's config.
    pub fn config(&self) -> &LevelConfig {
        &self.context.config
    }

    /// The lifecycle event channels.
    pub fn events(&self) -> &LevelEvents {
        &self.context.events
    }

    /// The chunk voxels and meshes in memory.
    pub fn storage(&self) -> &ChunkDataStorage {
        &self.context.storage
    }

    /// A snapshot of every pipeline's counters.
    pub fn queue_stats(&self) -> LevelQueueStats {
        LevelQueueStats {
            load: self.load.stats(),
            generate: self.generate.stats(),
            unload: self.unload.stats(),
            mesh: self.mesh.stats(),
        }
    }

    /// True if no pipeline has queued or running work.
    pub fn is_idle(&self) -> bool {
        self.load.is_idle() && self.generate.is_idle() && self.unload.is_idle() && self.mesh.is_idle()
    }

    /// Blocks until every pipeline is idle at once or `timeout` passes.
    /// Returns true if idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.load.wait_until_idle(remaining);
            self.generate.wait_until_idle(deadline.saturating_duration_since(Instant::now()));
            self.unload.wait_until_idle(deadline.saturating_duration_since(Instant::now()));
            self.mesh.wait_until_idle(deadline.saturating_duration_since(Instant::now()));

            // a finished load can queue generation or mesh work after its queue went idle
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
        }
    }

    /// Stops every pipeline, letting running jobs finish. Queued work is dropped.
    pub fn shutdown(&self) {
        self.load.shutdown();
        self.generate.shutdown();
        self.mesh.shutdown();
        self.unload.shutdown();
    }
}

impl Drop for Level {
    fn drop(&mut self) {
        self.shutdown();
    }
}
