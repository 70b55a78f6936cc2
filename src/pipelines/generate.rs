use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, warn};

use crate::coordinate::Coordinate;
use crate::error::PipelineError;
use crate::level::events::LoadEvent;
use crate::task_management::QueueHandler;
use crate::voxels::chunk::VoxelHandle;

use super::{LevelContext, StoreOutcome};

/// Generates chunk voxels from the level's voxel source.
#[derive(Debug)]
pub struct GenerateHandler {
    context: Arc<LevelContext>,
}

impl GenerateHandler {
    /// Creates the handler.
    pub fn new(context: Arc<LevelContext>) -> Self {
        GenerateHandler { context }
    }
}

impl QueueHandler for GenerateHandler {
    type Item = Coordinate;
    type Error = PipelineError;

    fn name(&self) -> &str {
        "chunk-generate"
    }

    fn sort_queue(&self, queue: &mut VecDeque<Coordinate>) {
        self.context.sort_by_focus_distance(queue);
    }

    fn do_work(&self, location: Coordinate) -> Result<(), PipelineError> {
        let context = &self.context;
        if context.storage.has_voxels(location) {
            warn!("Tried to generate voxels for already loaded chunk {location}");
            return Ok(());
        }

        let mut voxels = context.config.storage.create(context.config.chunk_bounds());
        context.source.generate_all_at(location, voxels.as_mut())?;

        match context.store_voxels(location, VoxelHandle::new(voxels))? {
            StoreOutcome::Stored => context.events.load.notify(LoadEvent::DataLoaded(location)),
            StoreOutcome::AlreadyStored => warn!("Chunk {location} was loaded by another job first"),
            StoreOutcome::Stale => debug!("Chunk {location} left the loaded region while generating"),
        }
        Ok(())
    }
}
