use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::coordinate::Coordinate;
use crate::error::PipelineError;
use crate::level::events::LoadEvent;
use crate::persistence::decode_voxels;
use crate::task_management::{InvalidReason, QueueHandler};
use crate::voxels::chunk::VoxelHandle;

use super::{LevelContext, StoreOutcome};

/// Loads chunk voxels from persisted blobs.
///
/// Chunks without a blob are rejected and published as
/// [`LoadEvent::DataNotFound`]. Canceled chunks are dropped silently.
#[derive(Debug)]
pub struct LoadHandler {
    context: Arc<LevelContext>,
}

impl LoadHandler {
    /// Creates the handler.
    pub fn new(context: Arc<LevelContext>) -> Self {
        LoadHandler { context }
    }
}

impl QueueHandler for LoadHandler {
    type Item = Coordinate;
    type Error = PipelineError;

    fn name(&self) -> &str {
        "chunk-load"
    }

    fn is_valid(&self, location: &Coordinate) -> bool {
        self.context.blobs.exists(self.context.seed(), *location)
    }

    fn on_invalid(&self, location: Coordinate, reason: InvalidReason) {
        if reason == InvalidReason::Rejected {
            trace!("No saved data for chunk {location}");
            self.context.events.load.notify(LoadEvent::DataNotFound(location));
        }
    }

    fn sort_queue(&self, queue: &mut VecDeque<Coordinate>) {
        self.context.sort_by_focus_distance(queue);
    }

    fn do_work(&self, location: Coordinate) -> Result<(), PipelineError> {
        let context = &self.context;
        if context.storage.has_voxels(location) {
            warn!("Tried to load voxels for already loaded chunk {location}");
            return Ok(());
        }

        let bytes = context.blobs.read(context.seed(), location)?;
        let mut voxels = context.config.storage.create(context.config.chunk_bounds());
        decode_voxels(&bytes, voxels.as_mut())?;

        match context.store_voxels(location, VoxelHandle::new(voxels))? {
            StoreOutcome::Stored => context.events.load.notify(LoadEvent::DataLoaded(location)),
            StoreOutcome::AlreadyStored => warn!("Chunk {location} was loaded by another job first"),
            StoreOutcome::Stale => debug!("Chunk {location} left the loaded region while loading"),
        }
        Ok(())
    }
}
