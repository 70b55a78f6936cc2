use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace};

use crate::coordinate::Coordinate;
use crate::error::PipelineError;
use crate::level::events::LoadEvent;
use crate::persistence::encode_voxels;
use crate::task_management::QueueHandler;

use super::LevelContext;

/// Saves chunk voxels and drops them, and the chunk's mesh, from memory.
///
/// Empty chunks are not saved, since the source regenerates them identically.
/// A chunk that is back in the loaded region by the time it is saved stays in
/// memory.
#[derive(Debug)]
pub struct UnloadHandler {
    context: Arc<LevelContext>,
}

impl UnloadHandler {
    /// Creates the handler.
    pub fn new(context: Arc<LevelContext>) -> Self {
        UnloadHandler { context }
    }
}

impl QueueHandler for UnloadHandler {
    type Item = Coordinate;
    type Error = PipelineError;

    fn name(&self) -> &str {
        "chunk-unload"
    }

    fn sort_queue(&self, queue: &mut VecDeque<Coordinate>) {
        self.context.sort_by_focus_distance(queue);
    }

    fn do_work(&self, location: Coordinate) -> Result<(), PipelineError> {
        let context = &self.context;
        if let Some(voxels) = context.storage.voxels(location) {
            let blob = {
                let voxels = voxels.get();
                if voxels.is_empty() {
                    None
                } else {
                    Some(encode_voxels(voxels.as_ref())?)
                }
            };
            if let Some(blob) = blob {
                context.blobs.write(context.seed(), location, &blob)?;
                trace!("Saved chunk {location}");
            }
        }

        if context.evict(location) {
            context.events.load.notify(LoadEvent::DataUnloaded(location));
        } else {
            debug!("Chunk {location} came back into the loaded region while unloading; kept");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{ChunkBlobStore, MemoryBlobStore};
    use crate::pipelines::test_support::{context, refocus};
    use crate::pipelines::GenerateHandler;

    #[test]
    fn unloading_saves_solid_chunks_and_frees_them() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = context(blobs.clone());
        GenerateHandler::new(context.clone()).do_work(Coordinate::ZERO).unwrap();
        let events = context.events.load.subscribe();
        refocus(&context, Coordinate::new(6, 0, 6));

        UnloadHandler::new(context.clone()).do_work(Coordinate::ZERO).unwrap();

        assert!(blobs.exists(context.seed(), Coordinate::ZERO));
        assert!(!context.storage.has_voxels(Coordinate::ZERO));
        assert_eq!(events.try_recv(), Ok(LoadEvent::DataUnloaded(Coordinate::ZERO)));
    }

    #[test]
    fn chunks_back_in_range_are_saved_but_kept() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = context(blobs.clone());
        GenerateHandler::new(context.clone()).do_work(Coordinate::ZERO).unwrap();
        let events = context.events.load.subscribe();

        UnloadHandler::new(context.clone()).do_work(Coordinate::ZERO).unwrap();

        assert!(blobs.exists(context.seed(), Coordinate::ZERO));
        assert!(context.storage.has_voxels(Coordinate::ZERO));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn empty_chunks_are_not_saved() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let context = context(blobs.clone());
        let sky = Coordinate::new(0, 2, 0);
        GenerateHandler::new(context.clone()).do_work(sky).unwrap();
        refocus(&context, Coordinate::new(6, 0, 6));

        UnloadHandler::new(context.clone()).do_work(sky).unwrap();

        assert!(blobs.is_empty());
        assert!(!context.storage.has_voxels(sky));
    }
}
