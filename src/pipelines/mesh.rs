use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, trace};

use crate::coordinate::Coordinate;
use crate::error::PipelineError;
use crate::level::events::MeshEvent;
use crate::task_management::QueueHandler;

use super::{LevelContext, StoreOutcome};

/// Rings of neighbors that must be loaded before a chunk is meshed.
const MESH_RINGS: i32 = 2;

/// Builds meshes for chunks whose data and two rings of neighbors are loaded.
#[derive(Debug)]
pub struct MeshHandler {
    context: Arc<LevelContext>,
}

impl MeshHandler {
    /// Creates the handler.
    pub fn new(context: Arc<LevelContext>) -> Self {
        MeshHandler { context }
    }
}

impl QueueHandler for MeshHandler {
    type Item = Coordinate;
    type Error = PipelineError;

    fn name(&self) -> &str {
        "chunk-mesh"
    }

    /// Loaded chunks with nothing in them never need a mesh.
    fn is_valid(&self, location: &Coordinate) -> bool {
        let chunk = self.context.get_chunk(*location, false, false, false, false);
        !(chunk.is_loaded() && chunk.is_empty())
    }

    fn is_ready(&self, location: &Coordinate) -> bool {
        self.context.rings_are_loaded(*location, MESH_RINGS)
    }

    fn sort_queue(&self, queue: &mut VecDeque<Coordinate>) {
        self.context.sort_by_focus_distance(queue);
    }

    fn do_work(&self, location: Coordinate) -> Result<(), PipelineError> {
        let context = &self.context;
        if context.storage.mesh(location).is_none() {
            let chunk = context.get_chunk(location, false, true, true, false);
            let mesh = context.mesher.generate_mesh(&chunk);
            if !mesh.is_empty() {
                match context.store_mesh(location, Arc::new(mesh))? {
                    StoreOutcome::Stored => {
                        trace!("Stored mesh for chunk {location}");
                        context.events.mesh.notify(MeshEvent::MeshReady(location));
                    }
                    StoreOutcome::AlreadyStored => {}
                    StoreOutcome::Stale => debug!("Chunk {location} was unloaded while meshing"),
                }
            }
        }

        context
            .events
            .mesh
            .notify(MeshEvent::MeshGenerationFinished(location));
        Ok(())
    }
}
