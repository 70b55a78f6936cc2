#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! Streams a chunked voxel world around a moving focus: chunk voxel data is
//! loaded or generated as it comes into range, meshed once it and its
//! neighbors are in memory, and saved and evicted as it falls out of range. All
//! of it runs on background pipelines; the caller only moves the focus.
//!
//! ## Key Modules
//!
//! * `coordinate` - Integer chunk and voxel coordinates, regions and the box-diff
//! * `voxels` - Voxel storage strategies and the cross-boundary [`Chunk`](voxels::chunk::Chunk) view
//! * `task_management` - The generic bounded-concurrency [`QueueManager`](task_management::QueueManager)
//! * `pipelines` - Load, generate, unload and mesh handlers for the queue manager
//! * `level` - The [`Level`](level::Level) that owns the focus and drives the pipelines
//! * `sources`, `mesh`, `persistence` - Voxel sources, mesh generation and chunk blob stores
//! * `config`, `error`, `core` - Configuration, error types and shared primitives
//!
//! ## Architecture
//!
//! The crate is layered leaves first:
//! * Coordinate math and voxel storage know nothing about levels
//! * The queue manager knows nothing about chunks
//! * Pipelines plug chunk semantics into the queue manager
//! * The level diffs regions and feeds the pipelines, which talk back only
//!   through typed event channels
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use voxel_streaming::config::LevelConfig;
//! use voxel_streaming::coordinate::Coordinate;
//! use voxel_streaming::level::Level;
//!
//! let mut level = Level::from_config(LevelConfig::default())?;
//! let meshes = level.events().mesh.subscribe();
//! level.initialize_around(Coordinate::new(32, 8, 32))?;
//! level.adjust_focus_to(Coordinate::new(33, 8, 32));
//! level.wait_until_idle(Duration::from_secs(60));
//! for event in meshes.try_iter() {
//!     println!("{event:?}");
//! }
//! # Ok::<(), voxel_streaming::error::LevelError>(())
//! ```

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::info;

pub mod config;
pub mod coordinate;
pub mod core;
pub mod error;
pub mod level;
pub mod mesh;
pub mod persistence;
pub mod pipelines;
pub mod sources;
pub mod task_management;
pub mod voxels;

use config::LevelConfig;
use coordinate::Coordinate;
use error::LevelError;
use level::events::MeshEvent;
use level::Level;

/// Environment variable naming a JSON level config for [`run`].
pub const CONFIG_ENV_VAR: &str = "VOXEL_STREAMING_CONFIG";

/// Steps the demo walks the focus along +x.
const DEMO_STEPS: i32 = 4;

/// How long the demo waits for the pipelines after each step.
const DEMO_STEP_TIMEOUT: Duration = Duration::from_secs(120);

/// Initialises `env_logger` on stdout, filtered by `RUST_LOG`.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");
}

/// Streams a level around a focus walking along +x and logs what the pipelines did.
pub fn run() -> Result<(), LevelError> {
    let config = match env::var(CONFIG_ENV_VAR) {
        Ok(path) => {
            info!("Loading level config from {path}");
            LevelConfig::from_json_file(path)?
        }
        Err(_) => LevelConfig::default(),
    };

    let world = config.world_region();
    let mut focus = Coordinate::new(
        (world.min.x + world.max.x) / 2,
        (world.min.y + world.max.y) / 2,
        (world.min.z + world.max.z) / 2,
    );

    let mut level = Level::from_config(config)?;
    let meshes_ready = Arc::new(AtomicUsize::new(0));
    let counter = meshes_ready.clone();
    level.events().mesh.subscribe_with(move |event: &MeshEvent| {
        if let MeshEvent::MeshReady(_) = event {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });

    level.initialize_around(focus)?;
    settle(&level, &meshes_ready);

    for _ in 0..DEMO_STEPS {
        focus += Coordinate::new(1, 0, 0);
        level.adjust_focus_to(focus);
        settle(&level, &meshes_ready);
    }

    let stats = level.queue_stats();
    info!("Load queue: {:?}", stats.load);
    info!("Generate queue: {:?}", stats.generate);
    info!("Unload queue: {:?}", stats.unload);
    info!("Mesh queue: {:?}", stats.mesh);
    Ok(())
}

fn settle(level: &Level, meshes_ready: &AtomicUsize) {
    let idle = level.wait_until_idle(DEMO_STEP_TIMEOUT);
    info!(
        "Focus {} settled (idle: {idle}): {} chunks loaded, {} meshes stored, {} meshes published",
        level.focus(),
        level.storage().loaded_count(),
        level.storage().mesh_count(),
        meshes_ready.load(Ordering::Relaxed)
    );
}
