//! # Voxel Streaming Demo
//!
//! Streams a level around a focus that walks a few chunks along +x, logging
//! what the pipelines did. Set `VOXEL_STREAMING_CONFIG` to a JSON level config
//! to change the world, and `RUST_LOG` to see more.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

use std::process;

use log::error;

fn main() {
    voxel_streaming::init_logging();

    if let Err(err) = voxel_streaming::run() {
        error!("{err}");
        process::exit(1);
    }
}
