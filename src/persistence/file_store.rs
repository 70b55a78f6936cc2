use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::trace;

use crate::coordinate::Coordinate;
use crate::error::PersistenceError;

use super::ChunkBlobStore;

/// Extension of chunk blob files.
pub const BLOB_EXTENSION: &str = "vxch";

/// Stores one file per chunk under `{root}/{seed}/{x}.{y}.{z}.vxch`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Creates a store rooted at `root`. Directories are created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileBlobStore { root: root.into() }
    }

    /// The directory holding every seed's blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a chunk's blob lives in.
    pub fn path_for(&self, seed: i32, location: Coordinate) -> PathBuf {
        self.root.join(seed.to_string()).join(format!(
            "{}.{}.{}.{}",
            location.x, location.y, location.z, BLOB_EXTENSION
        ))
    }
}

impl ChunkBlobStore for FileBlobStore {
    fn exists(&self, seed: i32, location: Coordinate) -> bool {
        self.path_for(seed, location).is_file()
    }

    fn read(&self, seed: i32, location: Coordinate) -> Result<Vec<u8>, PersistenceError> {
        let path = self.path_for(seed, location);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(PersistenceError::Missing { seed, location })
            }
            Err(error) => Err(error.into()),
        }
    }

    fn write(&self, seed: i32, location: Coordinate, blob: &[u8]) -> Result<(), PersistenceError> {
        let path = self.path_for(seed, location);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // readers never observe a partially written blob
        let staging = path.with_extension("tmp");
        fs::write(&staging, blob)?;
        fs::rename(&staging, &path)?;
        trace!("Wrote {} bytes to {}", blob.len(), path.display());
        Ok(())
    }
}
