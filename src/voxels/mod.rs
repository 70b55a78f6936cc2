//! # Voxels
//!
//! Voxel data and the views over it.
//!
//! * [`voxel_type`] - material ids and the [`VoxelType`](voxel_type::VoxelType) enum
//! * [`storage`] - per-chunk voxel grids behind the [`VoxelStorage`](storage::VoxelStorage) trait
//! * [`chunk`] - the [`Chunk`](chunk::Chunk) view with cross-boundary neighbor access

pub mod chunk;
pub mod storage;
pub mod voxel_type;
