//! # Voxel Type Module
//!
//! The materials a voxel can be made of. Storages hold the raw [`VoxelId`]; this
//! enum is the typed view used by sources and the mesher.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// The integer type voxel materials are stored as.
pub type VoxelId = u8;

/// Enumerates the voxel materials of the terrain.
///
/// `Air` must stay zero: storages treat id 0 as "nothing here" and stay
/// unallocated until a non-zero id is written.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum VoxelType {
    /// Empty space.
    Air = 0,
    /// Solid rock.
    Stone = 1,
    /// Loose soil.
    Dirt = 2,
    /// Soil with a grass top.
    Grass = 3,
}

impl VoxelType {
    /// Converts a stored id to a voxel type.
    ///
    /// Ids with no matching material come back as `None`.
    pub fn from_id(id: VoxelId) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    /// The id this type is stored as.
    pub fn id(self) -> VoxelId {
        self as VoxelId
    }

    /// True for every material except air.
    pub fn is_solid(self) -> bool {
        self != VoxelType::Air
    }

    /// Picks a solid material from `rng`, used by procedural sources.
    pub fn random_solid(rng: &mut fastrand::Rng) -> Self {
        VoxelType::from_id(rng.u8(1..=3)).unwrap_or(VoxelType::Stone)
    }
}

impl From<VoxelType> for VoxelId {
    fn from(value: VoxelType) -> Self {
        value.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for voxel in [VoxelType::Air, VoxelType::Stone, VoxelType::Dirt, VoxelType::Grass] {
            assert_eq!(VoxelType::from_id(voxel.id()), Some(voxel));
        }
        assert_eq!(VoxelType::from_id(200), None);
    }

    #[test]
    fn random_solid_is_never_air() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            assert!(VoxelType::random_solid(&mut rng).is_solid());
        }
    }
}
