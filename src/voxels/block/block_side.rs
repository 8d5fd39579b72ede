//! The six faces of a voxel block.

use num_derive::FromPrimitive;

use crate::voxels::coords::BlockCoord;

/// One face of a unit block, in a z-up world.
///
/// The discriminants double as the chunk adjacency slot index: the neighbor
/// chunk beyond a face lives in `adjacent[side as usize]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockSide {
    /// The +z face.
    Top = 0,
    /// The -z face.
    Bottom = 1,
    /// The -y face.
    Front = 2,
    /// The +y face.
    Back = 3,
    /// The -x face.
    Left = 4,
    /// The +x face.
    Right = 5,
}

impl BlockSide {
    /// Every face, in slot order.
    pub const fn all() -> [BlockSide; 6] {
        [
            BlockSide::Top,
            BlockSide::Bottom,
            BlockSide::Front,
            BlockSide::Back,
            BlockSide::Left,
            BlockSide::Right,
        ]
    }

    /// The outward unit offset of this face: stepping by it from a block
    /// lands on the block this face looks at.
    pub const fn offset(self) -> (BlockCoord, BlockCoord, BlockCoord) {
        match self {
            BlockSide::Top => (0, 0, 1),
            BlockSide::Bottom => (0, 0, -1),
            BlockSide::Front => (0, -1, 0),
            BlockSide::Back => (0, 1, 0),
            BlockSide::Left => (-1, 0, 0),
            BlockSide::Right => (1, 0, 0),
        }
    }

    /// The face on the other side of the block.
    pub const fn opposite(self) -> BlockSide {
        match self {
            BlockSide::Top => BlockSide::Bottom,
            BlockSide::Bottom => BlockSide::Top,
            BlockSide::Front => BlockSide::Back,
            BlockSide::Back => BlockSide::Front,
            BlockSide::Left => BlockSide::Right,
            BlockSide::Right => BlockSide::Left,
        }
    }

    /// Maps a unit offset back to the face pointing that way. Non-unit and
    /// diagonal offsets have no face.
    pub fn from_offset(dx: BlockCoord, dy: BlockCoord, dz: BlockCoord) -> Option<BlockSide> {
        BlockSide::all()
            .into_iter()
            .find(|side| side.offset() == (dx, dy, dz))
    }

    /// Face for an adjacency slot index.
    pub fn from_index(index: usize) -> Option<BlockSide> {
        num::FromPrimitive::from_usize(index)
    }
}
