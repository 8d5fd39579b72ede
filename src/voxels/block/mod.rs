//! # Block Module
//!
//! Blocks are polymorphic: a chunk slot owns a boxed instance behind the
//! [`Block`] capability trait, and the [`registry`](crate::voxels::block::registry)
//! lets callers add new kinds at runtime by name. The built-in terrain kinds
//! are all [`BasicBlock`]s, unit cubes that differ only in their per-side
//! atlas tiles.

use crate::render::MeshData;
use crate::voxels::coords::BlockCoord;
use crate::voxels::world::World;

pub mod block_side;
pub mod face_mesh;
pub mod registry;
pub mod standard;

use block_side::BlockSide;
use face_mesh::{face_mesh, TileId};

/// Integer handle identifying a registered block kind.
pub type BlockHandle = i32;

/// Sentinel returned when a name lookup finds nothing. Negative, so it never
/// collides with a registered handle.
pub const INVALID_HANDLE: BlockHandle = -1;

/// A dropped inventory item: the minimal "block breaks into item" hook.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// The block kind this item places back.
    pub block: BlockHandle,
    /// Stack size.
    pub count: u32,
}

/// The capability surface every block variant implements.
///
/// Instances are owned exclusively by their containing chunk slot; all
/// methods take `&self` so meshing can run over a shared chunk snapshot.
pub trait Block: Send + Sync {
    /// The registry handle of this block's kind.
    fn handle(&self) -> BlockHandle;

    /// Whether this block occludes the face of a neighboring block. Governs
    /// face culling. The base notion of a block is non-solid; terrain cubes
    /// override.
    fn is_solid(&self) -> bool {
        false
    }

    /// Geometry for one face of this block at its global coordinate: a unit
    /// quad, 4 vertices and 6 indices, wound outward.
    fn mesh(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord, side: BlockSide) -> MeshData;

    /// Removal hook, invoked exactly once after the block has been detached
    /// from its chunk slot. May produce an inventory item; producing nothing
    /// is equally valid, and is the default.
    fn on_break(&self, world: &World, x: BlockCoord, y: BlockCoord, z: BlockCoord) -> Option<Item> {
        let _ = (world, x, y, z);
        None
    }
}

/// Atlas tile assignment for the six faces of a cube block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockTexture {
    /// +z face tile.
    pub top: TileId,
    /// -z face tile.
    pub bottom: TileId,
    /// -y face tile.
    pub front: TileId,
    /// +y face tile.
    pub back: TileId,
    /// -x face tile.
    pub left: TileId,
    /// +x face tile.
    pub right: TileId,
}

impl BlockTexture {
    /// The same tile on all six faces.
    pub const fn uniform(tile: TileId) -> Self {
        BlockTexture {
            top: tile,
            bottom: tile,
            front: tile,
            back: tile,
            left: tile,
            right: tile,
        }
    }

    /// Distinct top and bottom, shared side tile: the grass-block shape.
    pub const fn capped(top: TileId, bottom: TileId, sides: TileId) -> Self {
        BlockTexture {
            top,
            bottom,
            front: sides,
            back: sides,
            left: sides,
            right: sides,
        }
    }

    /// The tile mapped to one face.
    pub const fn for_side(&self, side: BlockSide) -> TileId {
        match side {
            BlockSide::Top => self.top,
            BlockSide::Bottom => self.bottom,
            BlockSide::Front => self.front,
            BlockSide::Back => self.back,
            BlockSide::Left => self.left,
            BlockSide::Right => self.right,
        }
    }
}

/// An ordinary solid terrain cube. All built-in kinds are `BasicBlock`s
/// differing only in texture; breaking one drops a single item of itself.
pub struct BasicBlock {
    handle: BlockHandle,
    texture: BlockTexture,
}

impl BasicBlock {
    /// A cube of kind `handle` textured by `texture`.
    pub fn new(handle: BlockHandle, texture: BlockTexture) -> Self {
        BasicBlock { handle, texture }
    }
}

impl Block for BasicBlock {
    fn handle(&self) -> BlockHandle {
        self.handle
    }

    fn is_solid(&self) -> bool {
        true
    }

    fn mesh(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord, side: BlockSide) -> MeshData {
        face_mesh(x, y, z, self.texture.for_side(side), side)
    }

    fn on_break(
        &self,
        _world: &World,
        _x: BlockCoord,
        _y: BlockCoord,
        _z: BlockCoord,
    ) -> Option<Item> {
        Some(Item {
            block: self.handle,
            count: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_block_is_solid_and_textured_per_side() {
        let texture = BlockTexture::capped(2, 1, 3);
        let block = BasicBlock::new(7, texture);

        assert!(block.is_solid());
        assert_eq!(block.handle(), 7);
        assert_eq!(texture.for_side(BlockSide::Top), 2);
        assert_eq!(texture.for_side(BlockSide::Bottom), 1);
        assert_eq!(texture.for_side(BlockSide::Left), 3);

        let mesh = block.mesh(0, 0, 0, BlockSide::Top);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
    }
}
