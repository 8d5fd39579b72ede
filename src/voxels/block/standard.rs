//! The built-in terrain block set and the texture-atlas name index.

use std::collections::HashMap;

use crate::voxels::block::face_mesh::TileId;
use crate::voxels::block::{BlockHandle, BlockTexture};
use crate::voxels::block::registry::BlockRegistry;

/// Name-to-tile mapping for a loaded texture atlas.
///
/// The atlas itself (image decoding, GPU upload) belongs to the host; the
/// core only ever speaks tile ids. Unknown names map to tile 0, which by
/// convention holds the "missing texture" placeholder.
#[derive(Default, Debug, Clone)]
pub struct AtlasIndex {
    by_name: HashMap<String, TileId>,
}

impl AtlasIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index assigning sequential tile ids in name order, the way
    /// a texture loader that packs tiles left to right would.
    pub fn from_names(names: &[&str]) -> Self {
        let mut index = Self::new();
        for (tile, name) in names.iter().enumerate() {
            index.insert(name, tile as TileId);
        }
        index
    }

    /// Maps a texture name to a tile id.
    pub fn insert(&mut self, name: &str, tile: TileId) {
        self.by_name.insert(name.to_owned(), tile);
    }

    /// The tile for a name; tile 0 (the placeholder) when unknown.
    pub fn tile(&self, name: &str) -> TileId {
        self.by_name.get(name).copied().unwrap_or(0)
    }
}

/// The tile names the standard block set expects in its atlas.
pub const STANDARD_TEXTURE_NAMES: [&str; 6] =
    ["None", "GrassSide", "GrassTop", "Dirt", "Stone", "Sand"];

/// The atlas index matching [`STANDARD_TEXTURE_NAMES`], tile ids 0..6.
pub fn standard_atlas_index() -> AtlasIndex {
    AtlasIndex::from_names(&STANDARD_TEXTURE_NAMES)
}

/// Handles of the built-in terrain kinds, as registered by
/// [`register_standard_blocks`].
#[derive(Copy, Clone, Debug)]
pub struct StandardBlocks {
    /// Plain dirt, uniform texture.
    pub dirt: BlockHandle,
    /// Grass: green top, dirt bottom, grassy sides.
    pub grass: BlockHandle,
    /// Deep-layer stone.
    pub stone: BlockHandle,
    /// Warm-biome surface sand.
    pub sand: BlockHandle,
}

/// Registers the four built-in terrain kinds against an atlas index and
/// returns their handles.
pub fn register_standard_blocks(
    registry: &mut BlockRegistry,
    atlas: &AtlasIndex,
) -> StandardBlocks {
    let dirt_tile = atlas.tile("Dirt");

    StandardBlocks {
        dirt: registry.register_basic("dirt", BlockTexture::uniform(dirt_tile)),
        grass: registry.register_basic(
            "grass",
            BlockTexture::capped(atlas.tile("GrassTop"), dirt_tile, atlas.tile("GrassSide")),
        ),
        stone: registry.register_basic("stone", BlockTexture::uniform(atlas.tile("Stone"))),
        sand: registry.register_basic("sand", BlockTexture::uniform(atlas.tile("Sand"))),
    }
}
