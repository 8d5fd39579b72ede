//! Terrain shaping rules: how noise samples become block choices.

use crate::voxels::block::standard::StandardBlocks;
use crate::voxels::block::BlockHandle;
use crate::voxels::coords::BlockCoord;

/// Mean surface height of the world, in blocks above z = 0.
pub const WORLD_SURFACE_BASELINE: f32 = 64.0;

/// How far (in blocks) the height noise swings the surface around the
/// baseline in either direction.
pub const WORLD_SURFACE_AMPLITUDE: f32 = 5.0;

/// Everything strictly below this z is stone regardless of biome.
pub const STONE_DEPTH_CEILING: BlockCoord = 16;

/// Temperature above which the surface block is sand instead of grass.
pub const SAND_TEMPERATURE_THRESHOLD: f32 = 0.2;

/// Surface height (highest solid z) for a column given its height-noise
/// sample in `[-0.5, 0.5]`.
pub fn block_height(height_noise: f32) -> BlockCoord {
    (WORLD_SURFACE_BASELINE + height_noise * WORLD_SURFACE_AMPLITUDE) as BlockCoord
}

/// The block kinds terrain generation places, resolved to handles once at
/// world construction.
#[derive(Copy, Clone, Debug)]
pub struct TerrainPalette {
    /// Deep-layer filler below [`STONE_DEPTH_CEILING`].
    pub stone: BlockHandle,
    /// Warm-biome surface block.
    pub sand: BlockHandle,
    /// Temperate surface block.
    pub grass: BlockHandle,
    /// Everything between stone depth and the surface.
    pub dirt: BlockHandle,
}

impl TerrainPalette {
    /// Palette over the built-in block set.
    pub fn from_standard(standard: &StandardBlocks) -> Self {
        TerrainPalette {
            stone: standard.stone,
            sand: standard.sand,
            grass: standard.grass,
            dirt: standard.dirt,
        }
    }

    /// Picks the block kind for global height `z` in a column whose surface
    /// sits at `height`, or `None` for air above the surface.
    ///
    /// Depth wins over biome: the stone layer is stone even under a desert.
    /// At the surface itself a warm column gets sand, a temperate one grass.
    pub fn block_for(&self, z: BlockCoord, height: BlockCoord, temperature: f32) -> Option<BlockHandle> {
        if z > height {
            None
        } else if z < STONE_DEPTH_CEILING {
            Some(self.stone)
        } else if temperature > SAND_TEMPERATURE_THRESHOLD {
            Some(self.sand)
        } else if z == height {
            Some(self.grass)
        } else {
            Some(self.dirt)
        }
    }
}
