//! # voxel-world
//!
//! An infinite procedural voxel world: chunked terrain carved from layered
//! value noise, face-culled meshing with seam-aware incremental updates, and
//! real-time block removal, all generated concurrently on a background
//! thread while the host renders.
//!
//! The crate is renderer-agnostic. It produces CPU-side meshes and talks to
//! the GPU only through the small traits in [`render`]; a host supplies a
//! [`render::MeshUploader`] and a [`render::Shader`] and calls
//! [`voxels::world::WorldState::draw`] from its render thread.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use voxel_world::config::WorldConfig;
//! use voxel_world::voxels::block::registry::BlockRegistry;
//! use voxel_world::voxels::block::standard::{register_standard_blocks, standard_atlas_index};
//! use voxel_world::voxels::world::terrain::TerrainPalette;
//! use voxel_world::voxels::world::World;
//!
//! let mut registry = BlockRegistry::new();
//! let standard = register_standard_blocks(&mut registry, &standard_atlas_index());
//! let palette = TerrainPalette::from_standard(&standard);
//!
//! // Starts generating terrain around the viewer immediately.
//! let world = World::new(WorldConfig::default(), Arc::new(registry), palette);
//! let _ = world.block_handle_at(0, 0, 64);
//! ```

pub mod config;
pub mod core;
pub mod maths;
pub mod render;
pub mod voxels;

pub use config::WorldConfig;
pub use render::{MeshData, MeshUploader, MeshVertex, RenderMesh, Shader};
pub use voxels::block::block_side::BlockSide;
pub use voxels::block::registry::BlockRegistry;
pub use voxels::block::{Block, BlockHandle, Item};
pub use voxels::chunk::Chunk;
pub use voxels::coords::{BlockCoord, ChunkIndex, CHUNK_SIZE};
pub use voxels::world::{RaycastHit, World};
