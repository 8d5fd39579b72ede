//! The voxel engine core: coordinates, noise, blocks, chunks and the world
//! that ties them together.

pub mod block;
pub mod chunk;
pub mod coords;
pub mod noise;
pub mod world;
