//! # Headless World Demo
//!
//! Boots a world, lets the background thread generate terrain around the
//! viewer for a moment, then exercises the interactive path: raycast straight
//! down onto the surface and break the block the ray hits. No window and no
//! GPU: the render traits are stubbed so the demo can run anywhere.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```
//!
//! Set `VOXEL_WORLD_CONFIG` to a path of a JSON settings file to override the
//! default seed, view distance and sweep interval.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cgmath::{Matrix4, Point3, SquareMatrix, Vector3};
use log::{info, warn};

use voxel_world::config::WorldConfig;
use voxel_world::render::{MeshData, MeshUploader, RenderMesh, Shader};
use voxel_world::voxels::block::registry::BlockRegistry;
use voxel_world::voxels::block::standard::{register_standard_blocks, standard_atlas_index};
use voxel_world::voxels::world::terrain::TerrainPalette;
use voxel_world::voxels::world::World;

/// Mesh "uploads" that just count geometry instead of touching a GPU.
#[derive(Default)]
struct CountingUploader {
    uploads: AtomicUsize,
    triangles: AtomicUsize,
}

struct CountedMesh;

impl RenderMesh for CountedMesh {
    fn draw(&self) {}
}

impl MeshUploader for CountingUploader {
    fn upload(&self, mesh: &MeshData) -> Box<dyn RenderMesh> {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.triangles
            .fetch_add(mesh.indices.len() / 3, Ordering::Relaxed);
        Box::new(CountedMesh)
    }
}

struct NullShader;

impl Shader for NullShader {
    fn bind(&self) {}
    fn update(&self, _view_projection: Matrix4<f32>) {}
}

fn load_config() -> WorldConfig {
    let Ok(path) = std::env::var("VOXEL_WORLD_CONFIG") else {
        return WorldConfig::default();
    };
    match std::fs::read_to_string(&path).map_err(|e| e.to_string()).and_then(|json| {
        WorldConfig::from_json(&json).map_err(|e| e.to_string())
    }) {
        Ok(config) => config,
        Err(err) => {
            warn!("could not load config from {:?}: {}; using defaults", path, err);
            WorldConfig::default()
        }
    }
}

fn main() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let mut config = load_config();
    // Keep the demo snappy; a real client would use the configured radius.
    config.view_distance = config.view_distance.min(4.0);
    info!(
        "starting world: seed {}, view distance {} chunks",
        config.seed, config.view_distance
    );

    let mut registry = BlockRegistry::new();
    let standard = register_standard_blocks(&mut registry, &standard_atlas_index());
    let palette = TerrainPalette::from_standard(&standard);
    let world = World::new(config, Arc::new(registry), palette);

    // Give the worldgen thread a moment to fill the view sphere.
    thread::sleep(Duration::from_millis(1500));
    info!("{} chunks resident", world.chunk_count());

    let uploader = CountingUploader::default();
    let shader = NullShader;
    world.draw(0.016, Matrix4::identity(), &shader, &uploader);
    info!(
        "first frame: {} chunk meshes uploaded, {} triangles",
        uploader.uploads.load(Ordering::Relaxed),
        uploader.triangles.load(Ordering::Relaxed)
    );

    // Look straight down from above the surface and dig out what we hit.
    let eye = Point3::new(0.5, 0.5, 100.0);
    let down = Vector3::new(0.0, 0.0, -1.0);
    match world.raycast(eye, down, 100.0) {
        Some(hit) => {
            info!(
                "ray hit {} at ({}, {}, {}), {} face, distance {:.1}",
                world.registry().name_of(hit.block),
                hit.x,
                hit.y,
                hit.z,
                format!("{:?}", hit.side).to_lowercase(),
                hit.distance
            );
            match world.remove_block(hit.x, hit.y, hit.z) {
                Some(item) => info!(
                    "broke it, picked up {} x {}",
                    item.count,
                    world.registry().name_of(item.block)
                ),
                None => info!("broke it, nothing dropped"),
            }
        }
        None => warn!("ray found no surface below the viewer"),
    }

    world.draw(0.016, Matrix4::identity(), &shader, &uploader);
    info!("world demo finished");
}
