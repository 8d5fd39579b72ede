//! # World Module
//!
//! The world owns the chunk map, the noise field, the terrain rules and the
//! background generation thread. It is split in two:
//!
//! - [`WorldState`] is everything shareable: the chunk map behind a mutex,
//!   the viewer position behind an [`MtResource`], the registry, the noise
//!   caches. Both the render thread and the worldgen thread hold an `Arc`
//!   to it.
//! - [`World`] is the owning handle: it spawns the worldgen thread on
//!   construction and stops and joins it on drop, so a world can never
//!   outlive-leak its generator.
//!
//! ## Lock order
//!
//! Chunk map first, then any per-chunk lock. Nothing takes the map lock
//! while holding a chunk lock, so the map and the fine-grained chunk
//! interior locks cannot deadlock against each other.

pub mod terrain;

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use log::{debug, info, trace, warn};

use crate::config::WorldConfig;
use crate::core::MtResource;
use crate::render::{MeshUploader, Shader};
use crate::voxels::block::block_side::BlockSide;
use crate::voxels::block::registry::BlockRegistry;
use crate::voxels::block::{BlockHandle, Item};
use crate::voxels::chunk::Chunk;
use crate::voxels::coords::{decompose, BlockCoord, ChunkIndex, CHUNK_SIZE};
use crate::voxels::noise::NoiseField;
use terrain::TerrainPalette;

/// How long the worldgen thread may sleep before re-checking its stop flag.
const WORLDGEN_POLL: Duration = Duration::from_millis(50);

/// A solid block found by [`WorldState::raycast`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    /// Kind of the block that was hit.
    pub block: BlockHandle,
    /// The face of the block the ray entered through.
    pub side: BlockSide,
    /// Global block x of the hit cell.
    pub x: BlockCoord,
    /// Global block y.
    pub y: BlockCoord,
    /// Global block z.
    pub z: BlockCoord,
    /// Distance travelled from the ray origin to the entry face.
    pub distance: f32,
}

type ChunkMap = HashMap<ChunkIndex, Arc<Chunk>>;

/// The shareable half of the world.
pub struct WorldState {
    config: WorldConfig,
    registry: Arc<BlockRegistry>,
    palette: TerrainPalette,
    noise: NoiseField,
    chunks: Mutex<ChunkMap>,
    /// Viewer position in block space, written by the input side and read by
    /// the worldgen sweep.
    position: MtResource<Point3<f32>>,
    generating: AtomicBool,
}

impl WorldState {
    /// Snapshot handle to the viewer position resource.
    pub fn viewer(&self) -> MtResource<Point3<f32>> {
        self.position.clone()
    }

    /// Moves the viewer; the next worldgen sweep will center on this point.
    pub fn set_viewer_position(&self, position: Point3<f32>) {
        *self.position.get_mut() = position;
    }

    /// The registry this world instantiates blocks from.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Number of chunks currently resident.
    pub fn chunk_count(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    /// The chunk at a chunk coordinate, if generated.
    pub fn get_chunk(&self, cx: BlockCoord, cy: BlockCoord, cz: BlockCoord) -> Option<Arc<Chunk>> {
        Self::chunk_locked(&self.chunks.lock().unwrap(), cx, cy, cz)
    }

    /// The chunk containing a global block coordinate, if generated.
    pub fn get_chunk_at_block(
        &self,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<Arc<Chunk>> {
        let (_, cx) = decompose(x);
        let (_, cy) = decompose(y);
        let (_, cz) = decompose(z);
        self.get_chunk(cx, cy, cz)
    }

    /// Kind of the block at a global coordinate; `None` for air, below the
    /// floor, or in a chunk that does not exist yet.
    pub fn block_handle_at(
        &self,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<BlockHandle> {
        Self::block_handle_locked(&self.chunks.lock().unwrap(), x, y, z)
    }

    /// [`Self::get_chunk`] for callers already holding the map lock.
    fn chunk_locked(
        chunks: &ChunkMap,
        cx: BlockCoord,
        cy: BlockCoord,
        cz: BlockCoord,
    ) -> Option<Arc<Chunk>> {
        if cz < 0 {
            return None;
        }
        chunks.get(&ChunkIndex::from_chunk(cx, cy, cz)).cloned()
    }

    /// [`Self::block_handle_at`] for callers already holding the map lock.
    fn block_handle_locked(
        chunks: &ChunkMap,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<BlockHandle> {
        if z < 0 {
            return None;
        }
        let (lx, cx) = decompose(x);
        let (ly, cy) = decompose(y);
        let (lz, cz) = decompose(z);
        let chunk = chunks.get(&ChunkIndex::from_chunk(cx, cy, cz))?;
        chunk.block_handle_at(lx, ly, lz)
    }

    /// Like [`Self::block_handle_locked`] but only for occluding blocks.
    fn solid_block_locked(
        chunks: &ChunkMap,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<BlockHandle> {
        if z < 0 {
            return None;
        }
        let (lx, cx) = decompose(x);
        let (ly, cy) = decompose(y);
        let (lz, cz) = decompose(z);
        let chunk = chunks.get(&ChunkIndex::from_chunk(cx, cy, cz))?;
        if !chunk.is_solid_at(lx, ly, lz) {
            return None;
        }
        chunk.block_handle_at(lx, ly, lz)
    }

    /// Generates terrain for the chunk at a chunk coordinate and adopts it.
    /// Returns `false` when the chunk already existed (or raced another
    /// generator and lost); generation is idempotent either way.
    pub fn generate_chunk_at(&self, cx: BlockCoord, cy: BlockCoord, cz: BlockCoord) -> bool {
        if cz < 0 {
            return false;
        }
        if self.get_chunk(cx, cy, cz).is_some() {
            return false;
        }

        // Terrain carving runs outside the map lock on purpose; a racing
        // duplicate is wasted work, not corruption, and insert resolves it.
        let chunk = Arc::new(Chunk::generate(
            cx,
            cy,
            cz,
            &self.noise,
            &self.registry,
            &self.palette,
        ));
        self.insert_chunk(chunk)
    }

    /// Adopts an already-built chunk into the map, wiring adjacency both
    /// ways with every resident neighbor. Returns `false` (dropping the
    /// offered chunk) if its slot is already occupied.
    pub fn insert_chunk(&self, chunk: Arc<Chunk>) -> bool {
        let index = ChunkIndex::from_chunk(chunk.cx, chunk.cy, chunk.cz);
        let mut chunks = self.chunks.lock().unwrap();
        if chunks.contains_key(&index) {
            return false;
        }
        chunks.insert(index, Arc::clone(&chunk));

        for side in BlockSide::all() {
            let (dx, dy, dz) = side.offset();
            let neighbor_index = ChunkIndex::from_chunk(chunk.cx + dx, chunk.cy + dy, chunk.cz + dz);
            if let Some(neighbor) = chunks.get(&neighbor_index) {
                chunk.on_adjacent_chunk_load(dx, dy, dz, &Arc::downgrade(neighbor));
                neighbor.on_adjacent_chunk_load(-dx, -dy, -dz, &Arc::downgrade(&chunk));
            }
        }

        true
    }

    /// Walks the ray cell by cell and returns the first occluding block it
    /// enters within `max_dist`, together with the face it entered through.
    ///
    /// The starting cell itself is never reported; a hit always crosses a
    /// face. An origin sitting exactly on a cell boundary owns the full cell
    /// behind it along the travel direction.
    pub fn raycast(
        &self,
        origin: Point3<f32>,
        dir: Vector3<f32>,
        max_dist: f32,
    ) -> Option<RaycastHit> {
        let magnitude = dir.magnitude();
        if magnitude <= 0.0 || !magnitude.is_finite() {
            return None;
        }

        let d = [dir.x, dir.y, dir.z];
        let origin = [origin.x, origin.y, origin.z];
        let mut cell = [
            origin[0].floor() as BlockCoord,
            origin[1].floor() as BlockCoord,
            origin[2].floor() as BlockCoord,
        ];

        // Per-axis boundary times: `boundary_t[a]` is the ray parameter at
        // which the walk next crosses an integer boundary on axis `a`, and
        // `crossing_t[a]` the parameter between consecutive crossings. Cell
        // tracking advances purely on these accumulators, so the integer
        // counter can never drift away from the fractional walk.
        let mut crossing_t = [f32::INFINITY; 3];
        let mut boundary_t = [f32::INFINITY; 3];
        for axis in 0..3 {
            if d[axis] == 0.0 {
                continue;
            }
            let within = origin[axis] - origin[axis].floor();
            // An origin sitting exactly on a boundary owns the full cell
            // behind it along the travel direction.
            let remaining = if d[axis] > 0.0 {
                1.0 - within
            } else if within == 0.0 {
                1.0
            } else {
                within
            };
            crossing_t[axis] = 1.0 / d[axis].abs();
            boundary_t[axis] = remaining / d[axis].abs();
        }

        let chunks = self.chunks.lock().unwrap();

        // The walk advances at least a third of a block per step on the
        // dominant axis, so this cap is only reached by degenerate rays.
        let cap = (max_dist * 3.0) as i32;
        for _ in 0..cap {
            let mut step_axis = 0;
            for axis in 1..3 {
                if boundary_t[axis] < boundary_t[step_axis] {
                    step_axis = axis;
                }
            }
            let step_t = boundary_t[step_axis];
            if !step_t.is_finite() {
                return None;
            }

            let travelled = step_t * magnitude;
            if travelled > max_dist {
                return None;
            }
            boundary_t[step_axis] = step_t + crossing_t[step_axis];

            let forward = d[step_axis] > 0.0;
            cell[step_axis] += if forward { 1 } else { -1 };
            let side = entering_side(step_axis, forward);

            if let Some(block) = Self::solid_block_locked(&chunks, cell[0], cell[1], cell[2]) {
                return Some(RaycastHit {
                    block,
                    side,
                    x: cell[0],
                    y: cell[1],
                    z: cell[2],
                    distance: travelled,
                });
            }
        }

        None
    }

    /// Draws every resident chunk, promoting any freshly generated meshes.
    /// Render-thread only: mesh promotion creates GPU objects.
    pub fn draw(
        &self,
        delta_t: f32,
        view_projection: Matrix4<f32>,
        shader: &dyn Shader,
        uploader: &dyn MeshUploader,
    ) {
        trace!("drawing world frame, delta {:.4}s", delta_t);
        shader.bind();
        shader.update(view_projection);

        let chunks = self.chunks.lock().unwrap();
        for chunk in chunks.values() {
            chunk.draw(uploader);
        }
    }

    /// One worldgen pass: finds every missing chunk inside the view sphere
    /// around the viewer and generates them on a small worker pool. Returns
    /// how many chunks this pass added.
    fn sweep(&self) -> usize {
        let radius = self.config.view_distance;
        if radius <= 0.0 {
            return 0;
        }

        let viewer = *self.position.get();
        // Viewer position in fractional chunk units.
        let vx = viewer.x / CHUNK_SIZE as f32;
        let vy = viewer.y / CHUNK_SIZE as f32;
        let vz = viewer.z / CHUNK_SIZE as f32;
        let pcx = vx.floor() as BlockCoord;
        let pcy = vy.floor() as BlockCoord;
        let pcz = vz.floor() as BlockCoord;

        let reach = radius.ceil() as BlockCoord + 1;
        let missing = {
            let chunks = self.chunks.lock().unwrap();
            let mut missing = Vec::new();
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    for dz in -reach..=reach {
                        let cz = pcz + dz;
                        if cz < 0 {
                            continue;
                        }
                        // Chunk centers (+0.5) against the viewer.
                        let ddx = (pcx + dx) as f32 + 0.5 - vx;
                        let ddy = (pcy + dy) as f32 + 0.5 - vy;
                        let ddz = cz as f32 + 0.5 - vz;
                        if ddx * ddx + ddy * ddy + ddz * ddz > radius * radius {
                            continue;
                        }
                        let index = ChunkIndex::from_chunk(pcx + dx, pcy + dy, cz);
                        if !chunks.contains_key(&index) {
                            missing.push((pcx + dx, pcy + dy, cz));
                        }
                    }
                }
            }
            missing
        };

        if missing.is_empty() {
            return 0;
        }
        debug!(
            "worldgen sweep around chunk ({}, {}, {}): {} chunks to generate",
            pcx,
            pcy,
            pcz,
            missing.len()
        );

        let next = AtomicUsize::new(0);
        let inserted = AtomicUsize::new(0);
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(missing.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if !self.generating.load(Ordering::Acquire) {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&(cx, cy, cz)) = missing.get(i) else {
                        break;
                    };
                    let chunk = Arc::new(Chunk::generate(
                        cx,
                        cy,
                        cz,
                        &self.noise,
                        &self.registry,
                        &self.palette,
                    ));
                    if self.insert_chunk(chunk) {
                        inserted.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        inserted.into_inner()
    }

    /// Sleeps for the sweep interval in short slices so a stop request never
    /// waits out a long sleep.
    fn idle(&self) {
        let deadline = Instant::now() + Duration::from_millis(self.config.sweep_interval_ms);
        while self.generating.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(WORLDGEN_POLL));
        }
    }

    fn worldgen_loop(&self) {
        info!("worldgen thread started");
        while self.generating.load(Ordering::Acquire) {
            let generated = self.sweep();
            if generated > 0 {
                debug!(
                    "worldgen pass generated {} chunks ({} resident)",
                    generated,
                    self.chunk_count()
                );
            }
            self.idle();
        }
        info!("worldgen thread stopping");
    }
}

/// Entry face for a step along `axis` in the given direction: stepping +x
/// enters the neighbor through its left face, and so on.
fn entering_side(axis: usize, forward: bool) -> BlockSide {
    match (axis, forward) {
        (0, true) => BlockSide::Left,
        (0, false) => BlockSide::Right,
        (1, true) => BlockSide::Front,
        (1, false) => BlockSide::Back,
        (2, true) => BlockSide::Bottom,
        _ => BlockSide::Top,
    }
}

/// Owning world handle. Dereferences to [`WorldState`] for all queries;
/// dropping it stops and joins the worldgen thread.
pub struct World {
    state: Arc<WorldState>,
    worldgen: Option<thread::JoinHandle<()>>,
}

impl World {
    /// Builds a world over the given block set and terrain rules and starts
    /// background generation around the viewer.
    ///
    /// A `view_distance` of zero disables the background sweep entirely;
    /// chunks then only appear through [`WorldState::generate_chunk_at`] and
    /// [`WorldState::insert_chunk`].
    pub fn new(config: WorldConfig, registry: Arc<BlockRegistry>, palette: TerrainPalette) -> Self {
        let noise = NoiseField::new(config.seed);
        let state = Arc::new(WorldState {
            config,
            registry,
            palette,
            noise,
            chunks: Mutex::new(HashMap::new()),
            position: MtResource::new(Point3::new(0.0, 0.0, 72.0)),
            generating: AtomicBool::new(true),
        });

        let worldgen = {
            let state = Arc::clone(&state);
            thread::Builder::new()
                .name("worldgen".to_owned())
                .spawn(move || state.worldgen_loop())
        };
        let worldgen = match worldgen {
            Ok(handle) => Some(handle),
            Err(err) => {
                // A world without background generation still works for
                // explicit generate_chunk_at calls.
                warn!("could not spawn worldgen thread: {}", err);
                state.generating.store(false, Ordering::Release);
                None
            }
        };

        World { state, worldgen }
    }

    /// Removes the block at a global coordinate, running its break hook and
    /// remeshing the touched chunks. Returns whatever the block dropped.
    pub fn remove_block(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord) -> Option<Item> {
        let chunk = self.get_chunk_at_block(x, y, z)?;
        let (lx, _) = decompose(x);
        let (ly, _) = decompose(y);
        let (lz, _) = decompose(z);
        // The map lock is already released here: the break hook gets a world
        // it can freely query.
        chunk.remove_block_at(self, lx, ly, lz)
    }
}

impl Deref for World {
    type Target = WorldState;

    fn deref(&self) -> &WorldState {
        &self.state
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.state.generating.store(false, Ordering::Release);
        if let Some(handle) = self.worldgen.take() {
            if handle.join().is_err() {
                warn!("worldgen thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::block::standard::{register_standard_blocks, standard_atlas_index};

    fn quiet_world() -> World {
        let mut registry = BlockRegistry::new();
        let standard = register_standard_blocks(&mut registry, &standard_atlas_index());
        let palette = TerrainPalette::from_standard(&standard);
        let config = WorldConfig {
            seed: 7,
            view_distance: 0.0,
            sweep_interval_ms: 10,
        };
        World::new(config, Arc::new(registry), palette)
    }

    #[test]
    fn generate_chunk_at_is_idempotent() {
        let world = quiet_world();

        assert!(world.generate_chunk_at(0, 0, 0));
        assert!(!world.generate_chunk_at(0, 0, 0));
        assert_eq!(world.chunk_count(), 1);
        assert!(world.get_chunk(0, 0, 0).is_some());
    }

    #[test]
    fn nothing_exists_below_the_floor() {
        let world = quiet_world();

        assert!(!world.generate_chunk_at(0, 0, -1));
        assert!(world.get_chunk(0, 0, -1).is_none());
        assert_eq!(world.block_handle_at(0, 0, -1), None);
    }

    #[test]
    fn generated_terrain_has_stone_at_the_bottom() {
        let world = quiet_world();
        world.generate_chunk_at(0, 0, 0);

        let stone = world.registry().handle_of("stone");
        assert_eq!(world.block_handle_at(5, 5, 0), Some(stone));
        assert_eq!(world.block_handle_at(5, 5, 15), Some(stone));
    }

    #[test]
    fn terrain_is_deterministic_per_seed() {
        let a = quiet_world();
        let b = quiet_world();
        a.generate_chunk_at(1, 2, 4);
        b.generate_chunk_at(1, 2, 4);

        for x in 16..32 {
            for z in 64..80 {
                assert_eq!(a.block_handle_at(x, 40, z), b.block_handle_at(x, 40, z));
            }
        }
    }

    #[test]
    fn raycast_ignores_air_and_degenerate_rays() {
        let world = quiet_world();

        assert!(world
            .raycast(Point3::new(0.5, 0.5, 200.0), Vector3::new(0.0, 0.0, -1.0), 10.0)
            .is_none());
        assert!(world
            .raycast(Point3::new(0.5, 0.5, 200.0), Vector3::new(0.0, 0.0, 0.0), 10.0)
            .is_none());
    }
}
