//! # Chunk Module
//!
//! A chunk owns a 16x16x16 grid of optional block slots, weak links to its
//! six neighbor chunks, and its latest face-culled mesh. The interesting
//! algorithm lives in [`Chunk::regenerate_mesh`]: every filled slot emits a
//! quad for each of its six faces whose far side is empty or non-solid,
//! consulting the linked neighbor chunk for faces on the chunk boundary.
//!
//! ## Locking
//!
//! Three independent per-chunk locks, never nested the other way around:
//! - `store` (RwLock): block slots plus a solidity bitmask. Meshing holds a
//!   read guard on its own store and takes only *read* guards on neighbor
//!   stores, so two chunks meshing each other's seams cannot deadlock.
//! - `adjacent` (RwLock): the six weak neighbor links.
//! - `mesh` (Mutex): the pending CPU mesh and the uploaded handle. Mesh
//!   construction can run on the worldgen thread; the render thread promotes
//!   a pending mesh with `try_lock` and simply skips a contested frame.

use std::sync::{Arc, Mutex, RwLock, Weak};

use bitvec::prelude::{bitvec, BitVec};
use log::{trace, warn};

use crate::render::{MeshData, MeshUploader, RenderMesh};
use crate::voxels::block::block_side::BlockSide;
use crate::voxels::block::{Block, BlockHandle, Item};
use crate::voxels::block::registry::BlockRegistry;
use crate::voxels::coords::{BlockCoord, CHUNK_COORD_BITS, CHUNK_SIZE};
use crate::voxels::noise::{NoiseChannel, NoiseField};
use crate::voxels::world::terrain::{block_height, TerrainPalette};
use crate::voxels::world::World;
use crate::maths::posmod;

/// Total block slots in a chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Slot index for a local coordinate. Callers must pass coordinates in
/// `[0, CHUNK_SIZE)`; this is the unchecked fast path.
fn block_index(x: BlockCoord, y: BlockCoord, z: BlockCoord) -> usize {
    debug_assert!(in_bounds(x, y, z), "local coordinate out of range");
    (x | (y << CHUNK_COORD_BITS) | (z << (CHUNK_COORD_BITS * 2))) as usize
}

fn in_bounds(x: BlockCoord, y: BlockCoord, z: BlockCoord) -> bool {
    (0..CHUNK_SIZE).contains(&x) && (0..CHUNK_SIZE).contains(&y) && (0..CHUNK_SIZE).contains(&z)
}

/// Block slots plus a parallel solidity bitmask for O(1) occlusion checks.
struct BlockStore {
    slots: Vec<Option<Box<dyn Block>>>,
    solid: BitVec,
}

impl BlockStore {
    fn empty() -> Self {
        BlockStore {
            slots: (0..CHUNK_VOLUME).map(|_| None).collect(),
            solid: bitvec![0; CHUNK_VOLUME],
        }
    }

    fn put(&mut self, index: usize, block: Option<Box<dyn Block>>) {
        self.solid
            .set(index, block.as_ref().is_some_and(|b| b.is_solid()));
        self.slots[index] = block;
    }
}

#[derive(Default)]
struct MeshState {
    /// CPU geometry waiting for upload on the render thread.
    pending: Option<MeshData>,
    /// The currently drawable handle, if any.
    uploaded: Option<Box<dyn RenderMesh>>,
}

/// A 16x16x16 cube of voxels: the unit of meshing and spatial indexing.
pub struct Chunk {
    /// Chunk coordinate along x.
    pub cx: BlockCoord,
    /// Chunk coordinate along y.
    pub cy: BlockCoord,
    /// Chunk coordinate along z. Zero is the world floor; no chunk exists
    /// below it.
    pub cz: BlockCoord,
    /// Block-space origin along x (`cx * CHUNK_SIZE`).
    pub x: BlockCoord,
    /// Block-space origin along y.
    pub y: BlockCoord,
    /// Block-space origin along z.
    pub z: BlockCoord,

    store: RwLock<BlockStore>,
    /// Weak neighbor links indexed by `BlockSide as usize`. Weak on purpose:
    /// adjacency is a relation, not ownership, and mutually adjacent chunks
    /// must not keep each other alive once dropped from the world map.
    adjacent: RwLock<[Weak<Chunk>; 6]>,
    mesh: Mutex<MeshState>,
}

impl Chunk {
    fn bare(cx: BlockCoord, cy: BlockCoord, cz: BlockCoord, store: BlockStore) -> Self {
        Chunk {
            cx,
            cy,
            cz,
            x: cx * CHUNK_SIZE,
            y: cy * CHUNK_SIZE,
            z: cz * CHUNK_SIZE,
            store: RwLock::new(store),
            adjacent: RwLock::new(std::array::from_fn(|_| Weak::new())),
            mesh: Mutex::new(MeshState::default()),
        }
    }

    /// Builds a chunk by filling every slot from a per-block callback taking
    /// *global* block coordinates. The backbone of [`Chunk::generate`] and
    /// of test fixtures.
    pub fn from_fn(
        cx: BlockCoord,
        cy: BlockCoord,
        cz: BlockCoord,
        mut block_at: impl FnMut(BlockCoord, BlockCoord, BlockCoord) -> Option<Box<dyn Block>>,
    ) -> Self {
        let (ox, oy, oz) = (cx * CHUNK_SIZE, cy * CHUNK_SIZE, cz * CHUNK_SIZE);
        let mut store = BlockStore::empty();
        for bx in 0..CHUNK_SIZE {
            for by in 0..CHUNK_SIZE {
                for bz in 0..CHUNK_SIZE {
                    store.put(
                        block_index(bx, by, bz),
                        block_at(ox + bx, oy + by, oz + bz),
                    );
                }
            }
        }
        Chunk::bare(cx, cy, cz, store)
    }

    /// A chunk with every slot empty.
    pub fn empty(cx: BlockCoord, cy: BlockCoord, cz: BlockCoord) -> Self {
        Chunk::bare(cx, cy, cz, BlockStore::empty())
    }

    /// A chunk with every slot holding one kind of block.
    pub fn solid(
        cx: BlockCoord,
        cy: BlockCoord,
        cz: BlockCoord,
        registry: &BlockRegistry,
        handle: BlockHandle,
    ) -> Self {
        Chunk::from_fn(cx, cy, cz, |x, y, z| registry.create(handle, x, y, z))
    }

    /// Carves terrain for the chunk at `(cx, cy, cz)` from the noise field.
    ///
    /// Per column: the surface height comes from the blerped height channel
    /// and the biome temperature from the temperature channel; the palette
    /// then picks stone, sand, grass, dirt or air per block.
    pub fn generate(
        cx: BlockCoord,
        cy: BlockCoord,
        cz: BlockCoord,
        noise: &NoiseField,
        registry: &BlockRegistry,
        palette: &TerrainPalette,
    ) -> Self {
        let (ox, oy, oz) = (cx * CHUNK_SIZE, cy * CHUNK_SIZE, cz * CHUNK_SIZE);
        let mut store = BlockStore::empty();

        for bx in 0..CHUNK_SIZE {
            for by in 0..CHUNK_SIZE {
                let height = block_height(noise.sample_blerp(ox + bx, oy + by, NoiseChannel::Height));
                let temperature = noise.sample_blerp(ox + bx, oy + by, NoiseChannel::Temperature);

                for bz in 0..CHUNK_SIZE {
                    let block = palette
                        .block_for(oz + bz, height, temperature)
                        .and_then(|handle| registry.create(handle, ox + bx, oy + by, oz + bz));
                    store.put(block_index(bx, by, bz), block);
                }
            }
        }

        Chunk::bare(cx, cy, cz, store)
    }

    /// Solidity of the slot at a local coordinate; `false` outside bounds.
    pub fn is_solid_at(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord) -> bool {
        if !in_bounds(x, y, z) {
            return false;
        }
        self.store.read().unwrap().solid[block_index(x, y, z)]
    }

    /// Kind handle of the block at a local coordinate; `None` when the slot
    /// is empty or the coordinate is outside the chunk.
    pub fn block_handle_at(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord) -> Option<BlockHandle> {
        if !in_bounds(x, y, z) {
            return None;
        }
        self.store.read().unwrap().slots[block_index(x, y, z)]
            .as_ref()
            .map(|b| b.handle())
    }

    /// Resolves a local coordinate that overflows this chunk along exactly
    /// one axis by exactly one block to the linked neighbor and the wrapped
    /// coordinate. Diagonal or multi-chunk overflows are deliberately
    /// unsupported and resolve to nothing, as does crossing below the world
    /// floor chunk.
    fn adjacent_chunk_for(
        &self,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<(Arc<Chunk>, (BlockCoord, BlockCoord, BlockCoord))> {
        let overflowed: [bool; 3] = [
            !(0..CHUNK_SIZE).contains(&x),
            !(0..CHUNK_SIZE).contains(&y),
            !(0..CHUNK_SIZE).contains(&z),
        ];
        if overflowed.iter().filter(|&&o| o).count() != 1 {
            return None;
        }

        let side = if x == CHUNK_SIZE {
            BlockSide::Right
        } else if x == -1 {
            BlockSide::Left
        } else if y == CHUNK_SIZE {
            BlockSide::Back
        } else if y == -1 {
            BlockSide::Front
        } else if z == CHUNK_SIZE {
            BlockSide::Top
        } else if z == -1 && self.cz > 0 {
            BlockSide::Bottom
        } else {
            return None; // overflow beyond one block, or below the floor
        };

        let neighbor = self.adjacent.read().unwrap()[side as usize].upgrade()?;
        let wrapped = (
            posmod(x, CHUNK_SIZE),
            posmod(y, CHUNK_SIZE),
            posmod(z, CHUNK_SIZE),
        );
        Some((neighbor, wrapped))
    }

    /// Kind handle of the block at a local coordinate that may overflow into
    /// a directly adjacent chunk by one block.
    pub fn block_handle_adjacent(
        &self,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<BlockHandle> {
        if in_bounds(x, y, z) {
            return self.block_handle_at(x, y, z);
        }
        let (neighbor, (nx, ny, nz)) = self.adjacent_chunk_for(x, y, z)?;
        neighbor.block_handle_at(nx, ny, nz)
    }

    /// Whether the (possibly overflowing) local coordinate holds a solid
    /// block that would occlude a face looking at it.
    fn occludes(&self, store: &BlockStore, x: BlockCoord, y: BlockCoord, z: BlockCoord) -> bool {
        if in_bounds(x, y, z) {
            return store.solid[block_index(x, y, z)];
        }
        match self.adjacent_chunk_for(x, y, z) {
            Some((neighbor, (nx, ny, nz))) => neighbor.is_solid_at(nx, ny, nz),
            None => false,
        }
    }

    /// Rebuilds this chunk's face-culled mesh and parks it in the pending
    /// slot for the render thread to pick up. Safe to call from any thread;
    /// no GPU object is touched here.
    pub fn regenerate_mesh(&self) {
        let mesh_data = {
            let store = self.store.read().unwrap();
            self.build_mesh(&store)
        };

        trace!(
            "chunk ({}, {}, {}) meshed: {} quads",
            self.cx,
            self.cy,
            self.cz,
            mesh_data.vertices.len() / 4
        );

        let mut mesh = self.mesh.lock().unwrap();
        mesh.pending = Some(mesh_data);
    }

    fn build_mesh(&self, store: &BlockStore) -> MeshData {
        let mut mesh = MeshData::new();

        for bx in 0..CHUNK_SIZE {
            for by in 0..CHUNK_SIZE {
                for bz in 0..CHUNK_SIZE {
                    let Some(block) = store.slots[block_index(bx, by, bz)].as_ref() else {
                        continue;
                    };

                    for side in BlockSide::all() {
                        let (dx, dy, dz) = side.offset();
                        if !self.occludes(store, bx + dx, by + dy, bz + dz) {
                            mesh.append(&block.mesh(self.x + bx, self.y + by, self.z + bz, side));
                        }
                    }
                }
            }
        }

        mesh
    }

    /// Records a weak link to a neighbor that just appeared at the given
    /// unit offset, then meshes this chunk once every neighbor slot that can
    /// ever be populated is populated: all 6, or 5 for a floor chunk whose
    /// "below" slot will never exist. Meshing earlier would render interior
    /// seam faces as if they were boundary faces.
    pub fn on_adjacent_chunk_load(
        &self,
        dx: BlockCoord,
        dy: BlockCoord,
        dz: BlockCoord,
        neighbor: &Weak<Chunk>,
    ) {
        let Some(side) = BlockSide::from_offset(dx, dy, dz) else {
            warn!(
                "chunk ({}, {}, {}) ignoring non-unit adjacency offset ({}, {}, {})",
                self.cx, self.cy, self.cz, dx, dy, dz
            );
            return;
        };

        let populated = {
            let mut adjacent = self.adjacent.write().unwrap();
            adjacent[side as usize] = neighbor.clone();
            adjacent.iter().filter(|w| w.strong_count() > 0).count()
        };

        let expected = if self.cz == 0 { 5 } else { 6 };
        if populated >= expected {
            self.regenerate_mesh();
        }
    }

    /// Removes the block at a local coordinate, if any.
    ///
    /// The block is detached first, then its `on_break` hook runs exactly
    /// once, then this chunk remeshes along with every neighbor whose seam
    /// the removed block touched, since an edit on a chunk edge changes what
    /// is visible across the boundary. Returns whatever item the block
    /// dropped.
    pub fn remove_block_at(
        &self,
        world: &World,
        x: BlockCoord,
        y: BlockCoord,
        z: BlockCoord,
    ) -> Option<Item> {
        if !in_bounds(x, y, z) {
            return None;
        }

        let removed = {
            let mut store = self.store.write().unwrap();
            let index = block_index(x, y, z);
            store.solid.set(index, false);
            store.slots[index].take()
        }?;

        let item = removed.on_break(world, self.x + x, self.y + y, self.z + z);

        self.regenerate_mesh();
        self.remesh_touching_neighbors(x, y, z);
        item
    }

    /// Places a block into a local slot, replacing whatever was there, and
    /// remeshes this chunk plus any seam neighbors the slot touches.
    pub fn set_block_at(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord, block: Box<dyn Block>) {
        if !in_bounds(x, y, z) {
            warn!("set_block_at outside chunk bounds: ({}, {}, {})", x, y, z);
            return;
        }

        {
            let mut store = self.store.write().unwrap();
            store.put(block_index(x, y, z), Some(block));
        }

        self.regenerate_mesh();
        self.remesh_touching_neighbors(x, y, z);
    }

    /// Remeshes every linked neighbor whose boundary plane contains the
    /// local coordinate.
    fn remesh_touching_neighbors(&self, x: BlockCoord, y: BlockCoord, z: BlockCoord) {
        let adjacent = self.adjacent.read().unwrap();
        let touched = [
            (BlockSide::Right, x == CHUNK_SIZE - 1),
            (BlockSide::Left, x == 0),
            (BlockSide::Back, y == CHUNK_SIZE - 1),
            (BlockSide::Front, y == 0),
            (BlockSide::Top, z == CHUNK_SIZE - 1),
            (BlockSide::Bottom, z == 0),
        ];

        for (side, on_seam) in touched {
            if !on_seam {
                continue;
            }
            if let Some(neighbor) = adjacent[side as usize].upgrade() {
                neighbor.regenerate_mesh();
            }
        }
    }

    /// Takes the freshly built mesh out of the pending slot, if one is
    /// waiting. Used by hosts that manage uploads themselves, and by tests.
    pub fn take_pending_mesh(&self) -> Option<MeshData> {
        self.mesh.lock().unwrap().pending.take()
    }

    /// Promotes a pending mesh to a drawable handle and draws it.
    ///
    /// Must be called where GPU object creation is legal (the render
    /// thread). Promotion uses `try_lock`: if the worldgen thread is mid
    /// mesh swap this frame simply draws nothing new. One frame of staleness
    /// is tolerable; stalling the render thread is not.
    pub fn draw(&self, uploader: &dyn MeshUploader) {
        if let Ok(mut mesh) = self.mesh.try_lock() {
            if let Some(pending) = mesh.pending.take() {
                mesh.uploaded = if pending.is_empty() {
                    None
                } else {
                    Some(uploader.upload(&pending))
                };
            }
            if let Some(uploaded) = &mesh.uploaded {
                uploaded.draw();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::block::standard::{register_standard_blocks, standard_atlas_index};
    use crate::voxels::block::standard::StandardBlocks;

    fn test_registry() -> (BlockRegistry, StandardBlocks) {
        let mut registry = BlockRegistry::new();
        let standard = register_standard_blocks(&mut registry, &standard_atlas_index());
        (registry, standard)
    }

    #[test]
    fn block_index_is_bijective_over_the_chunk() {
        let mut seen = vec![false; CHUNK_VOLUME];
        for x in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                for z in 0..CHUNK_SIZE {
                    let i = block_index(x, y, z);
                    assert!(!seen[i]);
                    seen[i] = true;
                }
            }
        }
    }

    #[test]
    fn lookups_outside_bounds_miss() {
        let (registry, standard) = test_registry();
        let chunk = Chunk::solid(0, 0, 1, &registry, standard.dirt);

        assert!(chunk.is_solid_at(0, 0, 0));
        assert!(!chunk.is_solid_at(-1, 0, 0));
        assert!(!chunk.is_solid_at(0, CHUNK_SIZE, 0));
        assert_eq!(chunk.block_handle_at(3, 3, 3), Some(standard.dirt));
        assert_eq!(chunk.block_handle_at(3, 3, 99), None);
    }

    #[test]
    fn isolated_block_meshes_six_faces() {
        let (registry, standard) = test_registry();
        let chunk = Chunk::from_fn(0, 0, 1, |x, y, z| {
            (x == 8 && y == 8 && z == 24).then(|| registry.create(standard.stone, x, y, z).unwrap())
        });

        chunk.regenerate_mesh();
        let mesh = chunk.take_pending_mesh().unwrap();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
    }

    #[test]
    fn interior_faces_are_culled() {
        let (registry, standard) = test_registry();
        // Two stone blocks side by side along x: the shared faces vanish,
        // leaving 10 of the 12.
        let chunk = Chunk::from_fn(0, 0, 1, |x, y, z| {
            (y == 8 && z == 24 && (x == 8 || x == 9))
                .then(|| registry.create(standard.stone, x, y, z).unwrap())
        });

        chunk.regenerate_mesh();
        let mesh = chunk.take_pending_mesh().unwrap();
        assert_eq!(mesh.vertices.len(), 10 * 4);
        assert_eq!(mesh.indices.len(), 10 * 6);
    }

    #[test]
    fn placing_a_block_remeshes_immediately() {
        let (registry, standard) = test_registry();
        let chunk = Chunk::empty(0, 0, 1);
        chunk.regenerate_mesh();
        assert!(chunk.take_pending_mesh().unwrap().is_empty());

        let block = registry.create(standard.sand, 8, 8, 24).unwrap();
        chunk.set_block_at(8, 8, 8, block);

        let mesh = chunk.take_pending_mesh().unwrap();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(chunk.block_handle_at(8, 8, 8), Some(standard.sand));
    }

    #[test]
    fn adjacent_lookup_rejects_diagonals_and_long_jumps() {
        let (registry, standard) = test_registry();
        let chunk = Chunk::solid(0, 0, 1, &registry, standard.dirt);

        assert_eq!(chunk.block_handle_adjacent(CHUNK_SIZE, CHUNK_SIZE, 0), None);
        assert_eq!(chunk.block_handle_adjacent(CHUNK_SIZE + 1, 0, 0), None);
        assert_eq!(chunk.block_handle_adjacent(-2, 0, 0), None);
        // In-bounds coordinates still resolve locally.
        assert_eq!(
            chunk.block_handle_adjacent(0, 0, 0),
            Some(standard.dirt)
        );
    }

    #[test]
    fn adjacent_lookup_crosses_one_seam() {
        let (registry, standard) = test_registry();
        let a = Arc::new(Chunk::solid(0, 0, 1, &registry, standard.dirt));
        let b = Arc::new(Chunk::solid(1, 0, 1, &registry, standard.stone));

        a.on_adjacent_chunk_load(1, 0, 0, &Arc::downgrade(&b));
        b.on_adjacent_chunk_load(-1, 0, 0, &Arc::downgrade(&a));

        assert_eq!(
            a.block_handle_adjacent(CHUNK_SIZE, 5, 5),
            Some(standard.stone)
        );
        assert_eq!(b.block_handle_adjacent(-1, 5, 5), Some(standard.dirt));
        // Unlinked directions stay unresolved.
        assert_eq!(a.block_handle_adjacent(-1, 5, 5), None);
    }

    #[test]
    fn floor_chunk_meshes_with_five_neighbors() {
        let (registry, standard) = test_registry();
        let center = Arc::new(Chunk::solid(0, 0, 0, &registry, standard.dirt));

        let offsets = [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1)];
        let mut neighbors = Vec::new();
        for (dx, dy, dz) in offsets {
            let n = Arc::new(Chunk::empty(dx, dy, dz.max(0)));
            center.on_adjacent_chunk_load(dx, dy, dz, &Arc::downgrade(&n));
            neighbors.push(n);
        }

        // The fifth link is what triggers the first mesh for a floor chunk.
        assert!(center.take_pending_mesh().is_some());
    }

    #[test]
    fn interior_chunk_waits_for_all_six_neighbors() {
        let (registry, standard) = test_registry();
        let center = Arc::new(Chunk::solid(0, 0, 2, &registry, standard.dirt));

        let offsets = [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ];
        let mut neighbors = Vec::new();
        for (i, (dx, dy, dz)) in offsets.into_iter().enumerate() {
            let n = Arc::new(Chunk::solid(dx, dy, 2 + dz, &registry, standard.dirt));
            center.on_adjacent_chunk_load(dx, dy, dz, &Arc::downgrade(&n));
            neighbors.push(n);

            if i < 5 {
                assert!(center.take_pending_mesh().is_none());
            }
        }

        // Fully enclosed by solid chunks: meshed, but every face culled.
        let mesh = center.take_pending_mesh().unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn expired_neighbors_do_not_count() {
        let (registry, standard) = test_registry();
        let center = Arc::new(Chunk::solid(0, 0, 2, &registry, standard.dirt));

        for (dx, dy, dz) in [
            (1, 0, 0),
            (-1, 0, 0),
            (0, 1, 0),
            (0, -1, 0),
            (0, 0, 1),
            (0, 0, -1),
        ] {
            // Each neighbor is dropped immediately after linking.
            let n = Arc::new(Chunk::empty(dx, dy, 2 + dz));
            center.on_adjacent_chunk_load(dx, dy, dz, &Arc::downgrade(&n));
        }

        assert!(center.take_pending_mesh().is_none());
    }
}
