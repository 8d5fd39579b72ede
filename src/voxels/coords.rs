//! # Coordinate Model
//!
//! Global block coordinates are signed integers; a chunk is a 16-block cube,
//! so a block coordinate decomposes into a chunk coordinate (arithmetic shift
//! right, floor semantics) and a local coordinate (low-bit mask, always in
//! `[0, CHUNK_SIZE)` even for negative input).
//!
//! A [`ChunkIndex`] packs a chunk coordinate triple into one `i64` so the
//! world's chunk map can key on a single hashable integer. 22 bits per
//! horizontal axis and 20 bits of height cover roughly ±2 million chunks
//! sideways, far beyond any reachable worldgen radius.

/// Signed global block-space coordinate along one axis.
pub type BlockCoord = i32;

/// Chunk edge length as a power-of-two bit width.
pub const CHUNK_COORD_BITS: BlockCoord = 4;
/// The dimension (width, depth, height) of a chunk in blocks.
pub const CHUNK_SIZE: BlockCoord = 1 << CHUNK_COORD_BITS;
/// Mask selecting the chunk-local bits of a block coordinate.
pub const CHUNK_BLOCK_MASK: BlockCoord = CHUNK_SIZE - 1;

/// Chunk-local part of a global block coordinate, in `[0, CHUNK_SIZE)`.
pub const fn decompose_local(bc: BlockCoord) -> BlockCoord {
    bc & CHUNK_BLOCK_MASK
}

/// Chunk coordinate containing a global block coordinate. Arithmetic shift,
/// so negative coordinates floor toward the chunk below rather than
/// truncating toward zero.
pub const fn decompose_chunk(bc: BlockCoord) -> BlockCoord {
    bc >> CHUNK_COORD_BITS
}

/// Splits a global block coordinate into `(local, chunk)`.
pub const fn decompose(bc: BlockCoord) -> (BlockCoord, BlockCoord) {
    (decompose_local(bc), decompose_chunk(bc))
}

const X_BITS: u32 = 22;
const Y_BITS: u32 = 22;
const Z_BITS: u32 = 20;

const X_MASK: i64 = (1 << X_BITS) - 1;
const Y_MASK: i64 = (1 << Y_BITS) - 1;
const Z_MASK: i64 = (1 << Z_BITS) - 1;

/// A chunk coordinate triple packed into one integer.
///
/// Layout, high to low: x (22 bits), y (22 bits), z (20 bits). Each field is
/// stored two's-complement and sign-extended on decode, so encode/decode
/// round-trips exactly for any in-range signed triple. Equality and hashing
/// are defined on the packed representation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ChunkIndex(i64);

impl ChunkIndex {
    /// Packs a chunk coordinate triple.
    pub const fn from_chunk(cx: BlockCoord, cy: BlockCoord, cz: BlockCoord) -> Self {
        ChunkIndex(
            ((cx as i64 & X_MASK) << (Y_BITS + Z_BITS))
                | ((cy as i64 & Y_MASK) << Z_BITS)
                | (cz as i64 & Z_MASK),
        )
    }

    /// Index of the chunk containing a global block coordinate triple.
    pub const fn from_block(x: BlockCoord, y: BlockCoord, z: BlockCoord) -> Self {
        Self::from_chunk(decompose_chunk(x), decompose_chunk(y), decompose_chunk(z))
    }

    /// Unpacks back into `(cx, cy, cz)`, sign-extending each field.
    pub const fn decode(self) -> (BlockCoord, BlockCoord, BlockCoord) {
        let raw = self.0;
        let cx = raw >> (Y_BITS + Z_BITS); // top field: arithmetic shift sign-extends
        let cy = (raw << X_BITS) >> (X_BITS + Z_BITS);
        let cz = (raw << (X_BITS + Y_BITS)) >> (X_BITS + Y_BITS);
        (cx as BlockCoord, cy as BlockCoord, cz as BlockCoord)
    }

    /// The packed representation.
    pub const fn repr(self) -> i64 {
        self.0
    }
}
