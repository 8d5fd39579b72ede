//! Per-face quad geometry for ordinary cube blocks.
//!
//! Every visible face becomes exactly one textured unit quad: 4 vertices and
//! 6 indices. The per-side vertex winding below is a contract: every block
//! variant emits the same order, so face normals always point outward and
//! backface culling works no matter which variant produced the quad.

use crate::render::{MeshData, MeshVertex};
use crate::voxels::block::block_side::BlockSide;
use crate::voxels::coords::BlockCoord;

/// Index into the texture atlas' fixed grid of square tiles.
pub type TileId = u32;

/// Tiles per atlas row (and column): a 16x16 grid of sub-images.
pub const ATLAS_TILES_PER_ROW: u32 = 16;

const TILE_UV: f32 = 1.0 / ATLAS_TILES_PER_ROW as f32;

// Unit cube corners, z-up: "front" is the -y side, "top" the +z side.
const FRONT_BOTTOM_LEFT: [f32; 3] = [0.0, 0.0, 0.0];
const FRONT_BOTTOM_RIGHT: [f32; 3] = [1.0, 0.0, 0.0];
const FRONT_TOP_LEFT: [f32; 3] = [0.0, 0.0, 1.0];
const FRONT_TOP_RIGHT: [f32; 3] = [1.0, 0.0, 1.0];
const BACK_BOTTOM_LEFT: [f32; 3] = [0.0, 1.0, 0.0];
const BACK_BOTTOM_RIGHT: [f32; 3] = [1.0, 1.0, 0.0];
const BACK_TOP_LEFT: [f32; 3] = [0.0, 1.0, 1.0];
const BACK_TOP_RIGHT: [f32; 3] = [1.0, 1.0, 1.0];

/// Quad corner UVs inside one tile, matching the vertex order of the corner
/// tables below.
const TEXTURE_POINTS: [[f32; 2]; 4] = [[TILE_UV, TILE_UV], [TILE_UV, 0.0], [0.0, 0.0], [0.0, TILE_UV]];

/// Two triangles over the 4 quad corners.
const FACE_INDICES: [u32; 6] = [1, 2, 3, 3, 0, 1];

/// Outward-wound corner order for each face.
const fn face_corners(side: BlockSide) -> [[f32; 3]; 4] {
    match side {
        BlockSide::Front => [
            FRONT_BOTTOM_RIGHT,
            FRONT_TOP_RIGHT,
            FRONT_TOP_LEFT,
            FRONT_BOTTOM_LEFT,
        ],
        BlockSide::Back => [
            BACK_BOTTOM_LEFT,
            BACK_TOP_LEFT,
            BACK_TOP_RIGHT,
            BACK_BOTTOM_RIGHT,
        ],
        BlockSide::Top => [
            FRONT_TOP_RIGHT,
            BACK_TOP_RIGHT,
            BACK_TOP_LEFT,
            FRONT_TOP_LEFT,
        ],
        BlockSide::Bottom => [
            BACK_BOTTOM_RIGHT,
            FRONT_BOTTOM_RIGHT,
            FRONT_BOTTOM_LEFT,
            BACK_BOTTOM_LEFT,
        ],
        BlockSide::Left => [
            FRONT_BOTTOM_LEFT,
            FRONT_TOP_LEFT,
            BACK_TOP_LEFT,
            BACK_BOTTOM_LEFT,
        ],
        BlockSide::Right => [
            BACK_BOTTOM_RIGHT,
            BACK_TOP_RIGHT,
            FRONT_TOP_RIGHT,
            FRONT_BOTTOM_RIGHT,
        ],
    }
}

/// Builds the quad for one face of the unit block whose corner sits at the
/// global block coordinate `(x, y, z)`, textured with atlas tile `tile`.
pub fn face_mesh(x: BlockCoord, y: BlockCoord, z: BlockCoord, tile: TileId, side: BlockSide) -> MeshData {
    let tile_x = (tile % ATLAS_TILES_PER_ROW) as f32 * TILE_UV;
    let tile_y = (tile / ATLAS_TILES_PER_ROW) as f32 * TILE_UV;
    let at = [x as f32, y as f32, z as f32];

    let corners = face_corners(side);
    let vertices = std::array::from_fn::<_, 4, _>(|i| MeshVertex {
        position: [
            corners[i][0] + at[0],
            corners[i][1] + at[1],
            corners[i][2] + at[2],
        ],
        uv: [
            TEXTURE_POINTS[i][0] + tile_x,
            TEXTURE_POINTS[i][1] + tile_y,
        ],
    })
    .to_vec();

    MeshData {
        vertices,
        indices: FACE_INDICES.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn triangle_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Vector3<f32> {
        let ab = Vector3::from(b) - Vector3::from(a);
        let bc = Vector3::from(c) - Vector3::from(b);
        ab.cross(bc).normalize()
    }

    #[test]
    fn every_face_is_one_quad() {
        for side in BlockSide::all() {
            let mesh = face_mesh(0, 0, 0, 0, side);
            assert_eq!(mesh.vertices.len(), 4);
            assert_eq!(mesh.indices.len(), 6);
        }
    }

    #[test]
    fn winding_points_outward_on_all_sides() {
        for side in BlockSide::all() {
            let mesh = face_mesh(0, 0, 0, 0, side);
            let (dx, dy, dz) = side.offset();
            let outward = Vector3::new(dx as f32, dy as f32, dz as f32);

            // Both triangles of the quad must agree with the face normal.
            for tri in mesh.indices.chunks(3) {
                let normal = triangle_normal(
                    mesh.vertices[tri[0] as usize].position,
                    mesh.vertices[tri[1] as usize].position,
                    mesh.vertices[tri[2] as usize].position,
                );
                assert!(
                    normal.dot(outward) > 0.99,
                    "{:?} winding flipped: normal {:?}",
                    side,
                    normal
                );
            }
        }
    }

    #[test]
    fn face_sits_on_its_block_plane() {
        let mesh = face_mesh(3, -2, 10, 0, BlockSide::Top);
        assert!(mesh.vertices.iter().all(|v| v.position[2] == 11.0));

        let mesh = face_mesh(3, -2, 10, 0, BlockSide::Left);
        assert!(mesh.vertices.iter().all(|v| v.position[0] == 3.0));
    }

    #[test]
    fn uvs_stay_inside_the_tile() {
        let tile = 19; // row 1, column 3
        let origin = [3.0 * TILE_UV, TILE_UV];
        let mesh = face_mesh(0, 0, 0, tile, BlockSide::Front);
        for v in &mesh.vertices {
            assert!(v.uv[0] >= origin[0] && v.uv[0] <= origin[0] + TILE_UV);
            assert!(v.uv[1] >= origin[1] && v.uv[1] <= origin[1] + TILE_UV);
        }
    }
}
