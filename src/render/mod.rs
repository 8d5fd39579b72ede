//! # Render Interface
//!
//! The engine core produces CPU-side geometry only. Everything GPU-shaped
//! (buffer upload, draw calls, shader binding) lives behind the narrow traits
//! in this module, implemented by whatever renderer hosts the world. Mesh
//! *construction* is safe from any thread; mesh *upload* happens only where
//! the host calls [`World::draw`](crate::voxels::world::World::draw), on its
//! render thread.

use cgmath::Matrix4;

/// One vertex of a block face: position plus atlas texture coordinates.
///
/// `#[repr(C)]` + `Pod` so a renderer can hand the vertex buffer straight to
/// the GPU without copying.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Normalized texture-atlas coordinates.
    pub uv: [f32; 2],
}

/// An ordered vertex sequence plus a triangle-list index sequence.
///
/// Faces are appended one quad at a time; [`MeshData::append`] offsets the
/// incoming indices by the running vertex count so the combined index buffer
/// stays valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex buffer contents.
    pub vertices: Vec<MeshVertex>,
    /// Triangle-list index buffer contents.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// An empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no face has been emitted.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Concatenates `other` onto this mesh, rebasing its indices onto the
    /// current vertex count.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.indices.extend(other.indices.iter().map(|i| i + base));
        self.vertices.extend_from_slice(&other.vertices);
    }
}

/// An opaque drawable produced by the host renderer from a [`MeshData`].
pub trait RenderMesh: Send {
    /// Issues the draw call for this mesh.
    fn draw(&self);
}

/// Builds drawable mesh handles out of CPU-side geometry.
pub trait MeshUploader {
    /// Uploads `mesh` and returns a handle that can be drawn.
    fn upload(&self, mesh: &MeshData) -> Box<dyn RenderMesh>;
}

/// The minimal shader surface the world needs before drawing chunks.
pub trait Shader {
    /// Makes this shader current.
    fn bind(&self);
    /// Pushes the combined view-projection matrix.
    fn update(&self, view_projection: Matrix4<f32>);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            vertices: vec![
                MeshVertex { position: [0.0, 0.0, 0.0], uv: [0.0, 0.0] },
                MeshVertex { position: [1.0, 0.0, 0.0], uv: [1.0, 0.0] },
                MeshVertex { position: [1.0, 1.0, 0.0], uv: [1.0, 1.0] },
                MeshVertex { position: [0.0, 1.0, 0.0], uv: [0.0, 1.0] },
            ],
            indices: vec![1, 2, 3, 3, 0, 1],
        }
    }

    #[test]
    fn append_rebases_indices() {
        let mut mesh = MeshData::new();
        mesh.append(&quad());
        mesh.append(&quad());

        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 12);
        assert_eq!(&mesh.indices[6..], &[5, 6, 7, 7, 4, 5]);
    }
}
