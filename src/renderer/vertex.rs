//! Vertex types for the lit grid

use bytemuck::{Pod, Zeroable};

use crate::geometry::Mesh;

/// Interleaved position + normal
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Pack the mesh working buffers for upload, reusing `out`'s allocation
pub fn interleave(mesh: &Mesh, out: &mut Vec<MeshVertex>) {
    out.clear();
    out.extend(
        mesh.positions()
            .iter()
            .zip(mesh.normals())
            .map(|(p, n)| MeshVertex::new(*p, *n)),
    );
}

/// Surface colors
pub mod colors {
    pub const GRID_BASE: [f32; 4] = [0.16, 0.18, 0.24, 1.0];
    /// Tint blended in where the surface is pushed down
    pub const GRID_DEEP: [f32; 4] = [0.05, 0.06, 0.12, 1.0];
    pub const LINE: [f32; 4] = [0.35, 0.4, 0.55, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.05, 1.0];
}
