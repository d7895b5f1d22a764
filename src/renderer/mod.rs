//! WebGPU rendering module
//!
//! Draws the displaced grid as a lit, indexed triangle mesh.

pub mod mesh_pipeline;
pub mod vertex;

pub use mesh_pipeline::{MeshRenderState, RendererError};
pub use vertex::{MeshVertex, interleave};
