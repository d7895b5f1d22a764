//! Geometry provider
//!
//! Owns the tessellated plane. Base positions are snapshotted at build time
//! and never change; only the working z is rewritten each frame.

pub mod mesh;

pub use mesh::{GridLayout, Mesh, MAX_VERTICES};

/// Reasons a mesh cannot be built
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("viewport must have positive, finite dimensions (got {width}x{height})")]
    InvalidViewport { width: f32, height: f32 },

    #[error("segment counts must be at least 1 (got {x}x{y})")]
    InvalidSegments { x: u32, y: u32 },

    #[error("{x}x{y} segments would need {vertices} vertices (limit {})", MAX_VERTICES)]
    TooManyVertices { x: u32, y: u32, vertices: u64 },
}
