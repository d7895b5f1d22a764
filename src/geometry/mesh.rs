//! Regular planar grid mesh
//!
//! Vertices are laid out row by row starting at the top-left corner
//! (x = -w/2, y = +h/2), so row 0 is the top edge of the viewport.

use glam::{Vec2, Vec3};

use super::GeometryError;

/// Hard cap on vertex count (keeps index math and upload sizes sane)
pub const MAX_VERTICES: u64 = 1 << 20;

/// Shape of a grid: world extents plus tessellation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub width: f32,
    pub height: f32,
    pub segments_x: u32,
    pub segments_y: u32,
}

impl GridLayout {
    pub fn vertex_count(&self) -> usize {
        (self.segments_x as usize + 1) * (self.segments_y as usize + 1)
    }

    pub fn index_count(&self) -> usize {
        self.segments_x as usize * self.segments_y as usize * 6
    }
}

/// Tessellated plane with immutable base positions and a mutable working buffer
#[derive(Debug, Clone)]
pub struct Mesh {
    layout: GridLayout,
    /// Snapshot taken at build time; never written afterwards
    base: Vec<Vec3>,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    /// Working buffer is known to equal `base`
    at_base: bool,
    /// Buffers changed since the renderer last uploaded them
    dirty: bool,
}

impl Mesh {
    /// Build a `width` x `height` grid centred on the origin in the z = 0 plane
    pub fn build(
        width: f32,
        height: f32,
        segments_x: u32,
        segments_y: u32,
    ) -> Result<Self, GeometryError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(GeometryError::InvalidViewport { width, height });
        }
        if segments_x == 0 || segments_y == 0 {
            return Err(GeometryError::InvalidSegments {
                x: segments_x,
                y: segments_y,
            });
        }
        let vertices = (segments_x as u64 + 1) * (segments_y as u64 + 1);
        if vertices > MAX_VERTICES {
            return Err(GeometryError::TooManyVertices {
                x: segments_x,
                y: segments_y,
                vertices,
            });
        }

        let layout = GridLayout {
            width,
            height,
            segments_x,
            segments_y,
        };

        let columns = segments_x + 1;
        let step_x = width / segments_x as f32;
        let step_y = height / segments_y as f32;

        let mut base = Vec::with_capacity(layout.vertex_count());
        for iy in 0..=segments_y {
            let y = height * 0.5 - iy as f32 * step_y;
            for ix in 0..=segments_x {
                let x = -width * 0.5 + ix as f32 * step_x;
                base.push(Vec3::new(x, y, 0.0));
            }
        }

        // Two CCW triangles per cell, facing +z
        let mut indices = Vec::with_capacity(layout.index_count());
        for iy in 0..segments_y {
            for ix in 0..segments_x {
                let a = iy * columns + ix;
                let b = a + columns;
                indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
            }
        }

        let positions = base.iter().map(|p| p.to_array()).collect();
        let normals = vec![[0.0, 0.0, 1.0]; base.len()];

        log::info!(
            "Built {}x{} mesh ({:.2} x {:.2} world units, {} vertices)",
            segments_x,
            segments_y,
            width,
            height,
            base.len()
        );

        Ok(Self {
            layout,
            base,
            positions,
            normals,
            indices,
            at_base: true,
            dirty: true,
        })
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.base.len()
    }

    pub fn base_positions(&self) -> &[Vec3] {
        &self.base
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Working z minus base z for one vertex
    pub fn z_offset(&self, index: usize) -> f32 {
        self.positions[index][2] - self.base[index].z
    }

    /// True while the working buffer is known to equal the base snapshot
    pub fn is_at_base(&self) -> bool {
        self.at_base
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether an upload is pending and clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Copy base positions into the working buffer
    ///
    /// Normals must be recomputed afterwards if they were displaced.
    pub fn reset_to_base(&mut self) {
        for (dst, src) in self.positions.iter_mut().zip(&self.base) {
            *dst = src.to_array();
        }
        self.at_base = true;
        self.dirty = true;
    }

    /// Write `z = z0 + offset(xy)` for every vertex
    ///
    /// Always recomputed from the base snapshot, so repeated calls never drift.
    pub fn displace_with<F>(&mut self, offset: F)
    where
        F: Fn(Vec2) -> f32,
    {
        for (dst, src) in self.positions.iter_mut().zip(&self.base) {
            dst[2] = src.z + offset(src.truncate());
        }
        self.at_base = false;
        self.dirty = true;
    }

    /// Area-weighted vertex normals from the triangle faces
    pub fn recompute_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let a = Vec3::from_array(self.positions[tri[0] as usize]);
            let b = Vec3::from_array(self.positions[tri[1] as usize]);
            let c = Vec3::from_array(self.positions[tri[2] as usize]);
            // Unnormalized cross product weights by face area
            let face = (b - a).cross(c - a);
            for &vid in tri {
                accum[vid as usize] += face;
            }
        }
        for (dst, n) in self.normals.iter_mut().zip(accum) {
            *dst = n.try_normalize().unwrap_or(Vec3::Z).to_array();
        }
        self.dirty = true;
    }

    /// Index of the base vertex closest to `p` in the xy plane
    pub fn nearest_vertex(&self, p: Vec2) -> usize {
        let GridLayout {
            width,
            height,
            segments_x,
            segments_y,
        } = self.layout;
        let fx = ((p.x + width * 0.5) / width * segments_x as f32).round();
        let fy = ((height * 0.5 - p.y) / height * segments_y as f32).round();
        let ix = fx.clamp(0.0, segments_x as f32) as usize;
        let iy = fy.clamp(0.0, segments_y as f32) as usize;
        iy * (segments_x as usize + 1) + ix
    }
}
