//! Viewport and coordinate mapping
//!
//! Rect sources never see pixels. Measurements arrive from the host as CSS
//! pixel rectangles (top-left origin, y down) and are mapped here into the
//! mesh's world units (centred origin, y up).

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::surface::{Rect, SourceId};

/// A measured on-screen rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub left: f32,
    #[serde(default)]
    pub corner_radius: f32,
}

/// World extents of the visible plane and the pixel size of the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub world_width: f32,
    pub world_height: f32,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Viewport {
    pub fn new(world_width: f32, world_height: f32, screen_width: f32, screen_height: f32) -> Self {
        Self {
            world_width,
            world_height,
            screen_width,
            screen_height,
        }
    }

    /// Fit a fixed world height; width follows the screen aspect ratio
    pub fn fit_height(screen_width: f32, screen_height: f32, world_height: f32) -> Self {
        let aspect = if screen_height > 0.0 {
            screen_width / screen_height
        } else {
            1.0
        };
        Self::new(world_height * aspect, world_height, screen_width, screen_height)
    }

    /// All four extents positive and finite
    pub fn is_valid(&self) -> bool {
        [
            self.world_width,
            self.world_height,
            self.screen_width,
            self.screen_height,
        ]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Map a pixel rectangle into world units
    ///
    /// Returns None when the viewport itself is unusable. Degenerate pixel
    /// sizes map to degenerate rects, which sources treat as absent.
    pub fn rect_to_world(&self, px: &PixelRect) -> Option<Rect> {
        if !self.is_valid() {
            return None;
        }
        let sx = self.world_width / self.screen_width;
        let sy = self.world_height / self.screen_height;

        let center = self.point_to_world(px.left + px.width * 0.5, px.top + px.height * 0.5);
        Some(Rect {
            width: px.width * sx,
            height: px.height * sy,
            // Same horizontal ratio as the width
            corner_radius: px.corner_radius * sx,
            center,
        })
    }

    /// Map a pixel position (top-left origin) into world units
    pub fn point_to_world(&self, x: f32, y: f32) -> Vec2 {
        if !self.is_valid() {
            return Vec2::ZERO;
        }
        Vec2::new(
            (x / self.screen_width - 0.5) * self.world_width,
            -(y / self.screen_height - 0.5) * self.world_height,
        )
    }
}

/// A measurement pushed by the host for one tracked region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub source: SourceId,
    /// None when the region unmounted
    pub rect: Option<PixelRect>,
}

/// Asynchronous source of region measurements (resize/layout observers)
///
/// Values may lag the real layout by a frame or more; the engine drains the
/// channel once at the start of each frame.
pub trait MeasurementChannel {
    fn drain(&mut self) -> Vec<Measurement>;
}

/// In-memory FIFO channel; the browser host pushes into it from JS callbacks
#[derive(Debug, Default)]
pub struct QueuedChannel {
    pending: VecDeque<Measurement>,
}

impl QueuedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: SourceId, rect: Option<PixelRect>) {
        self.pending.push_back(Measurement { source, rect });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl MeasurementChannel for QueuedChannel {
    fn drain(&mut self) -> Vec<Measurement> {
        self.pending.drain(..).collect()
    }
}
