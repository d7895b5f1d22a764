//! Pointer source
//!
//! A radial indentation that follows drag input. The source also decides
//! whether a press/release pair was a click or a drag.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sdf::radial_ease;
use super::spring::Spring;
use crate::consts::{DRAG_THRESHOLD, POINTER_DEPTH, POINTER_RADIUS};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerParams {
    /// Radius of the cosine bump in world units
    pub radius: f32,
    /// Depth at full strength (applied downward)
    pub depth: f32,
    /// Travel beyond which a gesture is a drag
    pub drag_threshold: f32,
}

impl Default for PointerParams {
    fn default() -> Self {
        Self {
            radius: POINTER_RADIUS,
            depth: POINTER_DEPTH,
            drag_threshold: DRAG_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerState {
    pub is_down: bool,
    /// Last pressed/dragged position in world units
    pub position: Vec2,
    pub strength: Spring,
    /// Where the current gesture began
    press_origin: Option<Vec2>,
    /// Current gesture has exceeded the drag threshold
    dragged: bool,
}

impl PointerState {
    pub fn new(omega: f32) -> Self {
        Self {
            is_down: false,
            position: Vec2::ZERO,
            strength: Spring::new(omega),
            press_origin: None,
            dragged: false,
        }
    }

    /// Begin a gesture
    pub fn press(&mut self, position: Vec2) {
        self.is_down = true;
        self.position = position;
        self.press_origin = Some(position);
        self.dragged = false;
        self.strength.set_target(1.0);
    }

    /// Follow a drag. Hover movement with no button down is ignored.
    pub fn drag(&mut self, position: Vec2, drag_threshold: f32) {
        if !self.is_down {
            return;
        }
        self.position = position;
        if let Some(origin) = self.press_origin {
            if origin.distance(position) > drag_threshold {
                self.dragged = true;
            }
        }
    }

    /// End the gesture. Returns the click position if it never became a drag.
    pub fn release(&mut self) -> Option<Vec2> {
        if !self.is_down {
            return None;
        }
        let click = (!self.dragged).then_some(self.position);
        self.end_gesture();
        click
    }

    /// End the gesture without reporting a click (e.g. browser pointercancel)
    pub fn cancel(&mut self) {
        if self.is_down {
            self.end_gesture();
        }
    }

    fn end_gesture(&mut self) {
        self.is_down = false;
        self.press_origin = None;
        self.dragged = false;
        self.strength.set_target(0.0);
    }

    pub fn is_dragging(&self) -> bool {
        self.is_down && self.dragged
    }

    pub fn step(&mut self, dt: f32) {
        self.strength.step(dt);
    }

    /// Displacement at `p`
    pub fn contribution(&self, p: Vec2, params: &PointerParams) -> f32 {
        if self.strength.value == 0.0 {
            return 0.0;
        }
        let d = p.distance(self.position);
        -params.depth * self.strength.value * radial_ease(d, params.radius)
    }
}
