//! Warp Grid - a UI-reactive deforming surface
//!
//! Core modules:
//! - `geometry`: Tessellated plane mesh with immutable base positions
//! - `surface`: Bump and ripple sources, spring animation, per-frame tick
//! - `viewport`: Pixel-space to world-space mapping and the measurement channel
//! - `engine`: Single owner of all mutable state, driven by the frame loop
//! - `renderer`: WebGPU mesh pipeline
//! - `settings`: Quality presets and tuning
//! - `demo`: Seeded scripted UI sessions for headless runs

pub mod demo;
pub mod engine;
pub mod geometry;
pub mod renderer;
pub mod settings;
pub mod surface;
pub mod viewport;

pub use engine::Engine;
pub use settings::{QualityPreset, Settings, Tuning};

/// Surface configuration constants
pub mod consts {
    /// Nominal frame step (60 Hz), used for the first frame and headless runs
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest dt a single frame may advance (tab switches, debugger stalls)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Pointer bump radius in world units
    pub const POINTER_RADIUS: f32 = 5.0 / 3.0;
    /// Pointer bump depth at full strength (applied as an indentation)
    pub const POINTER_DEPTH: f32 = 1.5;
    /// World-space travel after which a press counts as a drag, not a click
    pub const DRAG_THRESHOLD: f32 = 0.15;

    /// Ripple lifetime in seconds
    pub const RIPPLE_DURATION: f32 = 2.0;
    /// Wavefront speed in world units per second
    pub const RIPPLE_SPEED: f32 = 5.0;
    /// Width of the travelling band
    pub const RIPPLE_WIDTH: f32 = 1.5;
    /// Peak ripple displacement
    pub const RIPPLE_AMPLITUDE: f32 = 0.4;

    /// Angular frequency of the strength springs (critically damped)
    pub const SPRING_OMEGA: f32 = 10.0;

    /// World height the camera always fits; width follows the screen aspect
    pub const WORLD_HEIGHT: f32 = 10.0;
    /// Upper bound on segments per axis regardless of preset
    pub const MAX_SEGMENTS: u32 = 160;
}
