//! Surface state and core data types
//!
//! Everything the frame loop mutates lives in [`SurfaceState`]; the mesh is
//! owned alongside it by the engine.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pointer::{PointerParams, PointerState};
use super::ripple::{RippleParams, RippleScheduler};
use super::sdf::{falloff, sd_rounded_box};
use super::spring::Spring;
use crate::settings::Tuning;

/// Named rect sources tracked by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceId {
    /// Primary modal dialog
    Dialog,
    /// Secondary/profile dialog
    SecondaryDialog,
    /// Focused grid tile
    Tile,
    /// Segmented control strip
    SegmentedControl,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Dialog,
        SourceId::SecondaryDialog,
        SourceId::Tile,
        SourceId::SegmentedControl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Dialog => "dialog",
            SourceId::SecondaryDialog => "secondary_dialog",
            SourceId::Tile => "tile",
            SourceId::SegmentedControl => "segmented_control",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dialog" => Some(SourceId::Dialog),
            "secondary_dialog" | "secondary" | "profile" => Some(SourceId::SecondaryDialog),
            "tile" => Some(SourceId::Tile),
            "segmented_control" | "segmented" | "control" => Some(SourceId::SegmentedControl),
            _ => None,
        }
    }
}

/// Influence area of a UI region, in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    /// Defaults to the origin
    #[serde(default)]
    pub center: Vec2,
}

impl Rect {
    pub fn new(width: f32, height: f32, corner_radius: f32) -> Self {
        Self {
            width,
            height,
            corner_radius,
            center: Vec2::ZERO,
        }
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    /// Zero, negative or non-finite extents; treated as absent
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite()
            && self.height.is_finite()
            && self.center.is_finite()
            && self.width > 0.0
            && self.height > 0.0)
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * 0.5
    }

    /// Corner radius limited to what fits inside `half_extents`
    pub fn fitted_corner_radius(&self, half_extents: Vec2) -> f32 {
        let r = if self.corner_radius.is_finite() {
            self.corner_radius
        } else {
            0.0
        };
        r.clamp(0.0, half_extents.min_element().max(0.0))
    }

    /// Signed distance from `p` to this rect scaled about its centre
    pub fn signed_distance(&self, p: Vec2, scale: f32) -> f32 {
        let half = self.half_extents() * scale;
        sd_rounded_box(p - self.center, half, self.fitted_corner_radius(half))
    }
}

/// Per-source bump configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Displacement at full strength (negative indents)
    pub strength: f32,
    /// Distance over which the bump fades to zero outside the rect
    pub edge_softness: f32,
    /// Footprint scale relative to the rect's visual size
    pub scale: f32,
}

impl SourceConfig {
    /// Default tuning for each named source
    pub fn defaults_for(id: SourceId) -> Self {
        match id {
            SourceId::Dialog => Self {
                strength: -1.2,
                edge_softness: 1.5,
                scale: 1.0,
            },
            SourceId::SecondaryDialog => Self {
                strength: -1.0,
                edge_softness: 1.5,
                scale: 1.0,
            },
            SourceId::Tile => Self {
                strength: -0.8,
                edge_softness: 1.0,
                scale: 1.05,
            },
            SourceId::SegmentedControl => Self {
                strength: -0.5,
                edge_softness: 0.6,
                scale: 1.1,
            },
        }
    }
}

/// A named bump source: nullable rect plus spring-animated strength
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectSource {
    pub id: SourceId,
    /// Latest rect pushed by the host (None = region unmounted)
    pub rect: Option<Rect>,
    /// Shape used while strength is nonzero; outlives `rect` during fade-out
    pub footprint: Option<Rect>,
    pub strength: Spring,
    pub config: SourceConfig,
}

impl RectSource {
    pub fn new(id: SourceId, config: SourceConfig, omega: f32) -> Self {
        Self {
            id,
            rect: None,
            footprint: None,
            strength: Spring::new(omega),
            config,
        }
    }

    /// The current rect if it is present and usable
    pub fn active_rect(&self) -> Option<&Rect> {
        self.rect.as_ref().filter(|r| !r.is_degenerate())
    }

    pub fn is_present(&self) -> bool {
        self.active_rect().is_some()
    }

    pub fn set_rect(&mut self, rect: Option<Rect>) {
        self.rect = rect;
    }

    /// Retarget the spring from presence and advance it by `dt`
    pub fn step(&mut self, dt: f32) {
        if let Some(rect) = self.active_rect().copied() {
            self.footprint = Some(rect);
            self.strength.set_target(self.config.strength);
        } else {
            self.strength.set_target(0.0);
        }
        self.strength.step(dt);
        if self.strength.value == 0.0 && self.strength.is_settled() && !self.is_present() {
            self.footprint = None;
        }
    }

    /// True when this source adds anything to the field
    pub fn is_contributing(&self) -> bool {
        self.strength.value != 0.0 && self.footprint.is_some()
    }

    /// Displacement at `p`
    pub fn contribution(&self, p: Vec2) -> f32 {
        let Some(rect) = self.footprint else {
            return 0.0;
        };
        let d = rect.signed_distance(p, self.config.scale);
        self.strength.value * falloff(d, self.config.edge_softness)
    }
}

/// Notifications raised by the surface for the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Pointer released without exceeding the drag threshold
    GridClicked { position: Vec2 },
    /// A ripple began travelling
    RippleStarted { source: SourceId, opening: bool },
    /// The active ripple expired
    RippleFinished,
}

/// All mutable per-frame state except the mesh
#[derive(Debug, Clone)]
pub struct SurfaceState {
    /// Seconds since the engine started
    pub time: f64,
    /// Frames ticked since start
    pub frame: u64,
    pub pointer: PointerState,
    pub pointer_params: PointerParams,
    pub pointer_enabled: bool,
    /// Named source table (stable iteration order)
    pub sources: BTreeMap<SourceId, RectSource>,
    pub ripples: RippleScheduler,
    pub ripple_params: RippleParams,
    /// Pending notifications, drained by the host
    pub events: Vec<SurfaceEvent>,
}

impl SurfaceState {
    /// Fresh state at rest: no rects, no pointer, no ripple
    pub fn new(tuning: &Tuning) -> Self {
        let sources = SourceId::ALL
            .iter()
            .map(|&id| {
                (
                    id,
                    RectSource::new(id, tuning.source_config(id), tuning.spring_omega),
                )
            })
            .collect();

        Self {
            time: 0.0,
            frame: 0,
            pointer: PointerState::new(tuning.spring_omega),
            pointer_params: tuning.pointer,
            pointer_enabled: true,
            sources,
            ripples: RippleScheduler::new(),
            ripple_params: tuning.ripple,
            events: Vec::new(),
        }
    }

    /// Apply new tuning without touching rects, springs or an active ripple
    pub fn retune(&mut self, tuning: &Tuning) {
        for (id, source) in self.sources.iter_mut() {
            source.config = tuning.source_config(*id);
            source.strength.omega = tuning.spring_omega;
        }
        self.pointer.strength.omega = tuning.spring_omega;
        self.pointer_params = tuning.pointer;
        self.ripple_params = tuning.ripple;
    }

    /// Return every animation to rest while keeping the host-owned rects
    ///
    /// Springs, footprints, the pointer gesture, the travelling ripple and
    /// pending events are discarded. The ripple snapshot is seeded with the
    /// rects still present so they ramp back in without launching a ripple.
    pub fn reset_motion(&mut self, tuning: &Tuning) {
        for source in self.sources.values_mut() {
            source.strength = Spring::new(tuning.spring_omega);
            source.footprint = None;
        }
        self.pointer = PointerState::new(tuning.spring_omega);
        let presence = self.presence();
        self.ripples.clear_with(presence);
        self.events.clear();
    }

    pub fn source(&self, id: SourceId) -> Option<&RectSource> {
        self.sources.get(&id)
    }

    pub fn set_rect(&mut self, id: SourceId, rect: Option<Rect>) {
        if let Some(source) = self.sources.get_mut(&id) {
            let was_present = source.is_present();
            source.set_rect(rect);
            if source.is_present() != was_present {
                log::debug!(
                    "{} {}",
                    id.as_str(),
                    if was_present { "vanished" } else { "appeared" }
                );
            }
        }
    }

    /// Present (non-degenerate) rects keyed by source, as seen this frame
    pub fn presence(&self) -> BTreeMap<SourceId, Rect> {
        self.sources
            .iter()
            .filter_map(|(id, s)| s.active_rect().map(|r| (*id, *r)))
            .collect()
    }

    /// No strength, no ripple: the field is exactly flat
    pub fn is_idle(&self) -> bool {
        self.pointer.strength.value == 0.0
            && self.sources.values().all(|s| s.strength.value == 0.0)
            && !self.ripples.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_names_round_trip() {
        for id in SourceId::ALL {
            assert_eq!(SourceId::from_str(id.as_str()), Some(id));
        }
        assert_eq!(SourceId::from_str("Profile"), Some(SourceId::SecondaryDialog));
        assert_eq!(SourceId::from_str("sidebar"), None);
    }

    #[test]
    fn test_degenerate_rects() {
        assert!(Rect::new(0.0, 1.0, 0.0).is_degenerate());
        assert!(Rect::new(1.0, -1.0, 0.0).is_degenerate());
        assert!(Rect::new(f32::NAN, 1.0, 0.0).is_degenerate());
        assert!(!Rect::new(1.0, 1.0, 0.0).is_degenerate());
    }

    #[test]
    fn test_corner_radius_is_fitted() {
        let rect = Rect::new(2.0, 1.0, 5.0);
        assert_eq!(rect.fitted_corner_radius(rect.half_extents()), 0.5);
        let rect = Rect::new(2.0, 1.0, -1.0);
        assert_eq!(rect.fitted_corner_radius(rect.half_extents()), 0.0);
    }

    #[test]
    fn test_degenerate_rect_is_absent() {
        let config = SourceConfig::defaults_for(SourceId::Tile);
        let mut source = RectSource::new(SourceId::Tile, config, 10.0);
        source.set_rect(Some(Rect::new(0.0, 2.0, 0.0)));
        assert!(!source.is_present());
        for _ in 0..60 {
            source.step(1.0 / 60.0);
        }
        assert_eq!(source.strength.value, 0.0);
        assert_eq!(source.contribution(Vec2::ZERO), 0.0);
    }

    #[test]
    fn test_source_fades_out_with_last_footprint() {
        let config = SourceConfig {
            strength: -1.0,
            edge_softness: 1.0,
            scale: 1.0,
        };
        let mut source = RectSource::new(SourceId::Dialog, config, 10.0);
        source.set_rect(Some(Rect::new(2.0, 2.0, 0.2)));
        for _ in 0..240 {
            source.step(1.0 / 60.0);
        }
        assert_eq!(source.strength.value, -1.0);

        source.set_rect(None);
        source.step(1.0 / 60.0);
        // Still shaped by the previous rect while decaying
        let mid = source.contribution(Vec2::ZERO);
        assert!(mid < 0.0 && mid > -1.0);

        for _ in 0..240 {
            source.step(1.0 / 60.0);
        }
        assert_eq!(source.strength.value, 0.0);
        assert!(source.footprint.is_none());
        assert!(!source.is_contributing());
    }

    #[test]
    fn test_contribution_center_and_far_field() {
        let config = SourceConfig {
            strength: -0.8,
            edge_softness: 1.0,
            scale: 1.0,
        };
        let mut source = RectSource::new(SourceId::Tile, config, 10.0);
        source.set_rect(Some(Rect::new(2.0, 1.0, 0.1).with_center(Vec2::new(1.0, 1.0))));
        source.strength.value = -0.8;
        source.footprint = source.rect;
        assert!((source.contribution(Vec2::new(1.0, 1.0)) + 0.8).abs() < 1e-6);
        // 1 unit beyond the right edge (x = 2) plus softness 1
        assert_eq!(source.contribution(Vec2::new(3.5, 1.0)), 0.0);
    }

    #[test]
    fn test_scale_enlarges_footprint() {
        let rect = Rect::new(2.0, 2.0, 0.0);
        let p = Vec2::new(1.2, 0.0);
        assert!(rect.signed_distance(p, 1.0) > 0.0);
        assert!(rect.signed_distance(p, 1.5) < 0.0);
    }

    #[test]
    fn test_fresh_state_is_idle() {
        let state = SurfaceState::new(&Tuning::default());
        assert!(state.is_idle());
        assert_eq!(state.sources.len(), SourceId::ALL.len());
        assert!(state.presence().is_empty());
    }

    #[test]
    fn test_reset_motion_keeps_rects() {
        let tuning = Tuning::default();
        let mut state = SurfaceState::new(&tuning);
        state.set_rect(SourceId::Tile, Some(Rect::new(2.0, 2.0, 0.2)));
        if let Some(tile) = state.sources.get_mut(&SourceId::Tile) {
            for _ in 0..120 {
                tile.step(1.0 / 60.0);
            }
        }
        state.pointer.press(Vec2::ZERO);
        state.events.push(SurfaceEvent::RippleFinished);

        state.reset_motion(&tuning);
        assert!(state.is_idle());
        assert!(state.events.is_empty());
        assert!(!state.pointer.is_down);
        let tile = state.source(SourceId::Tile).unwrap();
        assert!(tile.is_present());
        assert!(tile.footprint.is_none());
        assert_eq!(tile.strength.value, 0.0);
    }
}
