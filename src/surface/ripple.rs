//! Ripple scheduler
//!
//! Watches rect presence frame to frame and launches a single travelling
//! wavefront when a tracked region appears or disappears. At most one ripple
//! exists at a time; transitions seen while one is travelling are dropped.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::sdf::{band_profile, sd_rounded_box};
use super::state::{Rect, SourceId};
use crate::consts::{RIPPLE_AMPLITUDE, RIPPLE_DURATION, RIPPLE_SPEED, RIPPLE_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RippleParams {
    /// Lifetime in seconds
    pub duration: f32,
    /// Wavefront speed in world units per second
    pub speed: f32,
    /// Band width in world units
    pub width: f32,
    /// Peak displacement
    pub amplitude: f32,
}

impl Default for RippleParams {
    fn default() -> Self {
        Self {
            duration: RIPPLE_DURATION,
            speed: RIPPLE_SPEED,
            width: RIPPLE_WIDTH,
            amplitude: RIPPLE_AMPLITUDE,
        }
    }
}

/// A travelling wavefront launched from a rect's outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RippleEvent {
    pub origin: Rect,
    /// Surface clock time at launch
    pub start_time: f64,
    /// Opening ripples push down, closing ripples push up
    pub is_opening: bool,
    pub active: bool,
}

impl RippleEvent {
    pub fn elapsed(&self, now: f64) -> f32 {
        (now - self.start_time).max(0.0) as f32
    }

    /// Linear fade to exactly zero at the end of the lifetime
    pub fn decay(&self, now: f64, params: &RippleParams) -> f32 {
        if params.duration <= 0.0 {
            return 0.0;
        }
        (1.0 - self.elapsed(now) / params.duration).max(0.0)
    }

    /// Displacement at `p`
    pub fn contribution(&self, p: Vec2, now: f64, params: &RippleParams) -> f32 {
        if !self.active {
            return 0.0;
        }
        let elapsed = self.elapsed(now);
        let wavefront = elapsed * params.speed;

        let half = self.origin.half_extents();
        let radius = self.origin.fitted_corner_radius(half);
        let dist = sd_rounded_box(p - self.origin.center, half, radius);
        let factor = band_profile((dist - wavefront).abs(), params.width);
        if factor == 0.0 {
            return 0.0;
        }

        let sign = if self.is_opening { -1.0 } else { 1.0 };
        factor * self.decay(now, params) * params.amplitude * sign
    }
}

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RipplePhase {
    Idle,
    Active,
}

/// Presence change of one source between two frames
#[derive(Debug, Clone, Copy, PartialEq)]
enum Flip {
    Unchanged,
    Appeared(Rect),
    Vanished(Rect),
}

impl Flip {
    fn between(previous: Option<&Rect>, current: Option<&Rect>) -> Self {
        match (previous, current) {
            (None, Some(now)) => Flip::Appeared(*now),
            (Some(before), None) => Flip::Vanished(*before),
            _ => Flip::Unchanged,
        }
    }

    /// Origin and direction for a single-source flip
    fn launch(self) -> Option<(Rect, bool)> {
        match self {
            Flip::Appeared(rect) => Some((rect, true)),
            Flip::Vanished(rect) => Some((rect, false)),
            Flip::Unchanged => None,
        }
    }
}

/// What changed during one scheduler update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RippleUpdate {
    /// Source credited with a newly launched ripple, and whether it opens
    pub started: Option<(SourceId, bool)>,
    /// The previous ripple expired this frame
    pub finished: bool,
    /// A transition was seen but dropped because a ripple was travelling
    pub dropped: bool,
}

#[derive(Debug, Clone)]
pub struct RippleScheduler {
    /// Present rects as of the previous frame
    previous: BTreeMap<SourceId, Rect>,
    current: Option<RippleEvent>,
    /// When false, transitions are still tracked but never launch
    pub enabled: bool,
}

impl Default for RippleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RippleScheduler {
    pub fn new() -> Self {
        Self {
            previous: BTreeMap::new(),
            current: None,
            enabled: true,
        }
    }

    pub fn phase(&self) -> RipplePhase {
        if self.current.is_some() {
            RipplePhase::Active
        } else {
            RipplePhase::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn active(&self) -> Option<&RippleEvent> {
        self.current.as_ref()
    }

    /// Drop any travelling ripple and treat `presence` as already seen
    ///
    /// Rects that are still on screen therefore do not count as appearing
    /// on the next update.
    pub fn clear_with(&mut self, presence: BTreeMap<SourceId, Rect>) {
        self.previous = presence;
        self.current = None;
    }

    /// Compare this frame's presence with the last and advance the state machine
    ///
    /// `presence` holds only sources whose rect is present this frame.
    pub fn update(
        &mut self,
        presence: &BTreeMap<SourceId, Rect>,
        now: f64,
        params: &RippleParams,
    ) -> RippleUpdate {
        let mut update = RippleUpdate::default();

        if let Some(event) = self.current {
            if event.elapsed(now) > params.duration {
                self.current = None;
                update.finished = true;
            }
        }

        let flip = |id: SourceId| Flip::between(self.previous.get(&id), presence.get(&id));
        let dialog = flip(SourceId::Dialog);
        let tile = flip(SourceId::Tile);
        let secondary = flip(SourceId::SecondaryDialog);

        if let Some((source, origin, is_opening)) = select_transition(dialog, tile, secondary) {
            if self.current.is_some() || !self.enabled {
                update.dropped = true;
            } else {
                self.current = Some(RippleEvent {
                    origin,
                    start_time: now,
                    is_opening,
                    active: true,
                });
                update.started = Some((source, is_opening));
            }
        }

        self.previous = presence.clone();
        update
    }

    /// Displacement at `p` from the travelling ripple, if any
    pub fn contribution(&self, p: Vec2, now: f64, params: &RippleParams) -> f32 {
        self.current
            .as_ref()
            .map_or(0.0, |event| event.contribution(p, now, params))
    }
}

/// First matching rule wins:
/// 1. tile vanished and dialog appeared: morph from the old tile
/// 2. dialog vanished and tile appeared: morph back from the old dialog
/// 3. dialog flipped
/// 4. tile flipped
/// 5. secondary dialog flipped
fn select_transition(dialog: Flip, tile: Flip, secondary: Flip) -> Option<(SourceId, Rect, bool)> {
    match (dialog, tile) {
        (Flip::Appeared(_), Flip::Vanished(old_tile)) => {
            return Some((SourceId::Dialog, old_tile, true));
        }
        (Flip::Vanished(old_dialog), Flip::Appeared(_)) => {
            return Some((SourceId::Tile, old_dialog, true));
        }
        _ => {}
    }

    [
        (SourceId::Dialog, dialog),
        (SourceId::Tile, tile),
        (SourceId::SecondaryDialog, secondary),
    ]
    .into_iter()
    .find_map(|(id, flip)| flip.launch().map(|(rect, opening)| (id, rect, opening)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(entries: &[(SourceId, Rect)]) -> BTreeMap<SourceId, Rect> {
        entries.iter().copied().collect()
    }

    fn tile_rect() -> Rect {
        Rect::new(1.0, 1.0, 0.1).with_center(Vec2::new(-2.0, 1.0))
    }

    fn dialog_rect() -> Rect {
        Rect::new(4.0, 3.0, 0.3)
    }

    #[test]
    fn test_tile_to_dialog_morph() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        // Focusing the tile ripples on its own; let that one finish first
        scheduler.update(&present(&[(SourceId::Tile, tile_rect())]), 0.0, &params);
        scheduler.update(&present(&[(SourceId::Tile, tile_rect())]), 2.5, &params);
        assert_eq!(scheduler.phase(), RipplePhase::Idle);

        let update = scheduler.update(&present(&[(SourceId::Dialog, dialog_rect())]), 2.6, &params);
        assert_eq!(update.started, Some((SourceId::Dialog, true)));
        let event = scheduler.active().unwrap();
        assert_eq!(event.origin, tile_rect());
        assert!(event.is_opening);
        assert_eq!(event.start_time, 2.6);
    }

    #[test]
    fn test_dialog_to_tile_morph() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        scheduler.update(&present(&[(SourceId::Dialog, dialog_rect())]), 0.0, &params);
        // The dialog's own appearance launched a ripple; let it expire
        scheduler.update(&present(&[(SourceId::Dialog, dialog_rect())]), 2.5, &params);
        assert!(!scheduler.is_active());

        let update = scheduler.update(&present(&[(SourceId::Tile, tile_rect())]), 2.6, &params);
        assert_eq!(update.started, Some((SourceId::Tile, true)));
        assert_eq!(scheduler.active().unwrap().origin, dialog_rect());
    }

    #[test]
    fn test_single_flip_uses_new_or_previous_rect() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();

        scheduler.update(&present(&[(SourceId::SecondaryDialog, dialog_rect())]), 0.0, &params);
        let opened = *scheduler.active().unwrap();
        assert!(opened.is_opening);
        assert_eq!(opened.origin, dialog_rect());

        scheduler.update(&present(&[(SourceId::SecondaryDialog, dialog_rect())]), 3.0, &params);
        let update = scheduler.update(&present(&[]), 3.1, &params);
        assert_eq!(update.started, Some((SourceId::SecondaryDialog, false)));
        let closed = scheduler.active().unwrap();
        assert!(!closed.is_opening);
        assert_eq!(closed.origin, dialog_rect());
    }

    #[test]
    fn test_dialog_outranks_tile_and_secondary() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        let update = scheduler.update(
            &present(&[
                (SourceId::Dialog, dialog_rect()),
                (SourceId::Tile, tile_rect()),
                (SourceId::SecondaryDialog, dialog_rect()),
            ]),
            0.0,
            &params,
        );
        assert_eq!(update.started, Some((SourceId::Dialog, true)));
    }

    #[test]
    fn test_segmented_control_never_ripples() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        let update = scheduler.update(
            &present(&[(SourceId::SegmentedControl, dialog_rect())]),
            0.0,
            &params,
        );
        assert_eq!(update.started, None);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_transitions_dropped_while_active() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        scheduler.update(&present(&[(SourceId::Dialog, dialog_rect())]), 0.0, &params);
        let first = *scheduler.active().unwrap();

        let update = scheduler.update(&present(&[]), 0.5, &params);
        assert!(update.dropped);
        assert_eq!(update.started, None);
        assert_eq!(*scheduler.active().unwrap(), first);

        // Not queued: once the first expires nothing replaces it
        let update = scheduler.update(&present(&[]), 2.6, &params);
        assert!(update.finished);
        assert_eq!(update.started, None);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn test_expires_after_duration() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        scheduler.update(&present(&[(SourceId::Tile, tile_rect())]), 1.0, &params);
        let at_end = scheduler.update(&present(&[(SourceId::Tile, tile_rect())]), 3.0, &params);
        assert!(!at_end.finished);
        assert!(scheduler.is_active());
        let after = scheduler.update(&present(&[(SourceId::Tile, tile_rect())]), 3.01, &params);
        assert!(after.finished);
        assert_eq!(scheduler.phase(), RipplePhase::Idle);
    }

    #[test]
    fn test_disabled_scheduler_tracks_but_never_launches() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        scheduler.enabled = false;
        let update = scheduler.update(&present(&[(SourceId::Dialog, dialog_rect())]), 0.0, &params);
        assert!(update.dropped);
        assert!(!scheduler.is_active());

        // Re-enabling doesn't replay the stale transition
        scheduler.enabled = true;
        let update = scheduler.update(&present(&[(SourceId::Dialog, dialog_rect())]), 0.1, &params);
        assert_eq!(update.started, None);
    }

    #[test]
    fn test_contribution_on_boundary_at_start() {
        let params = RippleParams::default();
        let event = RippleEvent {
            origin: dialog_rect(),
            start_time: 0.0,
            is_opening: true,
            active: true,
        };
        // Right edge of a 4-wide dialog
        let edge = Vec2::new(2.0, 0.0);
        let value = event.contribution(edge, 0.0, &params);
        assert!((value + params.amplitude).abs() < 1e-5);

        let closing = RippleEvent {
            is_opening: false,
            ..event
        };
        assert!(closing.contribution(edge, 0.0, &params) > 0.0);
    }

    #[test]
    fn test_wavefront_travels_outward() {
        let params = RippleParams::default();
        let event = RippleEvent {
            origin: dialog_rect(),
            start_time: 0.0,
            is_opening: false,
            active: true,
        };
        // After 0.4 s the front sits 2 units outside the right edge
        let front = Vec2::new(4.0, 0.0);
        assert!(event.contribution(front, 0.4, &params) > 0.0);
        assert_eq!(event.contribution(Vec2::new(2.0, 0.0), 0.4, &params), 0.0);
    }

    #[test]
    fn test_decay_reaches_zero_at_duration() {
        let params = RippleParams::default();
        let event = RippleEvent {
            origin: dialog_rect(),
            start_time: 1.0,
            is_opening: true,
            active: true,
        };
        assert_eq!(event.decay(1.0, &params), 1.0);
        assert_eq!(event.decay(3.0, &params), 0.0);
        assert_eq!(event.decay(10.0, &params), 0.0);
        let front = Vec2::new(2.0 + params.speed * params.duration, 0.0);
        assert_eq!(event.contribution(front, 3.0, &params), 0.0);
    }

    #[test]
    fn test_clear_with_keeps_present_rects_quiet() {
        let params = RippleParams::default();
        let mut scheduler = RippleScheduler::new();
        let on_screen = present(&[(SourceId::Dialog, dialog_rect())]);
        scheduler.update(&on_screen, 0.0, &params);
        assert!(scheduler.is_active());

        scheduler.clear_with(on_screen.clone());
        assert_eq!(scheduler.phase(), RipplePhase::Idle);

        let update = scheduler.update(&on_screen, 0.1, &params);
        assert_eq!(update, RippleUpdate::default());

        // A genuine change after the reset still ripples
        let update = scheduler.update(&BTreeMap::new(), 0.2, &params);
        assert_eq!(update.started, Some((SourceId::Dialog, false)));
    }
}
