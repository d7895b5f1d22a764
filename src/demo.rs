//! Scripted UI sessions
//!
//! Stands in for the surrounding UI layer: a seeded generator that focuses
//! tiles, opens dialogs, toggles the segmented control and taps or drags the
//! grid. Used by the native binary and by soak tests. Same seed, same session.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::FRAME_DT;
use crate::engine::Engine;
use crate::surface::{SourceId, SurfaceEvent};
use crate::viewport::{PixelRect, QueuedChannel};

/// Tile grid columns/rows used to place focused tiles
const TILE_COLUMNS: u32 = 4;
const TILE_ROWS: u32 = 3;

/// One UI-level step of a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DemoAction {
    /// Press without moving; released by the next action
    Tap(Vec2),
    /// Press and move beyond the drag threshold
    Drag { from: Vec2, to: Vec2 },
    FocusTile(PixelRect),
    BlurTile,
    /// Focused tile morphs into the dialog in a single frame
    ExpandTile(PixelRect),
    /// Dialog closes back into a tile in a single frame
    CollapseDialog(PixelRect),
    OpenDialog(PixelRect),
    CloseDialog,
    OpenProfile(PixelRect),
    CloseProfile,
    ShowControl(PixelRect),
    HideControl,
    Wait,
}

/// Totals gathered while a session runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DemoReport {
    pub frames: u64,
    pub actions: u64,
    pub ripples: u64,
    pub clicks: u64,
    /// Most negative z offset seen on any vertex
    pub deepest: f32,
}

pub struct DemoSession {
    rng: Pcg32,
    screen: (f32, f32),
    tile: Option<PixelRect>,
    dialog_open: bool,
    profile_open: bool,
    control_visible: bool,
    holding: bool,
}

impl DemoSession {
    pub fn new(seed: u64, screen_width: f32, screen_height: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            screen: (screen_width, screen_height),
            tile: None,
            dialog_open: false,
            profile_open: false,
            control_visible: false,
            holding: false,
        }
    }

    fn random_tile(&mut self) -> PixelRect {
        let (w, h) = self.screen;
        let cell_w = w / TILE_COLUMNS as f32;
        let cell_h = h / TILE_ROWS as f32;
        let col = self.rng.random_range(0..TILE_COLUMNS) as f32;
        let row = self.rng.random_range(0..TILE_ROWS) as f32;
        PixelRect {
            width: cell_w * 0.8,
            height: cell_h * 0.8,
            top: row * cell_h + cell_h * 0.1,
            left: col * cell_w + cell_w * 0.1,
            corner_radius: 12.0,
        }
    }

    fn dialog_rect(&mut self) -> PixelRect {
        let (w, h) = self.screen;
        let scale = self.rng.random_range(0.4..0.6f32);
        let (dw, dh) = (w * scale, h * scale);
        PixelRect {
            width: dw,
            height: dh,
            top: (h - dh) * 0.5,
            left: (w - dw) * 0.5,
            corner_radius: 24.0,
        }
    }

    fn profile_rect(&self) -> PixelRect {
        let (w, h) = self.screen;
        PixelRect {
            width: w * 0.3,
            height: h * 0.7,
            top: h * 0.15,
            left: w * 0.65,
            corner_radius: 20.0,
        }
    }

    fn control_rect(&self) -> PixelRect {
        let (w, h) = self.screen;
        PixelRect {
            width: w * 0.4,
            height: h * 0.06,
            top: h * 0.9,
            left: w * 0.3,
            corner_radius: h * 0.03,
        }
    }

    fn random_point(&mut self) -> Vec2 {
        let (w, h) = self.screen;
        Vec2::new(self.rng.random_range(0.0..w), self.rng.random_range(0.0..h))
    }

    /// Pick the next action given what is currently on screen
    pub fn next_action(&mut self) -> DemoAction {
        let roll: f32 = self.rng.random();

        if self.dialog_open {
            return if roll < 0.3 {
                self.dialog_open = false;
                let tile = self.random_tile();
                self.tile = Some(tile);
                DemoAction::CollapseDialog(tile)
            } else if roll < 0.6 {
                self.dialog_open = false;
                DemoAction::CloseDialog
            } else {
                DemoAction::Wait
            };
        }

        if let Some(tile) = self.tile {
            return if roll < 0.35 {
                self.tile = None;
                self.dialog_open = true;
                DemoAction::ExpandTile(self.dialog_rect())
            } else if roll < 0.6 {
                self.tile = None;
                DemoAction::BlurTile
            } else if roll < 0.8 {
                let p = Vec2::new(tile.left + tile.width * 0.5, tile.top + tile.height * 0.5);
                DemoAction::Tap(p)
            } else {
                DemoAction::Wait
            };
        }

        if roll < 0.2 {
            let tile = self.random_tile();
            self.tile = Some(tile);
            DemoAction::FocusTile(tile)
        } else if roll < 0.3 {
            self.dialog_open = true;
            DemoAction::OpenDialog(self.dialog_rect())
        } else if roll < 0.4 {
            self.profile_open = !self.profile_open;
            if self.profile_open {
                DemoAction::OpenProfile(self.profile_rect())
            } else {
                DemoAction::CloseProfile
            }
        } else if roll < 0.5 {
            self.control_visible = !self.control_visible;
            if self.control_visible {
                DemoAction::ShowControl(self.control_rect())
            } else {
                DemoAction::HideControl
            }
        } else if roll < 0.75 {
            DemoAction::Tap(self.random_point())
        } else if roll < 0.9 {
            let from = self.random_point();
            let to = self.random_point();
            DemoAction::Drag { from, to }
        } else {
            DemoAction::Wait
        }
    }

    /// Feed an action to the engine, as the UI layer would
    pub fn apply(&mut self, action: DemoAction, engine: &mut Engine, channel: &mut QueuedChannel) {
        // Any held gesture ends before the next action
        if self.holding {
            engine.pointer_up();
            self.holding = false;
        }

        match action {
            DemoAction::Tap(p) => {
                engine.pointer_down(engine.viewport().point_to_world(p.x, p.y));
                self.holding = true;
            }
            DemoAction::Drag { from, to } => {
                let viewport = *engine.viewport();
                engine.pointer_down(viewport.point_to_world(from.x, from.y));
                engine.pointer_move(viewport.point_to_world(to.x, to.y));
                self.holding = true;
            }
            DemoAction::FocusTile(rect) => channel.push(SourceId::Tile, Some(rect)),
            DemoAction::BlurTile => channel.push(SourceId::Tile, None),
            DemoAction::ExpandTile(dialog) => {
                channel.push(SourceId::Tile, None);
                channel.push(SourceId::Dialog, Some(dialog));
            }
            DemoAction::CollapseDialog(tile) => {
                channel.push(SourceId::Dialog, None);
                channel.push(SourceId::Tile, Some(tile));
            }
            DemoAction::OpenDialog(rect) => channel.push(SourceId::Dialog, Some(rect)),
            DemoAction::CloseDialog => channel.push(SourceId::Dialog, None),
            DemoAction::OpenProfile(rect) => channel.push(SourceId::SecondaryDialog, Some(rect)),
            DemoAction::CloseProfile => channel.push(SourceId::SecondaryDialog, None),
            DemoAction::ShowControl(rect) => channel.push(SourceId::SegmentedControl, Some(rect)),
            DemoAction::HideControl => channel.push(SourceId::SegmentedControl, None),
            DemoAction::Wait => {}
        }
    }
}

/// Drive `engine` for `seconds` of frames, one action every `action_every` seconds
pub fn run_session(engine: &mut Engine, seed: u64, seconds: f32, action_every: f32) -> DemoReport {
    let viewport = *engine.viewport();
    let mut session = DemoSession::new(seed, viewport.screen_width, viewport.screen_height);
    let mut channel = QueuedChannel::new();
    let mut report = DemoReport::default();

    let frames = (seconds / FRAME_DT).ceil().max(0.0) as u64;
    let every = ((action_every / FRAME_DT).round() as u64).max(1);

    for frame in 0..frames {
        if frame % every == 0 {
            let action = session.next_action();
            session.apply(action, engine, &mut channel);
            report.actions += 1;
        }
        engine.pump(&mut channel);
        engine.frame(FRAME_DT);
        report.frames += 1;

        for event in engine.drain_events() {
            match event {
                SurfaceEvent::RippleStarted { source, opening } => {
                    log::debug!(
                        "frame {}: ripple from {} (opening: {})",
                        frame,
                        source.as_str(),
                        opening
                    );
                    report.ripples += 1;
                }
                SurfaceEvent::GridClicked { position } => {
                    log::debug!(
                        "frame {}: click at ({:.2}, {:.2})",
                        frame,
                        position.x,
                        position.y
                    );
                    report.clicks += 1;
                }
                SurfaceEvent::RippleFinished => {}
            }
        }

        let mesh = engine.mesh();
        for i in 0..mesh.vertex_count() {
            report.deepest = report.deepest.min(mesh.z_offset(i));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{QualityPreset, Settings};

    fn engine() -> Engine {
        Engine::for_screen(Settings::from_preset(QualityPreset::Low), 1280.0, 720.0).unwrap()
    }

    #[test]
    fn test_same_seed_same_actions() {
        let mut a = DemoSession::new(42, 1280.0, 720.0);
        let mut b = DemoSession::new(42, 1280.0, 720.0);
        for _ in 0..200 {
            assert_eq!(a.next_action(), b.next_action());
        }
    }

    #[test]
    fn test_dialog_only_closes_once_open() {
        let mut session = DemoSession::new(7, 1280.0, 720.0);
        let mut open = false;
        for _ in 0..500 {
            match session.next_action() {
                DemoAction::OpenDialog(_) | DemoAction::ExpandTile(_) => {
                    assert!(!open);
                    open = true;
                }
                DemoAction::CloseDialog | DemoAction::CollapseDialog(_) => {
                    assert!(open);
                    open = false;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_session_is_deterministic() {
        let mut first = engine();
        let mut second = engine();
        let a = run_session(&mut first, 1234, 20.0, 0.5);
        let b = run_session(&mut second, 1234, 20.0, 0.5);
        assert_eq!(a, b);
        assert_eq!(first.mesh().positions(), second.mesh().positions());
    }

    #[test]
    fn test_session_exercises_the_surface() {
        let mut engine = engine();
        let report = run_session(&mut engine, 99, 30.0, 0.5);
        assert_eq!(report.frames, 1800);
        assert_eq!(report.actions, 60);
        assert!(report.ripples > 0);
        assert!(report.clicks > 0);
        assert!(report.deepest < -0.3);
    }
}
