//! Surface engine
//!
//! The single owner of the mesh, the source table and the ripple scheduler.
//! Hosts call into it from the frame loop and from same-thread input
//! callbacks; nothing here blocks or locks.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::consts::WORLD_HEIGHT;
use crate::geometry::{GeometryError, Mesh};
use crate::settings::{Settings, SettingsError};
use crate::surface::{DisplaceOutcome, Rect, SourceId, SurfaceEvent, SurfaceState, tick};
use crate::viewport::{MeasurementChannel, PixelRect, Viewport};

type ClickCallback = Box<dyn FnMut(Vec2)>;

pub struct Engine {
    settings: Settings,
    state: SurfaceState,
    mesh: Mesh,
    viewport: Viewport,
    /// Last pixel measurement per source, re-mapped when the screen changes
    pixel_rects: BTreeMap<SourceId, PixelRect>,
    running: bool,
    on_grid_clicked: Option<ClickCallback>,
}

impl Engine {
    /// Build an engine whose mesh covers `viewport` at the preset density
    pub fn new(settings: Settings, viewport: Viewport) -> Result<Self, GeometryError> {
        let (sx, sy) = settings
            .quality
            .segments_for(viewport.world_width, viewport.world_height);
        let mesh = Mesh::build(viewport.world_width, viewport.world_height, sx, sy)?;
        let mut state = SurfaceState::new(&settings.tuning);
        Self::apply_toggles(&settings, &mut state);

        Ok(Self {
            settings,
            state,
            mesh,
            viewport,
            pixel_rects: BTreeMap::new(),
            running: true,
            on_grid_clicked: None,
        })
    }

    /// Convenience constructor for a screen of the given pixel size
    pub fn for_screen(
        settings: Settings,
        screen_width: f32,
        screen_height: f32,
    ) -> Result<Self, GeometryError> {
        Self::new(
            settings,
            Viewport::fit_height(screen_width, screen_height, WORLD_HEIGHT),
        )
    }

    fn apply_toggles(settings: &Settings, state: &mut SurfaceState) {
        state.ripples.enabled = settings.effective_ripples();
        state.pointer_enabled = settings.pointer_bump;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Mutable mesh access for the renderer (dirty-flag bookkeeping)
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Resume ticking from rest
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            log::info!("Surface started");
        }
    }

    /// Stop ticking and discard all animation state
    ///
    /// Springs, pointer gesture and any travelling ripple are dropped, and
    /// the mesh returns to its base positions. Rects are host-owned and
    /// survive; on `start` the bumps of regions still on screen ramp back in
    /// from rest without rippling.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.state.reset_motion(&self.settings.tuning);
        self.mesh.reset_to_base();
        self.mesh.recompute_normals();
        log::info!("Surface stopped");
    }

    /// Swap settings at runtime; rebuilds the mesh only if density changed
    pub fn apply_settings(&mut self, settings: Settings) {
        let density_changed = settings.quality != self.settings.quality;
        self.state.retune(&settings.tuning);
        Self::apply_toggles(&settings, &mut self.state);
        self.settings = settings;
        if density_changed {
            let (sx, sy) = self
                .settings
                .quality
                .segments_for(self.viewport.world_width, self.viewport.world_height);
            self.resize(self.viewport.world_width, self.viewport.world_height, sx, sy);
        }
    }

    /// Parse settings JSON and apply it; the current settings stay on error
    pub fn apply_settings_json(&mut self, json: &str) -> Result<(), SettingsError> {
        let settings = Settings::from_json(json)?;
        self.apply_settings(settings);
        Ok(())
    }

    /// Register the callback fired when a press/release pair is a click
    pub fn set_on_grid_clicked<F>(&mut self, callback: F)
    where
        F: FnMut(Vec2) + 'static,
    {
        self.on_grid_clicked = Some(Box::new(callback));
    }

    /// Update a source's rect in world units (None = region gone)
    ///
    /// Replaces any pixel measurement for `id`, so later screen resizes
    /// leave this rect alone.
    pub fn set_rect(&mut self, id: SourceId, rect: Option<Rect>) {
        self.pixel_rects.remove(&id);
        self.state.set_rect(id, rect);
    }

    /// Update a source from a pixel measurement
    pub fn set_pixel_rect(&mut self, id: SourceId, rect: Option<PixelRect>) {
        let world = rect.and_then(|px| self.viewport.rect_to_world(&px));
        if rect.is_some() && world.is_none() {
            log::warn!("Dropping {} measurement: viewport not ready", id.as_str());
            return;
        }
        match rect {
            Some(px) => self.pixel_rects.insert(id, px),
            None => self.pixel_rects.remove(&id),
        };
        self.state.set_rect(id, world);
    }

    /// Map every remembered pixel measurement through the current viewport
    fn remap_pixel_rects(&mut self) {
        for (id, px) in &self.pixel_rects {
            if let Some(world) = self.viewport.rect_to_world(px) {
                self.state.set_rect(*id, Some(world));
            }
        }
    }

    /// Apply everything the measurement channel has delivered since last frame
    pub fn pump<C: MeasurementChannel>(&mut self, channel: &mut C) {
        for m in channel.drain() {
            self.set_pixel_rect(m.source, m.rect);
        }
    }

    pub fn pointer_down(&mut self, world: Vec2) {
        self.state.pointer.press(world);
    }

    pub fn pointer_move(&mut self, world: Vec2) {
        let threshold = self.state.pointer_params.drag_threshold;
        self.state.pointer.drag(world, threshold);
    }

    /// End the gesture; fires the grid-clicked callback if it was a click
    pub fn pointer_up(&mut self) {
        if let Some(position) = self.state.pointer.release() {
            log::debug!("Grid clicked at ({:.2}, {:.2})", position.x, position.y);
            self.state.events.push(SurfaceEvent::GridClicked { position });
            if let Some(callback) = self.on_grid_clicked.as_mut() {
                callback(position);
            }
        }
    }

    pub fn pointer_cancel(&mut self) {
        self.state.pointer.cancel();
    }

    /// Rebuild the mesh for new world extents
    ///
    /// Invalid dimensions keep the previous mesh. Returns true if rebuilt.
    pub fn resize(
        &mut self,
        world_width: f32,
        world_height: f32,
        segments_x: u32,
        segments_y: u32,
    ) -> bool {
        let current = self.mesh.layout();
        if current.width == world_width
            && current.height == world_height
            && current.segments_x == segments_x
            && current.segments_y == segments_y
        {
            return false;
        }
        match Mesh::build(world_width, world_height, segments_x, segments_y) {
            Ok(mesh) => {
                self.mesh = mesh;
                self.viewport.world_width = world_width;
                self.viewport.world_height = world_height;
                true
            }
            Err(e) => {
                log::warn!("Resize rejected, keeping previous mesh: {}", e);
                false
            }
        }
    }

    /// Follow a new screen size, keeping the fixed world height
    pub fn resize_screen(&mut self, screen_width: f32, screen_height: f32) -> bool {
        let viewport = Viewport::fit_height(screen_width, screen_height, WORLD_HEIGHT);
        if !viewport.is_valid() {
            log::warn!(
                "Ignoring screen resize to {}x{}",
                screen_width,
                screen_height
            );
            return false;
        }
        self.viewport.screen_width = screen_width;
        self.viewport.screen_height = screen_height;
        let (sx, sy) = self
            .settings
            .quality
            .segments_for(viewport.world_width, viewport.world_height);
        let rebuilt = self.resize(viewport.world_width, viewport.world_height, sx, sy);
        self.remap_pixel_rects();
        rebuilt
    }

    /// Advance one frame
    pub fn frame(&mut self, dt: f32) -> DisplaceOutcome {
        if !self.running {
            return DisplaceOutcome::Skipped;
        }
        tick(&mut self.state, &mut self.mesh, dt)
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.state.events)
    }
}
