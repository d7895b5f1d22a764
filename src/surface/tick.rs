//! Per-frame surface tick
//!
//! Order within a frame is fixed: advance the clock, detect presence
//! transitions against last frame's snapshot, integrate springs, then
//! evaluate the displacement field.

use super::displace::{DisplaceOutcome, displace};
use super::state::{SurfaceEvent, SurfaceState};
use crate::consts::MAX_FRAME_DT;
use crate::geometry::Mesh;

/// Advance the surface by one frame of `dt` seconds
pub fn tick(state: &mut SurfaceState, mesh: &mut Mesh, dt: f32) -> DisplaceOutcome {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };
    state.time += dt as f64;
    state.frame += 1;

    let presence = state.presence();
    let update = state
        .ripples
        .update(&presence, state.time, &state.ripple_params);

    if update.finished {
        log::debug!("Ripple finished at t={:.2}s", state.time);
        state.events.push(SurfaceEvent::RippleFinished);
    }
    if update.dropped {
        log::debug!("Presence transition dropped (ripple in flight or disabled)");
    }
    if let Some((source, opening)) = update.started {
        log::info!(
            "Ripple started by {} ({})",
            source.as_str(),
            if opening { "opening" } else { "closing" }
        );
        state
            .events
            .push(SurfaceEvent::RippleStarted { source, opening });
    }

    for source in state.sources.values_mut() {
        source.step(dt);
    }
    state.pointer.step(dt);

    displace(state, mesh)
}
