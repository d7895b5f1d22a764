//! Displacement evaluator
//!
//! Sums every active contribution into a z offset per vertex.

use glam::Vec2;

use super::state::{RectSource, SurfaceState};
use crate::geometry::Mesh;

/// What the evaluator did this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplaceOutcome {
    /// Field idle and buffer already flat; nothing touched
    Skipped,
    /// Field idle; buffer restored to base positions
    Reset,
    /// Full per-vertex pass
    Displaced,
}

/// Total displacement at one point
pub fn sample(state: &SurfaceState, p: Vec2) -> f32 {
    let sources: Vec<&RectSource> = state
        .sources
        .values()
        .filter(|s| s.is_contributing())
        .collect();
    sample_with(state, &sources, p)
}

fn sample_with(state: &SurfaceState, sources: &[&RectSource], p: Vec2) -> f32 {
    let mut dz = 0.0;
    if state.pointer_enabled {
        dz += state.pointer.contribution(p, &state.pointer_params);
    }
    for source in sources {
        dz += source.contribution(p);
    }
    dz + state.ripples.contribution(p, state.time, &state.ripple_params)
}

/// Write `z = z0 + Σ contributions` into the mesh and refresh normals
pub fn displace(state: &SurfaceState, mesh: &mut Mesh) -> DisplaceOutcome {
    if state.is_idle() {
        if mesh.is_at_base() {
            return DisplaceOutcome::Skipped;
        }
        mesh.reset_to_base();
        mesh.recompute_normals();
        return DisplaceOutcome::Reset;
    }

    let sources: Vec<&RectSource> = state
        .sources
        .values()
        .filter(|s| s.is_contributing())
        .collect();

    mesh.displace_with(|p| sample_with(state, &sources, p));
    mesh.recompute_normals();
    DisplaceOutcome::Displaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Tuning;
    use crate::surface::state::{Rect, SourceId};

    fn mesh() -> Mesh {
        Mesh::build(12.0, 12.0, 48, 48).unwrap()
    }

    #[test]
    fn test_idle_skips_then_resets() {
        let mut state = SurfaceState::new(&Tuning::default());
        let mut mesh = mesh();
        assert_eq!(displace(&state, &mut mesh), DisplaceOutcome::Skipped);

        state.pointer.press(Vec2::ZERO);
        state.pointer.strength.snap();
        assert_eq!(displace(&state, &mut mesh), DisplaceOutcome::Displaced);
        assert!(!mesh.is_at_base());

        state.pointer.release();
        state.pointer.strength.snap();
        assert_eq!(displace(&state, &mut mesh), DisplaceOutcome::Reset);
        assert!(mesh.is_at_base());
        assert_eq!(displace(&state, &mut mesh), DisplaceOutcome::Skipped);
    }

    #[test]
    fn test_single_rect_bump() {
        let tuning = Tuning::default();
        let mut state = SurfaceState::new(&tuning);
        let rect = Rect::new(3.0, 2.0, 0.2).with_center(Vec2::new(1.0, -1.0));
        let source = state.sources.get_mut(&SourceId::Dialog).unwrap();
        source.set_rect(Some(rect));
        source.footprint = Some(rect);
        source.strength.value = source.config.strength;
        let strength = source.config.strength;
        let softness = source.config.edge_softness;

        let mut mesh = mesh();
        displace(&state, &mut mesh);

        let center = mesh.nearest_vertex(rect.center);
        assert!((mesh.z_offset(center) - strength).abs() < 1e-5);

        // Right edge at x = 2.5; go past it by more than the softness
        let far = mesh.nearest_vertex(Vec2::new(2.5 + softness + 0.5, -1.0));
        assert!(mesh.z_offset(far).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_indent_at_position() {
        let mut state = SurfaceState::new(&Tuning::default());
        let p = Vec2::new(-2.0, 2.0);
        state.pointer.press(p);
        state.pointer.strength.snap();

        let mut mesh = mesh();
        displace(&state, &mut mesh);
        let at = mesh.nearest_vertex(p);
        assert!((mesh.z_offset(at) + 1.5).abs() < 1e-5);
        let away = mesh.nearest_vertex(p + Vec2::new(2.0, 0.0));
        assert!(mesh.z_offset(away).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_pointer_adds_nothing() {
        let mut state = SurfaceState::new(&Tuning::default());
        state.pointer_enabled = false;
        state.pointer.press(Vec2::ZERO);
        state.pointer.strength.snap();
        assert_eq!(sample(&state, Vec2::ZERO), 0.0);
    }

    #[test]
    fn test_contributions_sum() {
        let mut state = SurfaceState::new(&Tuning::default());
        state.pointer.press(Vec2::ZERO);
        state.pointer.strength.snap();
        let rect = Rect::new(2.0, 2.0, 0.0);
        let source = state.sources.get_mut(&SourceId::Tile).unwrap();
        source.set_rect(Some(rect));
        source.footprint = Some(rect);
        source.strength.value = -0.5;

        let total = sample(&state, Vec2::ZERO);
        assert!((total - (-1.5 - 0.5)).abs() < 1e-5);
    }

    #[test]
    fn test_static_field_is_repeatable() {
        let mut state = SurfaceState::new(&Tuning::default());
        state.pointer.press(Vec2::new(0.5, 0.5));
        state.pointer.strength.snap();

        let mut mesh = mesh();
        displace(&state, &mut mesh);
        let first = mesh.positions().to_vec();
        let first_normals = mesh.normals().to_vec();

        state.time += 1.0;
        displace(&state, &mut mesh);
        assert_eq!(mesh.positions(), first.as_slice());
        assert_eq!(mesh.normals(), first_normals.as_slice());
    }
}
