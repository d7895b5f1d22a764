//! Signed distance evaluators
//!
//! Pure math shared by every bump and ripple source. Distances are negative
//! inside a shape, zero on its boundary.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, PI};

/// Signed distance to a rounded box centred on the origin
#[inline]
pub fn sd_rounded_box(p: Vec2, half_extents: Vec2, corner_radius: f32) -> f32 {
    let q = p.abs() - half_extents + Vec2::splat(corner_radius);
    q.max_element().min(0.0) + q.max(Vec2::ZERO).length() - corner_radius
}

/// Smooth edge falloff: 1 inside, 0 beyond `edge_softness`, smoothstep between
///
/// A non-positive softness degrades to a hard step at the boundary.
#[inline]
pub fn falloff(distance: f32, edge_softness: f32) -> f32 {
    if edge_softness <= 0.0 {
        return if distance <= 0.0 { 1.0 } else { 0.0 };
    }
    let t = (distance / edge_softness).clamp(0.0, 1.0);
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// Cosine ease from 1 at the centre to 0 at `radius`
#[inline]
pub fn radial_ease(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return if distance <= 0.0 { 1.0 } else { 0.0 };
    }
    let t = (distance / radius).max(0.0);
    0.5 * (1.0 + (PI * t).cos())
}

/// Cross-section of a travelling band of `width` at offset `d` from its centre
#[inline]
pub fn band_profile(d: f32, width: f32) -> f32 {
    let half = width * 0.5;
    if half <= 0.0 || d >= half {
        return 0.0;
    }
    (d / half * FRAC_PI_2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rounded_box_regions() {
        let half = Vec2::new(2.0, 1.0);
        assert!((sd_rounded_box(Vec2::ZERO, half, 0.0) + 1.0).abs() < 1e-6);
        assert!(sd_rounded_box(Vec2::new(2.0, 0.0), half, 0.0).abs() < 1e-6);
        assert!((sd_rounded_box(Vec2::new(3.0, 0.0), half, 0.0) - 1.0).abs() < 1e-6);
        // Corner distance is Euclidean
        let d = sd_rounded_box(Vec2::new(3.0, 2.0), half, 0.0);
        assert!((d - 2.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_rounded_box_corner_radius() {
        let half = Vec2::new(1.0, 1.0);
        // The sharp corner lies outside once it is rounded
        assert!(sd_rounded_box(Vec2::new(1.0, 1.0), half, 0.5) > 0.0);
        // Edge midpoints are unaffected
        assert!(sd_rounded_box(Vec2::new(1.0, 0.0), half, 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_falloff_endpoints() {
        assert_eq!(falloff(0.0, 1.5), 1.0);
        assert_eq!(falloff(-3.0, 1.5), 1.0);
        assert_eq!(falloff(1.5, 1.5), 0.0);
        assert_eq!(falloff(9.0, 1.5), 0.0);
        assert!((falloff(0.75, 1.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_falloff_hard_step() {
        assert_eq!(falloff(0.0, 0.0), 1.0);
        assert_eq!(falloff(0.01, 0.0), 0.0);
        assert_eq!(falloff(-0.5, -1.0), 1.0);
        assert_eq!(falloff(0.5, -1.0), 0.0);
    }

    #[test]
    fn test_radial_ease() {
        assert_eq!(radial_ease(0.0, 2.0), 1.0);
        assert!((radial_ease(1.0, 2.0) - 0.5).abs() < 1e-6);
        assert_eq!(radial_ease(2.0, 2.0), 0.0);
        assert_eq!(radial_ease(5.0, 2.0), 0.0);
        assert_eq!(radial_ease(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_band_profile() {
        assert_eq!(band_profile(0.0, 1.5), 1.0);
        assert!((band_profile(0.375, 1.5) - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(band_profile(0.75, 1.5), 0.0);
        assert_eq!(band_profile(0.1, 0.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_center_is_inside(
            w in 0.01f32..50.0,
            h in 0.01f32..50.0,
            r_frac in 0.0f32..=1.0,
        ) {
            let r = r_frac * w.min(h) * 0.5;
            let d = sd_rounded_box(Vec2::ZERO, Vec2::new(w * 0.5, h * 0.5), r);
            prop_assert!(d < 0.0);
        }

        #[test]
        fn prop_falloff_monotonic(
            s in 0.01f32..10.0,
            a in -20.0f32..20.0,
            step in 0.0f32..5.0,
        ) {
            let near = falloff(a, s);
            let far = falloff(a + step, s);
            prop_assert!(far <= near + 1e-6);
            prop_assert!((0.0..=1.0).contains(&near));
        }

        #[test]
        fn prop_falloff_boundaries(s in 0.001f32..100.0) {
            prop_assert_eq!(falloff(0.0, s), 1.0);
            prop_assert_eq!(falloff(s, s), 0.0);
        }

        #[test]
        fn prop_radial_ease_in_range(d in 0.0f32..10.0, r in 0.01f32..10.0) {
            let e = radial_ease(d, r);
            prop_assert!((0.0..=1.0).contains(&e));
        }
    }
}
