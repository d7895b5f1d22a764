//! Critically damped spring for animated strengths
//!
//! Uses the closed-form solution of the critically damped oscillator, so a
//! step is exact for any dt and never overshoots from rest:
//!   x(t) = target + (c1 + c2*t) * e^(-ω*t),  c1 = x0 - target, c2 = v0 + ω*c1

use serde::{Deserialize, Serialize};

/// Position tolerance for snapping onto the target
const SETTLE_EPSILON: f32 = 1e-3;
/// Velocity tolerance for snapping onto the target
const SETTLE_VELOCITY: f32 = 1e-2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub value: f32,
    pub velocity: f32,
    pub target: f32,
    /// Angular frequency ω = sqrt(k/m)
    pub omega: f32,
}

impl Spring {
    /// A spring at rest at zero
    pub fn new(omega: f32) -> Self {
        Self {
            value: 0.0,
            velocity: 0.0,
            target: 0.0,
            omega,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to the target
    pub fn snap(&mut self) {
        self.value = self.target;
        self.velocity = 0.0;
    }

    /// Exactly at rest on the target
    pub fn is_settled(&self) -> bool {
        self.value == self.target && self.velocity == 0.0
    }

    /// Advance by `dt` seconds. Returns true once settled.
    pub fn step(&mut self, dt: f32) -> bool {
        if self.is_settled() {
            return true;
        }
        if self.omega <= 0.0 {
            self.snap();
            return true;
        }

        let w = self.omega;
        let c1 = self.value - self.target;
        let c2 = self.velocity + w * c1;
        let exp = (-w * dt).exp();

        self.value = self.target + (c1 + c2 * dt) * exp;
        self.velocity = (c2 - w * (c1 + c2 * dt)) * exp;

        let settled = (self.value - self.target).abs() < SETTLE_EPSILON
            && self.velocity.abs() < SETTLE_VELOCITY;
        if settled {
            self.snap();
        }
        settled
    }
}
