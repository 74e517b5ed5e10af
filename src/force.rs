//! Pointer force field.
//!
//! A single point source pulls or pushes every star. Strength falls off with
//! distance as
//!
//! ```text
//! fall = 1 / (dist * (dist * 0.00025 + 0.05) + 1)
//! ```
//!
//! which is 1 at the pointer and tends to 0 far away, so the near field stays
//! bounded and distant stars barely notice.

use glam::Vec2;

use crate::pointer::ForceMode;

/// Quadratic falloff coefficient.
pub const FALLOFF_QUADRATIC: f32 = 0.00025;

/// Linear falloff coefficient.
pub const FALLOFF_LINEAR: f32 = 0.05;

/// Distance falloff in `(0, 1]`, non-increasing in `dist`.
#[inline]
pub fn falloff(dist: f32) -> f32 {
    1.0 / (dist * (dist * FALLOFF_QUADRATIC + FALLOFF_LINEAR) + 1.0)
}

/// Acceleration contribution of the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceField {
    base_force: f32,
}

impl ForceField {
    pub fn new(base_force: f32) -> Self {
        Self { base_force }
    }

    #[inline]
    pub fn base_force(&self) -> f32 {
        self.base_force
    }

    /// Acceleration delta for a star at `particle` with the pointer at
    /// `target`, scaled by `direction` (+1 attract, -1 repel, 0 idle).
    ///
    /// Returns zero when the star sits exactly on the pointer.
    #[inline]
    pub fn acceleration(&self, particle: Vec2, target: Vec2, direction: f32) -> Vec2 {
        let delta = target - particle;
        let dist_sq = delta.length_squared();
        if dist_sq <= 0.0 || direction == 0.0 {
            return Vec2::ZERO;
        }

        let inv_dist = dist_sq.sqrt().recip();
        let dist = dist_sq * inv_dist;
        let unit = delta * inv_dist;
        let force = self.base_force * falloff(dist);

        unit * (force * direction)
    }

    /// Same as [`ForceField::acceleration`], taking the mode directly.
    pub fn acceleration_for(&self, particle: Vec2, target: Vec2, mode: ForceMode) -> Vec2 {
        self.acceleration(particle, target, mode.direction())
    }
}

impl Default for ForceField {
    fn default() -> Self {
        Self::new(0.05)
    }
}
