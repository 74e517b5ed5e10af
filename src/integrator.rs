//! Fixed-step integration.
//!
//! One call to [`Integrator::step`] advances every star by exactly one fixed
//! step. Per star, in this order:
//!
//! 1. add the pointer force to the accumulated acceleration
//! 2. `v += a`
//! 3. decay `a` by the friction factor, snapping tiny values to zero
//! 4. relax `vx` toward 0 and `vy` toward the natural speed, snapping when close
//! 5. `p += v`
//! 6. wrap positions that left `[-buffer, dimension + buffer]`
//!
//! The order is part of the contract: results are reproducible step for step.
//!
//! Wrapping is continuous. Only the crossing axis teleports to the opposite
//! edge; the other axis, velocity and acceleration are untouched. Every star
//! that wrapped is reported back so the previous-position snapshot can be
//! synced and interpolation does not draw a streak across the surface.

use glam::Vec2;

use crate::config::StarfieldConfig;
use crate::force::ForceField;
use crate::pointer::ForceMode;
use crate::store::ParticleStore;
use crate::viewport::Viewport;

/// Damping constants for one fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    /// Multiplier applied to acceleration every step.
    pub acceleration_friction: f32,
    /// Accelerations smaller than this snap to zero.
    pub acceleration_epsilon: f32,
    /// Fraction of the velocity error kept every step.
    pub velocity_relaxation: f32,
    /// Velocities this close to their target snap onto it.
    pub velocity_epsilon: f32,
    /// How far past an edge a star may travel before wrapping.
    pub edge_buffer: f32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::from_config(&StarfieldConfig::default())
    }
}

impl Integrator {
    pub fn from_config(config: &StarfieldConfig) -> Self {
        Self {
            acceleration_friction: config.acceleration_friction,
            acceleration_epsilon: config.acceleration_epsilon,
            velocity_relaxation: config.velocity_relaxation,
            velocity_epsilon: config.velocity_epsilon,
            edge_buffer: config.edge_buffer,
        }
    }

    /// Advance every star by one fixed step.
    ///
    /// `mode` is evaluated once by the caller for the whole step. Indices of
    /// stars that wrapped are appended to `wrapped`.
    pub fn step(
        &self,
        store: &mut ParticleStore,
        field: &ForceField,
        target: Vec2,
        mode: ForceMode,
        viewport: Viewport,
        wrapped: &mut Vec<usize>,
    ) {
        let direction = mode.direction();
        let friction = self.acceleration_friction;
        let accel_eps = self.acceleration_epsilon;
        let relax = self.velocity_relaxation;
        let vel_eps = self.velocity_epsilon;
        let buf = self.edge_buffer;
        let max_x = viewport.width + buf;
        let max_y = viewport.height + buf;

        for i in 0..store.len() {
            let mut x = store.xs[i];
            let mut y = store.ys[i];
            let mut vx = store.vxs[i];
            let mut vy = store.vys[i];
            let mut ax = store.axs[i];
            let mut ay = store.ays[i];
            let speed = store.natural_speed_of(i);

            if direction != 0.0 {
                let delta = field.acceleration(Vec2::new(x, y), target, direction);
                ax += delta.x;
                ay += delta.y;
            }

            vx += ax;
            vy += ay;

            ax *= friction;
            ay *= friction;
            if ax.abs() < accel_eps {
                ax = 0.0;
            }
            if ay.abs() < accel_eps {
                ay = 0.0;
            }

            vx *= relax;
            vy = speed + (vy - speed) * relax;
            if vx.abs() < vel_eps {
                vx = 0.0;
            }
            if (vy - speed).abs() < vel_eps {
                vy = speed;
            }

            x += vx;
            y += vy;

            let mut did_wrap = false;
            if y < -buf {
                y = max_y;
                did_wrap = true;
            } else if y > max_y {
                y = -buf;
                did_wrap = true;
            }
            if x < -buf {
                x = max_x;
                did_wrap = true;
            } else if x > max_x {
                x = -buf;
                did_wrap = true;
            }
            if did_wrap {
                wrapped.push(i);
            }

            store.xs[i] = x;
            store.ys[i] = y;
            store.vxs[i] = vx;
            store.vys[i] = vy;
            store.axs[i] = ax;
            store.ays[i] = ay;
        }
    }
}
