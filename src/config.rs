//! Starfield configuration.
//!
//! Every tunable of the simulation lives in [`StarfieldConfig`]. Start from
//! `StarfieldConfig::default()` and override with the chained `with_*`
//! methods:
//!
//! ```ignore
//! let config = StarfieldConfig::default()
//!     .with_density(0.0008)
//!     .with_pulse_duration_ms(300.0)
//!     .with_seed(7);
//! ```

use crate::error::ConfigError;
use crate::palette::Color;

/// Fixed simulation rate: 60 steps per second.
pub const DEFAULT_STEP_MS: f64 = 1000.0 / 60.0;

/// Longest frame the scheduler will catch up on: 30 frames per second.
pub const DEFAULT_MAX_FRAME_MS: f64 = 1000.0 / 30.0;

/// Tunables for generation, forces, integration and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct StarfieldConfig {
    /// Stars per square logical unit of viewport.
    pub density: f64,
    /// How long after the last pointer move attraction stays active.
    pub inactivity_window_ms: f64,
    /// Distance stars may travel past an edge before wrapping.
    pub edge_buffer: f32,
    /// How long a press keeps the repulsion pulse armed.
    pub pulse_duration_ms: f64,
    /// Length of one fixed simulation step.
    pub step_duration_ms: f64,
    /// Cap on the frame time fed to the accumulator.
    pub max_frame_time_ms: f64,
    /// Peak force magnitude at zero distance.
    pub base_force: f32,
    /// Per-step decay of accumulated acceleration.
    pub acceleration_friction: f32,
    /// Accelerations below this magnitude snap to zero.
    pub acceleration_epsilon: f32,
    /// Per-step relaxation of velocity toward the natural drift.
    pub velocity_relaxation: f32,
    /// Velocities this close to their target snap onto it.
    pub velocity_epsilon: f32,
    /// Color the surface is cleared to every frame.
    pub background: Color,
    /// RNG seed for reproducible generations. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Initial window size in logical units.
    pub window_size: (u32, u32),
    pub title: String,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            density: 0.0005,
            inactivity_window_ms: 250.0,
            edge_buffer: 20.0,
            pulse_duration_ms: 250.0,
            step_duration_ms: DEFAULT_STEP_MS,
            max_frame_time_ms: DEFAULT_MAX_FRAME_MS,
            base_force: 0.05,
            acceleration_friction: 0.995,
            acceleration_epsilon: 0.00005,
            velocity_relaxation: 0.9,
            velocity_epsilon: 0.01,
            background: Color::from_hex(0x07040d),
            seed: None,
            window_size: (1280, 720),
            title: "Starfield".to_string(),
        }
    }
}

impl StarfieldConfig {
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_inactivity_window_ms(mut self, ms: f64) -> Self {
        self.inactivity_window_ms = ms;
        self
    }

    pub fn with_edge_buffer(mut self, buffer: f32) -> Self {
        self.edge_buffer = buffer;
        self
    }

    pub fn with_pulse_duration_ms(mut self, ms: f64) -> Self {
        self.pulse_duration_ms = ms;
        self
    }

    pub fn with_step_duration_ms(mut self, ms: f64) -> Self {
        self.step_duration_ms = ms;
        self
    }

    pub fn with_max_frame_time_ms(mut self, ms: f64) -> Self {
        self.max_frame_time_ms = ms;
        self
    }

    pub fn with_base_force(mut self, force: f32) -> Self {
        self.base_force = force;
        self
    }

    /// Set acceleration friction and velocity relaxation factors together.
    pub fn with_damping(mut self, acceleration_friction: f32, velocity_relaxation: f32) -> Self {
        self.acceleration_friction = acceleration_friction;
        self.velocity_relaxation = velocity_relaxation;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Check every numeric field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("density", self.density)?;
        non_negative("inactivity_window_ms", self.inactivity_window_ms)?;
        non_negative("edge_buffer", self.edge_buffer as f64)?;
        non_negative("pulse_duration_ms", self.pulse_duration_ms)?;
        positive("step_duration_ms", self.step_duration_ms)?;
        non_negative("base_force", self.base_force as f64)?;
        non_negative("acceleration_epsilon", self.acceleration_epsilon as f64)?;
        non_negative("velocity_epsilon", self.velocity_epsilon as f64)?;
        unit_interval("acceleration_friction", self.acceleration_friction as f64)?;
        unit_interval("velocity_relaxation", self.velocity_relaxation as f64)?;

        if !self.max_frame_time_ms.is_finite() || self.max_frame_time_ms < self.step_duration_ms {
            return Err(ConfigError {
                field: "max_frame_time_ms",
                value: self.max_frame_time_ms,
                expected: "a finite value >= step_duration_ms",
            });
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            value,
            expected: "a finite value >= 0",
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            value,
            expected: "a finite value > 0",
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError {
            field,
            value,
            expected: "a value in 0..=1",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = StarfieldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.density, 0.0005);
        assert_eq!(config.inactivity_window_ms, 250.0);
        assert_eq!(config.edge_buffer, 20.0);
        assert!((config.step_duration_ms - 16.6667).abs() < 0.001);
    }

    #[test]
    fn test_builder_chain() {
        let config = StarfieldConfig::default()
            .with_density(0.001)
            .with_pulse_duration_ms(300.0)
            .with_seed(42)
            .with_title("Night sky");

        assert_eq!(config.density, 0.001);
        assert_eq!(config.pulse_duration_ms, 300.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.title, "Night sky");
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = StarfieldConfig::default()
            .with_density(f64::NAN)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "density");

        let err = StarfieldConfig::default()
            .with_step_duration_ms(0.0)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "step_duration_ms");

        let err = StarfieldConfig::default()
            .with_damping(1.5, 0.9)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "acceleration_friction");

        let err = StarfieldConfig::default()
            .with_max_frame_time_ms(5.0)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "max_frame_time_ms");
    }
}
