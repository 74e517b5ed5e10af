//! # Starfield
//!
//! An animated field of drifting, glowing stars that reacts to the pointer:
//! moving the cursor pulls stars toward it, a click pushes them away for a
//! short pulse, and when the pointer rests they fall back into their natural
//! vertical drift.
//!
//! ## Quick Start
//!
//! ```ignore
//! use starfield::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let config = StarfieldConfig::default()
//!         .with_density(0.0008)
//!         .with_title("Stars");
//!     Starfield::new(config, Palette::default(), Viewport::new(1280.0, 720.0), 0.0)?
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! Stars live in a structure-of-arrays [`ParticleStore`]. Each star has a
//! position, velocity and accumulated acceleration, plus write-once size,
//! natural speed and palette color. Large stars sink, small stars rise.
//!
//! ### Fixed steps
//!
//! The [`Scheduler`] runs the [`Integrator`] at a fixed rate (60 steps per
//! second by default) no matter how often frames are drawn, and hands the
//! renderer an interpolation factor so motion stays smooth between steps.
//!
//! ### Forces
//!
//! The [`ForceField`] applies one point force at the pointer. The
//! [`PointerState`] picks its direction every step: repel while a pulse is
//! armed, attract while the pointer has moved recently, idle otherwise.
//!
//! ### Drawing
//!
//! The [`Renderer`] draws through the [`Surface`] trait, one fill color per
//! palette bucket. [`QuadSurface`] is the wgpu implementation used by
//! [`Starfield::run`]; [`RecordingSurface`] captures calls headlessly.

pub mod config;
pub mod error;
pub mod force;
pub mod gpu;
pub mod integrator;
pub mod palette;
pub mod pointer;
pub mod render;
pub mod scheduler;
pub mod starfield;
pub mod store;
pub mod time;
pub mod viewport;

mod window;

pub use glam::Vec2;

pub use config::StarfieldConfig;
pub use error::{ColorParseError, ConfigError, GpuError, PaletteError, SimulationError};
pub use force::ForceField;
pub use gpu::QuadSurface;
pub use integrator::Integrator;
pub use palette::{Color, Palette};
pub use pointer::{ForceMode, PointerState};
pub use render::{DrawCommand, DrawStats, Rect, RecordingSurface, Renderer, Surface};
pub use scheduler::{FrameStep, PreviousSnapshot, Scheduler};
pub use starfield::Starfield;
pub use store::{ColorBuckets, ParticleSeed, ParticleStore};
pub use viewport::Viewport;

/// Common imports.
///
/// ```ignore
/// use starfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::StarfieldConfig;
    pub use crate::error::SimulationError;
    pub use crate::palette::{Color, Palette};
    pub use crate::pointer::ForceMode;
    pub use crate::render::{RecordingSurface, Surface};
    pub use crate::starfield::Starfield;
    pub use crate::viewport::Viewport;
    pub use crate::Vec2;
}
