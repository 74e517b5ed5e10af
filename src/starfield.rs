//! The owned simulation state.
//!
//! [`Starfield`] ties the pieces together: it owns the particle store, the
//! pointer mailbox, the scheduler and its snapshot, and the renderer. Input
//! handlers call the `pointer_*` methods; the display callback calls
//! [`Starfield::frame`]. There are no globals and no shared ownership, so one
//! process can run any number of independent starfields.
//!
//! ```
//! use starfield::prelude::*;
//!
//! let config = StarfieldConfig::default().with_seed(1);
//! let mut field = Starfield::new(config, Palette::default(), Viewport::new(800.0, 600.0), 0.0)?;
//! assert_eq!(field.store().count(), 240);
//!
//! let mut surface = RecordingSurface::new();
//! field.pointer_moved(120.0, 80.0, 5.0);
//! let frame = field.frame(20.0, &mut surface);
//! assert_eq!(frame.steps, 1);
//! # Ok::<(), starfield::ConfigError>(())
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::StarfieldConfig;
use crate::error::{ConfigError, SimulationError};
use crate::force::ForceField;
use crate::integrator::Integrator;
use crate::palette::Palette;
use crate::pointer::{ForceMode, PointerState};
use crate::render::{DrawStats, Renderer, Surface};
use crate::scheduler::{FrameStep, Scheduler};
use crate::store::ParticleStore;
use crate::viewport::Viewport;

/// A running starfield.
pub struct Starfield {
    config: StarfieldConfig,
    palette: Palette,
    viewport: Viewport,
    store: ParticleStore,
    pointer: PointerState,
    scheduler: Scheduler,
    integrator: Integrator,
    field: ForceField,
    renderer: Renderer,
    rng: StdRng,
    generation: u64,
}

impl Starfield {
    /// Validate `config` and populate the first generation for `viewport`.
    ///
    /// `now` is the timestamp (ms) the first frame is measured from.
    pub fn new(
        config: StarfieldConfig,
        palette: Palette,
        viewport: Viewport,
        now: f64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut starfield = Self {
            pointer: PointerState::new(
                viewport,
                config.inactivity_window_ms,
                config.pulse_duration_ms,
            ),
            scheduler: Scheduler::from_config(&config, now),
            integrator: Integrator::from_config(&config),
            field: ForceField::new(config.base_force),
            renderer: Renderer::new(),
            store: ParticleStore::new(),
            rng,
            generation: 0,
            config,
            palette,
            viewport,
        };
        starfield.regenerate();
        Ok(starfield)
    }

    /// Open a window and run until it is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        crate::window::run(self)
    }

    /// Throw away every star and populate a new generation for the current
    /// viewport.
    pub fn regenerate(&mut self) {
        self.store.regenerate(
            self.viewport,
            self.config.density,
            &self.palette,
            &mut self.rng,
        );
        self.scheduler.reset_snapshot(&self.store);
        self.generation += 1;

        log::info!(
            "Generated {} stars for {}x{} viewport",
            self.store.count(),
            self.viewport.width,
            self.viewport.height
        );
    }

    /// Adopt a new viewport. Any change in size regenerates the field.
    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        log::debug!(
            "Viewport {}x{} -> {}x{}",
            self.viewport.width,
            self.viewport.height,
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
        self.regenerate();
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32, now: f64) {
        self.pointer.moved(x, y, now);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.left(self.viewport);
    }

    pub fn pointer_pressed(&mut self, now: f64) {
        self.pointer.pressed(now);
        log::debug!("Pulse armed until {:.1}ms", self.pointer.pulse_end());
    }

    /// Measure the next frame from `now`, discarding time that passed while
    /// no frames were drawn.
    pub fn restart_clock(&mut self, now: f64) {
        self.scheduler.restart(now);
    }

    /// Run the fixed steps owed at `now` without drawing.
    pub fn update(&mut self, now: f64) -> FrameStep {
        let Self {
            scheduler,
            store,
            pointer,
            integrator,
            field,
            viewport,
            ..
        } = self;
        let viewport = *viewport;

        scheduler.advance(now, store, |store, wrapped| {
            let mode = pointer.mode(now);
            integrator.step(store, field, pointer.position(), mode, viewport, wrapped);
        })
    }

    /// Draw the current state, interpolated by `alpha`.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S, alpha: f32) -> DrawStats {
        self.renderer.draw(
            surface,
            &self.store,
            self.scheduler.snapshot(),
            &self.palette,
            self.viewport,
            alpha,
        )
    }

    /// One display callback: catch up on fixed steps, then draw.
    pub fn frame<S: Surface + ?Sized>(&mut self, now: f64, surface: &mut S) -> FrameStep {
        let step = self.update(now);
        self.render(surface, step.alpha);
        step
    }

    /// Force mode a step taken at `now` would use.
    ///
    /// Reading the mode past the pulse deadline clears the pulse, exactly as a
    /// fixed step does.
    pub fn poll_force_mode(&mut self, now: f64) -> ForceMode {
        self.pointer.mode(now)
    }

    pub fn config(&self) -> &StarfieldConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Counters from the last draw.
    pub fn draw_stats(&self) -> DrawStats {
        self.renderer.last_stats()
    }

    /// Number of generations populated so far, the first included.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;

    fn starfield() -> Starfield {
        let config = StarfieldConfig::default().with_seed(3);
        Starfield::new(config, Palette::default(), Viewport::new(800.0, 600.0), 0.0).unwrap()
    }

    #[test]
    fn test_new_populates_first_generation() {
        let field = starfield();
        assert_eq!(field.store().count(), 240);
        assert_eq!(field.generation(), 1);
        assert!(field.scheduler().snapshot().matches(field.store()));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = StarfieldConfig::default().with_density(-1.0);
        let result = Starfield::new(config, Palette::default(), Viewport::new(10.0, 10.0), 0.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_resize_regenerates_only_on_change() {
        let mut field = starfield();
        field.resize(Viewport::new(800.0, 600.0));
        assert_eq!(field.generation(), 1);

        field.resize(Viewport::new(400.0, 300.0));
        assert_eq!(field.generation(), 2);
        assert_eq!(field.store().count(), 60);
        assert!(field.scheduler().snapshot().matches(field.store()));

        field.resize(Viewport::new(0.0, 300.0));
        assert!(field.store().is_empty());
    }

    #[test]
    fn test_same_seed_same_generation() {
        let a = starfield();
        let b = starfield();
        assert_eq!(a.store().xs(), b.store().xs());
        assert_eq!(a.store().color_indices(), b.store().color_indices());
    }

    #[test]
    fn test_frame_steps_and_draws() {
        let mut field = starfield();
        let mut surface = RecordingSurface::new();

        let frame = field.frame(40.0, &mut surface);
        assert_eq!(frame.steps, 2);
        assert_eq!(field.draw_stats().rects, 240);
        assert_eq!(surface.rects().count(), 240);
    }

    #[test]
    fn test_pointer_routing() {
        let mut field = starfield();
        assert_eq!(field.poll_force_mode(0.0), ForceMode::Idle);

        field.pointer_moved(10.0, 10.0, 100.0);
        assert_eq!(field.poll_force_mode(150.0), ForceMode::Attract);

        field.pointer_pressed(160.0);
        assert_eq!(field.poll_force_mode(170.0), ForceMode::Repel);

        field.pointer_left();
        assert_eq!(field.pointer().position(), field.viewport().center());
        assert_eq!(field.poll_force_mode(500.0), ForceMode::Idle);
    }

    #[test]
    fn test_polling_past_deadline_clears_pulse() {
        let mut field = starfield();
        field.pointer_pressed(100.0);
        assert_eq!(field.poll_force_mode(200.0), ForceMode::Repel);
        assert!(field.pointer().is_pulse_active());

        assert_eq!(field.poll_force_mode(400.0), ForceMode::Idle);
        assert!(!field.pointer().is_pulse_active());
    }

    #[test]
    fn test_restart_clock_discards_gap() {
        let mut field = starfield();
        field.restart_clock(10_000.0);
        let frame = field.update(10_010.0);
        assert_eq!(frame.steps, 0);
    }
}
