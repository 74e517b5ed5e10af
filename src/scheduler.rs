//! Fixed-timestep scheduling.
//!
//! Display callbacks arrive at whatever rate the platform delivers them. The
//! [`Scheduler`] turns that variable frame time into a whole number of fixed
//! simulation steps and carries the leftover time to the next frame:
//!
//! ```text
//! frame_time   = clamp(now - last_frame, 0, max_frame_ms)
//! accumulator += frame_time
//! while accumulator >= step_ms { snapshot; step; accumulator -= step_ms }
//! alpha        = accumulator / step_ms
//! ```
//!
//! The cap keeps a stalled window (backgrounded, paused in a debugger) from
//! replaying seconds of simulation in one frame. `alpha` tells the renderer
//! how far between the previous and current step the displayed frame sits.

use glam::Vec2;

use crate::config::StarfieldConfig;
use crate::store::ParticleStore;

/// Largest `f32` below 1.
const ALPHA_MAX: f32 = 1.0 - f32::EPSILON / 2.0;

/// Star positions as they were right before the latest fixed step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousSnapshot {
    xs: Vec<f32>,
    ys: Vec<f32>,
    /// Store generation the positions were captured from.
    generation: Option<u64>,
}

impl PreviousSnapshot {
    /// Copy the current positions of `store`.
    pub fn capture(&mut self, store: &ParticleStore) {
        self.xs.clear();
        self.xs.extend_from_slice(store.xs());
        self.ys.clear();
        self.ys.extend_from_slice(store.ys());
        self.generation = Some(store.generation());
    }

    /// Overwrite the snapshot entries of `indices` with their current
    /// positions, so wrapped stars interpolate from where they landed.
    pub fn sync(&mut self, store: &ParticleStore, indices: &[usize]) {
        for &i in indices {
            if let (Some(x), Some(y)) = (self.xs.get_mut(i), self.ys.get_mut(i)) {
                *x = store.xs()[i];
                *y = store.ys()[i];
            }
        }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Whether this snapshot was captured from the current generation of
    /// `store`. A snapshot that was never captured matches nothing.
    pub fn matches(&self, store: &ParticleStore) -> bool {
        self.generation == Some(store.generation()) && self.len() == store.len()
    }

    pub fn xs(&self) -> &[f32] {
        &self.xs
    }

    pub fn ys(&self) -> &[f32] {
        &self.ys
    }

    pub fn position(&self, i: usize) -> Option<Vec2> {
        Some(Vec2::new(*self.xs.get(i)?, *self.ys.get(i)?))
    }
}

/// Outcome of one display callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Fixed steps run during this frame.
    pub steps: u32,
    /// Fraction of a step not yet simulated, in `[0, 1)`.
    pub alpha: f32,
}

/// Accumulator that drives fixed steps from variable frame times.
#[derive(Debug, Clone)]
pub struct Scheduler {
    step_ms: f64,
    max_frame_ms: f64,
    accumulator: f64,
    last_frame: f64,
    total_steps: u64,
    snapshot: PreviousSnapshot,
    wrapped: Vec<usize>,
}

impl Scheduler {
    /// Create a scheduler whose first frame is measured from `now`.
    pub fn new(step_ms: f64, max_frame_ms: f64, now: f64) -> Self {
        Self {
            step_ms,
            max_frame_ms,
            accumulator: 0.0,
            last_frame: now,
            total_steps: 0,
            snapshot: PreviousSnapshot::default(),
            wrapped: Vec::new(),
        }
    }

    pub fn from_config(config: &StarfieldConfig, now: f64) -> Self {
        Self::new(config.step_duration_ms, config.max_frame_time_ms, now)
    }

    /// Account for the time elapsed up to `now` and run the fixed steps it
    /// pays for.
    ///
    /// Before each step the current positions are captured into the
    /// snapshot; after it, every index the step reports as wrapped is synced
    /// back so interpolation never spans a teleport.
    pub fn advance<F>(&mut self, now: f64, store: &mut ParticleStore, mut step: F) -> FrameStep
    where
        F: FnMut(&mut ParticleStore, &mut Vec<usize>),
    {
        // max() drops a NaN difference as well as clock regressions.
        let frame_time = (now - self.last_frame).max(0.0).min(self.max_frame_ms);
        self.last_frame = now;
        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= self.step_ms {
            self.snapshot.capture(store);
            self.wrapped.clear();
            step(store, &mut self.wrapped);
            self.snapshot.sync(store, &self.wrapped);

            self.accumulator -= self.step_ms;
            steps += 1;
        }
        self.total_steps += steps as u64;

        FrameStep {
            steps,
            alpha: self.alpha(),
        }
    }

    /// Fraction of a step not yet simulated, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        ((self.accumulator / self.step_ms) as f32).clamp(0.0, ALPHA_MAX)
    }

    /// Measure the next frame from `now` and drop any banked time.
    pub fn restart(&mut self, now: f64) {
        self.last_frame = now;
        self.accumulator = 0.0;
    }

    /// Replace the snapshot with the current positions of a new generation.
    pub fn reset_snapshot(&mut self, store: &ParticleStore) {
        self.snapshot.capture(store);
    }

    pub fn snapshot(&self) -> &PreviousSnapshot {
        &self.snapshot
    }

    #[inline]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    #[inline]
    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }

    #[inline]
    pub fn last_frame(&self) -> f64 {
        self.last_frame
    }

    /// Fixed steps run since creation.
    #[inline]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;
    use crate::store::ParticleSeed;

    const STEP: f64 = 1000.0 / 60.0;
    const MAX: f64 = 1000.0 / 30.0;

    fn store() -> ParticleStore {
        ParticleStore::from_seeds(
            &[
                ParticleSeed { position: Vec2::new(10.0, 10.0), size: 2.0, color_index: 0 },
                ParticleSeed { position: Vec2::new(20.0, 20.0), size: 9.0, color_index: 1 },
            ],
            &Palette::default(),
        )
    }

    fn nudge(store: &mut ParticleStore, _wrapped: &mut Vec<usize>) {
        for x in store.xs.iter_mut() {
            *x += 1.0;
        }
    }

    #[test]
    fn test_steps_follow_accumulated_time() {
        let mut scheduler = Scheduler::new(STEP, MAX, 0.0);
        let mut store = store();

        let frame = scheduler.advance(10.0, &mut store, nudge);
        assert_eq!(frame.steps, 0);
        assert!((frame.alpha - 0.6).abs() < 1e-6);

        let frame = scheduler.advance(20.0, &mut store, nudge);
        assert_eq!(frame.steps, 1);
        assert!((frame.alpha - 0.2).abs() < 1e-5);
        assert_eq!(store.xs()[0], 11.0);
        assert_eq!(scheduler.total_steps(), 1);
    }

    #[test]
    fn test_frame_time_is_capped() {
        let mut scheduler = Scheduler::new(STEP, MAX, 0.0);
        let mut store = store();

        let frame = scheduler.advance(5_000.0, &mut store, nudge);
        assert_eq!(frame.steps, 2);
        assert!(scheduler.accumulator() < STEP);
        assert_eq!(scheduler.last_frame(), 5_000.0);
    }

    #[test]
    fn test_clock_regression_counts_as_zero() {
        let mut scheduler = Scheduler::new(STEP, MAX, 100.0);
        let mut store = store();

        let frame = scheduler.advance(50.0, &mut store, nudge);
        assert_eq!(frame.steps, 0);
        assert_eq!(scheduler.accumulator(), 0.0);

        let frame = scheduler.advance(f64::NAN, &mut store, nudge);
        assert_eq!(frame.steps, 0);
        assert_eq!(frame.alpha, 0.0);
    }

    #[test]
    fn test_alpha_stays_in_unit_interval() {
        let mut scheduler = Scheduler::new(STEP, MAX, 0.0);
        let mut store = store();
        let mut now = 0.0;

        for i in 0..500 {
            now += [3.0, 7.5, 16.0, 16.7, 33.0, 90.0][i % 6];
            let frame = scheduler.advance(now, &mut store, nudge);
            assert!((0.0..1.0).contains(&frame.alpha), "alpha = {}", frame.alpha);
        }
    }

    #[test]
    fn test_snapshot_holds_pre_step_positions() {
        let mut scheduler = Scheduler::new(STEP, MAX, 0.0);
        let mut store = store();

        scheduler.advance(STEP, &mut store, nudge);
        assert_eq!(scheduler.snapshot().xs(), &[10.0, 20.0]);
        assert_eq!(store.xs(), &[11.0, 21.0]);
    }

    #[test]
    fn test_wrapped_entries_are_synced() {
        let mut scheduler = Scheduler::new(STEP, MAX, 0.0);
        let mut store = store();

        scheduler.advance(STEP, &mut store, |store, wrapped| {
            store.xs[1] = -20.0;
            store.ys[1] = 500.0;
            wrapped.push(1);
            store.xs[0] += 1.0;
        });

        assert_eq!(scheduler.snapshot().position(0), Some(Vec2::new(10.0, 10.0)));
        assert_eq!(scheduler.snapshot().position(1), Some(Vec2::new(-20.0, 500.0)));
    }

    #[test]
    fn test_reset_snapshot_matches_new_generation() {
        let mut scheduler = Scheduler::new(STEP, MAX, 0.0);
        let empty = ParticleStore::new();
        let store = store();

        scheduler.reset_snapshot(&empty);
        assert!(!scheduler.snapshot().matches(&store));

        scheduler.reset_snapshot(&store);
        assert!(scheduler.snapshot().matches(&store));
        assert_eq!(scheduler.snapshot().position(1), Some(Vec2::new(20.0, 20.0)));
        assert_eq!(scheduler.snapshot().position(2), None);
    }
}
