//! Structure-of-arrays star storage.
//!
//! Every per-star attribute lives in its own `Vec`, indexed by star id. The
//! integrator walks these arrays linearly once per fixed step, which keeps
//! iteration cache friendly at a few thousand stars.
//!
//! A store is only ever replaced wholesale: [`ParticleStore::regenerate`]
//! resizes and repopulates every array and rebuilds the [`ColorBuckets`].
//! After generation, `size`, `natural_speed` and `color_index` never change;
//! positions, velocities and accelerations are written by the integrator only.

use glam::Vec2;
use rand::Rng;

use crate::palette::Palette;
use crate::viewport::Viewport;

/// Size at which natural drift changes direction.
pub const SIZE_BREAKPOINT: f32 = 6.5;

/// Drift speed per unit of size away from the breakpoint.
pub const SPEED_SCALE: f32 = 0.05;

/// Smallest natural drift magnitude any star may have.
pub const MIN_NATURAL_SPEED: f32 = 0.033;

/// Number of stars a viewport holds at the given density.
///
/// Computed in `f64` so that densities like `0.0001` do not floor one short.
pub fn particle_count(viewport: Viewport, density: f64) -> usize {
    let area = viewport.width.max(0.0) as f64 * viewport.height.max(0.0) as f64;
    let count = (area * density).floor();
    if count.is_finite() && count > 0.0 {
        count as usize
    } else {
        0
    }
}

/// Draw a star size from the three-tier distribution.
///
/// 60% small in `[1, 4)`, 30% medium in `[4, 7)`, 10% large in `[7, 10)`.
pub fn sample_size<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let tier: f32 = rng.gen();
    if tier < 0.6 {
        rng.gen_range(1.0..4.0)
    } else if tier < 0.9 {
        rng.gen_range(4.0..7.0)
    } else {
        rng.gen_range(7.0..10.0)
    }
}

/// Vertical drift speed for a star of the given size.
///
/// Large stars fall (positive y), small ones rise. The magnitude never drops
/// below [`MIN_NATURAL_SPEED`]; a size exactly on the breakpoint falls.
pub fn natural_speed(size: f32) -> f32 {
    let base = (size - SIZE_BREAKPOINT) * SPEED_SCALE;
    if base.abs() < MIN_NATURAL_SPEED {
        if base < 0.0 {
            -MIN_NATURAL_SPEED
        } else {
            MIN_NATURAL_SPEED
        }
    } else {
        base
    }
}

/// Star indices grouped by palette color.
///
/// Bucket `c` lists, in ascending order, every star whose color index is `c`.
/// Together the buckets cover each star exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorBuckets {
    buckets: Vec<Vec<usize>>,
}

impl ColorBuckets {
    fn rebuild(color_indices: &[u8], palette_len: usize) -> Self {
        let mut buckets = vec![Vec::new(); palette_len];
        for (i, &c) in color_indices.iter().enumerate() {
            buckets[c as usize].push(i);
        }
        Self { buckets }
    }

    /// Number of buckets (equal to the palette length at generation time).
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Indices of the stars with color `color`, empty if out of range.
    pub fn get(&self, color: usize) -> &[usize] {
        self.buckets.get(color).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(color_index, star_indices)` pairs in palette order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.buckets.iter().map(Vec::as_slice).enumerate()
    }
}

/// Explicit description of one star, for building deterministic scenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSeed {
    pub position: Vec2,
    pub size: f32,
    pub color_index: u8,
}

/// Parallel arrays holding every star of the current generation.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    pub(crate) xs: Vec<f32>,
    pub(crate) ys: Vec<f32>,
    pub(crate) vxs: Vec<f32>,
    pub(crate) vys: Vec<f32>,
    pub(crate) axs: Vec<f32>,
    pub(crate) ays: Vec<f32>,
    sizes: Vec<f32>,
    speeds: Vec<f32>,
    color_indices: Vec<u8>,
    buckets: ColorBuckets,
    generation: u64,
}

impl ParticleStore {
    /// An empty store with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from explicit seeds.
    ///
    /// Natural speed is still derived from size, velocity starts at
    /// `(0, natural_speed)` and acceleration at zero. Color indices past the
    /// end of the palette wrap around it.
    pub fn from_seeds(seeds: &[ParticleSeed], palette: &Palette) -> Self {
        let mut store = Self::new();
        store.reset_arrays(seeds.len());
        for seed in seeds {
            let color = (seed.color_index as usize % palette.len()) as u8;
            store.push(seed.position, seed.size, color);
        }
        store.buckets = ColorBuckets::rebuild(&store.color_indices, palette.len());
        store
    }

    /// Discard every star and populate a fresh generation for `viewport`.
    ///
    /// The count is `floor(area × density)`; positions are uniform over the
    /// viewport, sizes follow [`sample_size`] and colors are uniform over the
    /// palette. A zero-area viewport yields an empty store.
    pub fn regenerate<R: Rng + ?Sized>(
        &mut self,
        viewport: Viewport,
        density: f64,
        palette: &Palette,
        rng: &mut R,
    ) {
        let count = particle_count(viewport, density);
        self.reset_arrays(count);

        for _ in 0..count {
            let size = sample_size(rng);
            let color = rng.gen_range(0..palette.len()) as u8;
            let position = Vec2::new(
                rng.gen::<f32>() * viewport.width,
                rng.gen::<f32>() * viewport.height,
            );
            self.push(position, size, color);
        }

        self.buckets = ColorBuckets::rebuild(&self.color_indices, palette.len());
    }

    fn reset_arrays(&mut self, capacity: usize) {
        self.generation += 1;
        // Fresh allocations: nothing from the previous generation survives.
        self.xs = Vec::with_capacity(capacity);
        self.ys = Vec::with_capacity(capacity);
        self.vxs = Vec::with_capacity(capacity);
        self.vys = Vec::with_capacity(capacity);
        self.axs = Vec::with_capacity(capacity);
        self.ays = Vec::with_capacity(capacity);
        self.sizes = Vec::with_capacity(capacity);
        self.speeds = Vec::with_capacity(capacity);
        self.color_indices = Vec::with_capacity(capacity);
    }

    fn push(&mut self, position: Vec2, size: f32, color_index: u8) {
        let speed = natural_speed(size);
        self.xs.push(position.x);
        self.ys.push(position.y);
        self.vxs.push(0.0);
        self.vys.push(speed);
        self.axs.push(0.0);
        self.ays.push(0.0);
        self.sizes.push(size);
        self.speeds.push(speed);
        self.color_indices.push(color_index);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[f32] {
        &self.xs
    }

    pub fn ys(&self) -> &[f32] {
        &self.ys
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn natural_speeds(&self) -> &[f32] {
        &self.speeds
    }

    pub fn color_indices(&self) -> &[u8] {
        &self.color_indices
    }

    pub fn buckets(&self) -> &ColorBuckets {
        &self.buckets
    }

    /// Bumped every time the store is repopulated. Zero for an empty `new()`.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of star `i`. Panics if `i` is out of range.
    pub fn position(&self, i: usize) -> Vec2 {
        Vec2::new(self.xs[i], self.ys[i])
    }

    /// Velocity of star `i`. Panics if `i` is out of range.
    pub fn velocity(&self, i: usize) -> Vec2 {
        Vec2::new(self.vxs[i], self.vys[i])
    }

    /// Accumulated acceleration of star `i`. Panics if `i` is out of range.
    pub fn acceleration(&self, i: usize) -> Vec2 {
        Vec2::new(self.axs[i], self.ays[i])
    }

    pub(crate) fn natural_speed_of(&self, i: usize) -> f32 {
        self.speeds[i]
    }
}
