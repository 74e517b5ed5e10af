//! Color-batched drawing through an abstract [`Surface`].
//!
//! The renderer never touches a graphics API directly. It clears the surface,
//! then walks the color buckets in palette order: one fill-color change per
//! non-empty bucket, one square per star. Positions are interpolated between
//! the previous snapshot and the current step using the scheduler's alpha.

use crate::palette::{Color, Palette};
use crate::scheduler::PreviousSnapshot;
use crate::store::ParticleStore;
use crate::viewport::Viewport;

/// Axis-aligned rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole viewport, anchored at the origin.
    pub fn covering(viewport: Viewport) -> Self {
        Self::new(0.0, 0.0, viewport.width, viewport.height)
    }
}

/// A 2D drawing target addressed in logical units.
pub trait Surface {
    /// Match the backing store to a new viewport and device pixel ratio.
    fn resize(&mut self, viewport: Viewport, scale_factor: f64);

    /// Erase `region` to the surface background.
    fn clear(&mut self, region: Rect);

    /// Color used by subsequent [`Surface::fill_rect`] calls.
    fn set_fill_color(&mut self, color: Color);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
}

/// Blend between the previous and current value of one coordinate.
///
/// Written as a weighted sum so that `alpha == 0` yields `prev` and
/// `alpha == 1` yields `curr` without rounding.
#[inline]
pub fn interpolate(prev: f32, curr: f32, alpha: f32) -> f32 {
    prev * (1.0 - alpha) + curr * alpha
}

/// Counters from the latest [`Renderer::draw`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub batches: usize,
    pub rects: usize,
}

#[derive(Debug, Default)]
pub struct Renderer {
    last: DrawStats,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame.
    ///
    /// When the snapshot does not belong to the current generation (right
    /// after a regeneration, before the first step) stars are drawn at their
    /// current positions.
    pub fn draw<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        store: &ParticleStore,
        snapshot: &PreviousSnapshot,
        palette: &Palette,
        viewport: Viewport,
        alpha: f32,
    ) -> DrawStats {
        surface.clear(Rect::covering(viewport));

        let xs = store.xs();
        let ys = store.ys();
        let sizes = store.sizes();
        let (prev_xs, prev_ys) = if snapshot.matches(store) {
            (snapshot.xs(), snapshot.ys())
        } else {
            (xs, ys)
        };

        let mut stats = DrawStats::default();
        for (color_index, indices) in store.buckets().iter() {
            if indices.is_empty() {
                continue;
            }
            let Some(color) = palette.get(color_index) else {
                continue;
            };

            surface.set_fill_color(color);
            stats.batches += 1;

            for &i in indices {
                let x = interpolate(prev_xs[i], xs[i], alpha);
                let y = interpolate(prev_ys[i], ys[i], alpha);
                surface.fill_rect(x, y, sizes[i], sizes[i]);
            }
            stats.rects += indices.len();
        }

        self.last = stats;
        stats
    }

    /// Counters from the most recent frame.
    pub fn last_stats(&self) -> DrawStats {
        self.last
    }
}

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Resize { viewport: Viewport, scale_factor: f64 },
    Clear(Rect),
    SetFillColor(Color),
    FillRect(Rect),
}

/// Headless surface that records every call, for tests and offline use.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles filled so far, in call order.
    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillRect(r) => Some(*r),
            _ => None,
        })
    }

    /// Fill colors set so far, in call order.
    pub fn fill_colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::SetFillColor(color) => Some(*color),
            _ => None,
        })
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, viewport: Viewport, scale_factor: f64) {
        self.commands.push(DrawCommand::Resize { viewport, scale_factor });
    }

    fn clear(&mut self, region: Rect) {
        self.commands.push(DrawCommand::Clear(region));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.commands.push(DrawCommand::SetFillColor(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::FillRect(Rect::new(x, y, width, height)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ParticleSeed;
    use glam::Vec2;

    const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

    fn seeds() -> Vec<ParticleSeed> {
        vec![
            ParticleSeed { position: Vec2::new(10.0, 10.0), size: 2.0, color_index: 2 },
            ParticleSeed { position: Vec2::new(20.0, 20.0), size: 5.0, color_index: 0 },
            ParticleSeed { position: Vec2::new(30.0, 30.0), size: 8.0, color_index: 2 },
        ]
    }

    fn moved(store: &ParticleStore, dx: f32) -> ParticleStore {
        let mut next = store.clone();
        for x in next.xs.iter_mut() {
            *x += dx;
        }
        next
    }

    #[test]
    fn test_interpolate_endpoints_exact() {
        let (prev, curr) = (0.1_f32, 0.7_f32);
        assert_eq!(interpolate(prev, curr, 0.0), prev);
        assert_eq!(interpolate(prev, curr, 1.0), curr);
        assert_eq!(interpolate(-20.0, 620.0, 0.0), -20.0);
        assert!((interpolate(0.0, 10.0, 0.25) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_batches_follow_palette_order() {
        let palette = Palette::default();
        let store = ParticleStore::from_seeds(&seeds(), &palette);
        let mut snapshot = PreviousSnapshot::default();
        snapshot.capture(&store);
        let mut surface = RecordingSurface::new();

        let stats = Renderer::new().draw(&mut surface, &store, &snapshot, &palette, VIEWPORT, 0.0);

        assert_eq!(stats, DrawStats { batches: 2, rects: 3 });
        assert_eq!(surface.commands[0], DrawCommand::Clear(Rect::covering(VIEWPORT)));
        let colors: Vec<_> = surface.fill_colors().collect();
        assert_eq!(colors, vec![palette.colors()[0], palette.colors()[2]]);

        assert_eq!(
            &surface.commands[1..],
            &[
                DrawCommand::SetFillColor(palette.colors()[0]),
                DrawCommand::FillRect(Rect::new(20.0, 20.0, 5.0, 5.0)),
                DrawCommand::SetFillColor(palette.colors()[2]),
                DrawCommand::FillRect(Rect::new(10.0, 10.0, 2.0, 2.0)),
                DrawCommand::FillRect(Rect::new(30.0, 30.0, 8.0, 8.0)),
            ]
        );
    }

    #[test]
    fn test_alpha_endpoints_draw_prev_and_curr() {
        let palette = Palette::default();
        let before = ParticleStore::from_seeds(&seeds(), &palette);
        let mut snapshot = PreviousSnapshot::default();
        snapshot.capture(&before);
        let after = moved(&before, 3.3);
        let mut renderer = Renderer::new();

        let mut surface = RecordingSurface::new();
        renderer.draw(&mut surface, &after, &snapshot, &palette, VIEWPORT, 0.0);
        let xs: Vec<f32> = surface.rects().map(|r| r.x).collect();
        assert_eq!(xs, vec![20.0, 10.0, 30.0]);

        let mut surface = RecordingSurface::new();
        renderer.draw(&mut surface, &after, &snapshot, &palette, VIEWPORT, 1.0);
        let xs: Vec<f32> = surface.rects().map(|r| r.x).collect();
        assert_eq!(xs, vec![after.xs()[1], after.xs()[0], after.xs()[2]]);
    }

    #[test]
    fn test_stale_snapshot_draws_current_positions() {
        let palette = Palette::default();
        let store = ParticleStore::from_seeds(&seeds(), &palette);
        let snapshot = PreviousSnapshot::default();
        let mut surface = RecordingSurface::new();

        Renderer::new().draw(&mut surface, &store, &snapshot, &palette, VIEWPORT, 0.5);

        let xs: Vec<f32> = surface.rects().map(|r| r.x).collect();
        assert_eq!(xs, vec![20.0, 10.0, 30.0]);
    }

    #[test]
    fn test_regeneration_with_same_count_drops_old_snapshot() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let palette = Palette::default();
        let viewport = Viewport::new(100.0, 100.0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut store = ParticleStore::new();
        store.regenerate(viewport, 0.001, &palette, &mut rng);
        let mut snapshot = PreviousSnapshot::default();
        snapshot.capture(&store);
        assert!(snapshot.matches(&store));

        store.regenerate(viewport, 0.001, &palette, &mut rng);
        assert_eq!(store.len(), snapshot.len());
        assert!(!snapshot.matches(&store));

        let mut surface = RecordingSurface::new();
        Renderer::new().draw(&mut surface, &store, &snapshot, &palette, viewport, 0.0);
        let expected: Vec<f32> = store
            .buckets()
            .iter()
            .flat_map(|(_, indices)| indices.iter().map(|&i| store.xs()[i]))
            .collect();
        let drawn: Vec<f32> = surface.rects().map(|r| r.x).collect();
        assert_eq!(drawn, expected);
    }

    #[test]
    fn test_empty_store_only_clears() {
        let palette = Palette::default();
        let store = ParticleStore::new();
        let mut surface = RecordingSurface::new();
        let mut renderer = Renderer::new();

        let stats = renderer.draw(
            &mut surface,
            &store,
            &PreviousSnapshot::default(),
            &palette,
            Viewport::new(0.0, 0.0),
            0.0,
        );

        assert_eq!(stats, DrawStats::default());
        assert_eq!(surface.commands, vec![DrawCommand::Clear(Rect::new(0.0, 0.0, 0.0, 0.0))]);
        assert_eq!(renderer.last_stats(), stats);
    }
}
