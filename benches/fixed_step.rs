//! Benchmarks for the CPU-side frame loop.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use starfield::pointer::ForceMode;
use starfield::{
    ForceField, Integrator, Palette, PreviousSnapshot, RecordingSurface, Renderer, ParticleStore,
    Vec2, Viewport,
};

fn populated(viewport: Viewport, density: f64) -> ParticleStore {
    let mut rng = StdRng::seed_from_u64(42);
    let mut store = ParticleStore::new();
    store.regenerate(viewport, density, &Palette::default(), &mut rng);
    store
}

fn bench_integrator_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");
    let viewport = Viewport::new(1920.0, 1080.0);
    let integrator = Integrator::default();
    let field = ForceField::default();
    let target = viewport.center();

    for density in [0.0005, 0.002, 0.01] {
        let count = populated(viewport, density).count();
        for mode in [ForceMode::Idle, ForceMode::Attract] {
            let id = BenchmarkId::new(format!("{:?}", mode), count);
            group.bench_with_input(id, &density, |b, &density| {
                let mut store = populated(viewport, density);
                let mut wrapped = Vec::new();
                b.iter(|| {
                    wrapped.clear();
                    integrator.step(&mut store, &field, target, mode, viewport, &mut wrapped);
                    black_box(wrapped.len())
                })
            });
        }
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let viewport = Viewport::new(1920.0, 1080.0);
    let palette = Palette::default();
    let store = populated(viewport, 0.002);
    let mut snapshot = PreviousSnapshot::default();
    snapshot.capture(&store);
    let mut renderer = Renderer::new();
    let mut surface = RecordingSurface::new();

    c.bench_function("render_recording", |b| {
        b.iter(|| {
            surface.clear_commands();
            black_box(renderer.draw(&mut surface, &store, &snapshot, &palette, viewport, 0.5))
        })
    });
}

fn bench_force(c: &mut Criterion) {
    let field = ForceField::default();
    let target = Vec2::new(400.0, 300.0);

    c.bench_function("force_acceleration", |b| {
        b.iter(|| black_box(field.acceleration(black_box(Vec2::new(120.0, 80.0)), target, 1.0)))
    });
}

criterion_group!(benches, bench_integrator_step, bench_render, bench_force);
criterion_main!(benches);
