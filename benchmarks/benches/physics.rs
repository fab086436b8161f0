//! Physics engine benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::Vec2;
use impulse2d::physics::CollisionMatrix;
use impulse2d::physics::contact::ContactInfo;
use impulse2d::physics::narrowphase::{circle_circle, circle_rect, detect_collision, rect_rect};
use impulse2d::physics::raycast::{cast, traverse};
use impulse2d::physics::solver::{BodyState, resolve_contact};
use impulse2d::{ColliderShape, RectShape, Transform};
use impulse2d_bench::*;

// ---------------------------------------------------------------------------
// Broadphase
// ---------------------------------------------------------------------------

fn bench_broadphase(c: &mut Criterion) {
    let matrix = CollisionMatrix::default();

    for (name, setup) in [
        ("broadphase/uniform_circles", setup_circle_world as fn(usize) -> _),
        ("broadphase/mixed_shapes", setup_mixed_world),
        ("broadphase/sparse", setup_sparse_world),
    ] {
        let mut group = c.benchmark_group(name);
        for &n in &[100, 500, 1000, 2000] {
            let world = setup(n);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter_batched(
                    || populate_broadphase(&world, 50.0),
                    |mut broadphase| broadphase.compute_pairs(&matrix).len(),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        // Second sweep over unchanged chunks hits the pair caches
        let mut group = c.benchmark_group("broadphase/cached_static");
        for &n in &[500, 2000] {
            let world = setup_mixed_world(n);
            let mut broadphase = populate_broadphase(&world, 50.0);
            broadphase.compute_pairs(&matrix);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    broadphase.clear_pairs();
                    broadphase.compute_pairs(&matrix).len()
                });
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("narrowphase/circle_circle");
        group.bench_function("intersecting", |b| {
            b.iter(|| circle_circle(1.0, Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0)));
        });
        group.bench_function("separated", |b| {
            b.iter(|| circle_circle(1.0, Vec2::ZERO, 1.0, Vec2::new(5.0, 0.0)));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/rect_rect");
        let rect = RectShape::new(Vec2::ONE);
        let ta = Transform::identity();

        let tb_hit = Transform::from_position(Vec2::new(1.5, 0.0));
        group.bench_function("intersecting", |b| {
            b.iter(|| rect_rect(&rect, &ta, &rect, &tb_hit));
        });

        let tb_miss = Transform::from_position(Vec2::new(5.0, 0.0));
        group.bench_function("separated", |b| {
            b.iter(|| rect_rect(&rect, &ta, &rect, &tb_miss));
        });

        let tb_rot = Transform::from_position_rotation(Vec2::new(1.5, 0.0), 0.785);
        group.bench_function("rotated", |b| {
            b.iter(|| rect_rect(&rect, &ta, &rect, &tb_rot));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/circle_rect");
        let rect = RectShape::new(Vec2::ONE);
        let rect_t = Transform::identity();

        group.bench_function("face", |b| {
            b.iter(|| circle_rect(1.0, Vec2::new(1.5, 0.0), &rect, &rect_t));
        });
        group.bench_function("corner", |b| {
            b.iter(|| circle_rect(1.0, Vec2::new(1.5, 1.5), &rect, &rect_t));
        });
        group.bench_function("separated", |b| {
            b.iter(|| circle_rect(1.0, Vec2::new(5.0, 0.0), &rect, &rect_t));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/dispatch");
        let ta = Transform::identity();
        let tb = Transform::from_position(Vec2::new(1.5, 0.0));

        let circle = ColliderShape::Circle { radius: 1.0 };
        let rect = ColliderShape::Rect(RectShape::new(Vec2::ONE));
        for (name, a, b_shape) in [
            ("circle_circle", &circle, &circle),
            ("rect_rect", &rect, &rect),
            ("rect_circle", &rect, &circle),
            ("circle_rect", &circle, &rect),
        ] {
            group.bench_function(name, |b| {
                b.iter(|| detect_collision(a, &ta, b_shape, &tb));
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver/contact_count");
    for &n in &[10, 100, 1000] {
        let contacts: Vec<(ContactInfo, BodyState, BodyState)> = (0..n)
            .map(|i| {
                let x = i as f32 * 3.0;
                let body = |x: f32, vx: f32| BodyState {
                    position: Vec2::new(x, 0.0),
                    linear_velocity: Vec2::new(vx, 0.0),
                    angular_velocity: 0.1,
                    inv_mass: 1.0,
                    inv_inertia: 1.0,
                };
                let info = ContactInfo::single(Vec2::X, 0.5, Vec2::new(x + 0.75, 0.2));
                (info, body(x, 1.0), body(x + 1.5, -1.0))
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &contacts, |b, contacts| {
            b.iter_batched(
                || contacts.clone(),
                |mut contacts| {
                    for (info, body_a, body_b) in &mut contacts {
                        resolve_contact(info, body_a, body_b, 1.0 / 60.0, 0.5);
                    }
                    contacts
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Ray queries
// ---------------------------------------------------------------------------

fn bench_raycast(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("raycast/traverse");
        for &length in &[100.0f32, 1000.0, 10000.0] {
            group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &length| {
                let target = Vec2::new(0.6, 0.8) * length;
                b.iter(|| traverse(Vec2::new(3.0, 7.0), target, 50.0));
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("raycast/cast");
        let matrix = CollisionMatrix::default();
        for &n in &[500, 2000] {
            let world = setup_sparse_world(n);
            let broadphase = populate_broadphase(&world, 50.0);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    cast(
                        &world,
                        &broadphase,
                        &matrix,
                        Vec2::new(-10.0, 1.0),
                        Vec2::new(3000.0, 2500.0),
                        1,
                        None,
                    )
                });
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("pipeline/tick");
        group.sample_size(30);
        for &n in &[50, 100, 500, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_scene(n).expect("scene setup"),
                    |(mut world, mut physics)| {
                        physics.tick(&mut world, 1.0 / 60.0);
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/sustained_60ticks");
        group.sample_size(10);
        for &n in &[100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_scene(n).expect("scene setup"),
                    |(mut world, mut physics)| {
                        for _ in 0..60 {
                            physics.tick(&mut world, 1.0 / 60.0);
                        }
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/churn");
        group.sample_size(10);
        for &spawn_per_frame in &[1, 3, 10] {
            group.bench_with_input(
                BenchmarkId::from_parameter(spawn_per_frame),
                &spawn_per_frame,
                |b, &spf| {
                    b.iter_batched(
                        || setup_scene(0).expect("scene setup"),
                        |(mut world, mut physics)| {
                            run_churn(&mut world, &mut physics, 120, spf, 200).expect("churn run");
                        },
                        criterion::BatchSize::LargeInput,
                    );
                },
            );
        }
        group.finish();
    }
}

criterion_group!(
    benches,
    bench_broadphase,
    bench_narrowphase,
    bench_solver,
    bench_raycast,
    bench_pipeline
);
criterion_main!(benches);
