use std::num::NonZeroUsize;

use bevy::prelude::*;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rewind_core::{
    build_headless_app, run_fixed_tick, run_frame, HistoryBuffer, PlayerBundle, RewindRequest,
    RewindSettings, Snapshot,
};

fn snapshot(step: usize) -> Snapshot {
    let x = step as f32 * 0.1;
    Snapshot::new(
        Vec3::new(x, -x, 0.0),
        Quat::from_rotation_z(x),
        Vec2::new(1.0, -2.0),
        0.5,
        Color::WHITE,
    )
}

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    for capacity in [50usize, 250, 1000, 5000] {
        let Some(capacity) = NonZeroUsize::new(capacity) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::new("record_full", capacity.get()),
            &capacity,
            |b, &capacity| {
                b.iter_batched(
                    || HistoryBuffer::new(capacity),
                    |mut history| {
                        for step in 0..capacity.get() * 2 {
                            history.record(snapshot(step));
                        }
                        history
                    },
                    BatchSize::SmallInput,
                )
            },
        );
        group.bench_with_input(
            BenchmarkId::new("drain", capacity.get()),
            &capacity,
            |b, &capacity| {
                b.iter_batched(
                    || {
                        let mut history = HistoryBuffer::new(capacity);
                        for step in 0..capacity.get() {
                            history.record(snapshot(step));
                        }
                        history
                    },
                    |mut history| while history.pop_newest().is_some() {},
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_rewind_app(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewind_app");

    for bodies in [1usize, 16, 64, 256] {
        group.bench_with_input(BenchmarkId::new("bodies", bodies), &bodies, |b, &bodies| {
            b.iter_batched(
                || {
                    let mut app = build_headless_app();
                    for index in 0..bodies {
                        app.world.spawn((
                            PlayerBundle::new(RewindSettings::default(), Vec2::splat(0.5)),
                            Transform::from_xyz(index as f32, 0.0, 0.0),
                        ));
                    }
                    for _ in 0..50 {
                        run_fixed_tick(&mut app);
                    }
                    app
                },
                |mut app| {
                    app.world.send_event(RewindRequest::Start);
                    run_frame(&mut app, 0.016);
                    for _ in 0..51 {
                        run_fixed_tick(&mut app);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(history_benches, bench_history, bench_rewind_app);
criterion_main!(history_benches);
