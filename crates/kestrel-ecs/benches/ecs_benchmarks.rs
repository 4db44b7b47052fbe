//! Criterion benchmarks for entity churn and include/exclude queries.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kestrel_ecs::prelude::*;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Velocity {
    dx: f32,
    dy: f32,
    dz: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Sleeping;

fn populated_world(count: u32) -> World {
    let mut world = World::new();
    let pos = world.register_component::<Position>("Position").unwrap();
    let vel = world.register_component::<Velocity>("Velocity").unwrap();
    let sleeping = world.register_component::<Sleeping>("Sleeping").unwrap();
    for i in 0..count {
        let e = world.create_entity();
        world
            .insert(e, pos, Position { x: i as f32, y: 0.0, z: 0.0 })
            .unwrap();
        if i % 2 == 0 {
            world
                .insert(e, vel, Velocity { dx: 1.0, dy: 0.0, dz: 0.0 })
                .unwrap();
        }
        if i % 10 == 0 {
            world.insert(e, sleeping, Sleeping).unwrap();
        }
    }
    world
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    for count in [1_000u32, 10_000] {
        let world = populated_world(count);
        let query = Query::new()
            .with(world.handle::<Position>("Position").unwrap())
            .with(world.handle::<Velocity>("Velocity").unwrap())
            .without(world.handle::<Sleeping>("Sleeping").unwrap());

        group.bench_with_input(BenchmarkId::new("by_handle", count), &world, |b, world| {
            b.iter(|| black_box(world.run_query(&query).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("by_name", count), &world, |b, world| {
            b.iter(|| {
                black_box(
                    world
                        .query(&["Position", "Velocity"], &["Sleeping"])
                        .unwrap(),
                )
            })
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("create_destroy_1000", |b| {
        let mut world = populated_world(0);
        let pos = world.handle::<Position>("Position").unwrap();
        b.iter(|| {
            let entities: Vec<_> = (0..1_000)
                .map(|i| {
                    let e = world.create_entity();
                    world
                        .insert(e, pos, Position { x: i as f32, y: 0.0, z: 0.0 })
                        .unwrap();
                    e
                })
                .collect();
            for e in entities {
                world.destroy_entity(e);
            }
        })
    });
}

criterion_group!(benches, bench_query, bench_churn);
criterion_main!(benches);
