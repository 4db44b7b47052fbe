//! Determinism check: the same seed, systems and tick count must produce
//! byte-identical world state, verified through the BLAKE3 snapshot hash.

use kestrel_engine::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const ENTITIES: usize = 2_000;
const TICKS: u64 = 300;

fn build(seed: u64) -> TickLoop {
    init_tracing();
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut world = World::new();
    let c = register_core_components(&mut world).unwrap();

    for i in 0..ENTITIES {
        let e = world.create_entity();
        let position = Vec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), 0.0);
        world.insert(e, c.transform, Transform { position }).unwrap();
        world
            .insert(
                e,
                c.velocity,
                Velocity(Vec3::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0), 0.0)),
            )
            .unwrap();
        world
            .insert(
                e,
                c.bounds,
                Bounds {
                    min: Vec3::new(-60.0, -60.0, -1.0),
                    max: Vec3::new(60.0, 60.0, 1.0),
                },
            )
            .unwrap();
        world
            .insert(e, c.health, Health::new(rng.gen_range(1.0..100.0), 100.0))
            .unwrap();
        if i % 3 == 0 {
            world
                .insert(e, c.lifetime, Lifetime { remaining: rng.gen_range(0.5..4.0) })
                .unwrap();
        }
    }

    let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();
    tick_loop.add_system(LifetimeSystem::new(&c)).unwrap();
    tick_loop.add_system(HealthRegenSystem::new(&c, 7.5)).unwrap();
    tick_loop.add_system(MovementSystem::new(&c)).unwrap();
    tick_loop
}

fn final_hash(seed: u64) -> (String, usize) {
    let mut tick_loop = build(seed);
    tick_loop.run_ticks(TICKS).unwrap();
    let world = tick_loop.world();
    (world.state_hash().unwrap(), world.entity_count())
}

#[test]
fn same_seed_same_hash() {
    let (first, alive) = final_hash(42);
    let (second, _) = final_hash(42);
    assert_eq!(first, second);
    // Every third entity had a lifetime of at most 4s, and 300 ticks is 5s.
    assert_eq!(alive, ENTITIES - ENTITIES.div_ceil(3));
}

#[test]
fn different_seed_different_hash() {
    assert_ne!(final_hash(1).0, final_hash(2).0);
}

#[test]
fn advance_and_run_ticks_agree() {
    let mut stepped = build(7);
    stepped.run_ticks(60).unwrap();

    let mut framed = build(7);
    // 60 frames of exactly one tick each.
    for _ in 0..60 {
        framed.advance(framed.fixed_dt()).unwrap();
    }

    assert_eq!(stepped.tick_count(), framed.tick_count());
    assert_eq!(
        stepped.world().state_hash().unwrap(),
        framed.world().state_hash().unwrap()
    );
}
