//! Simulation benchmarks for fleet_core.
//!
//! Run with: `cargo bench -p fleet_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use fleet_core::ai::{create_controller, AiKind};
use fleet_core::battle::Battle;
use fleet_core::config::TICK_DELTA;
use fleet_core::unit::{UnitKind, ENEMY_TEAM, PLAYER_TEAM};
use fleet_core::world::World;
use fleet_test_utils::fixtures::{vec2, WorldBuilder};

/// Two fleets of `per_side` mixed hulls facing each other across the map.
fn fleets(per_side: i32) -> World {
    let kinds = [
        UnitKind::Fighter,
        UnitKind::Heavy,
        UnitKind::Bomber,
        UnitKind::Interceptor,
        UnitKind::Repair,
    ];
    let mut builder = WorldBuilder::new(7)
        .unit(UnitKind::Mothership, PLAYER_TEAM, vec2(1200, 2200))
        .unit(UnitKind::Mothership, ENEMY_TEAM, vec2(1200, 200));
    for i in 0..per_side {
        let kind = kinds[i as usize % kinds.len()];
        let x = 300 + (i % 20) * 90;
        let row = i / 20;
        builder = builder
            .unit(kind, PLAYER_TEAM, vec2(x, 1700 - row * 60))
            .unit(kind, ENEMY_TEAM, vec2(x, 700 + row * 60));
    }
    builder.build()
}

fn battle(per_side: i32, ai: AiKind) -> Battle {
    let mut battle = Battle::new(fleets(per_side));
    battle.add_controller(create_controller(ai, ENEMY_TEAM));
    battle.add_controller(create_controller(AiKind::Advanced, PLAYER_TEAM));
    battle
}

/// Runs simulation benchmarks for the fleet_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("world_tick_40v40", |b| {
        b.iter_batched(
            || fleets(40),
            |mut world| {
                for _ in 0..60 {
                    world.tick(TICK_DELTA);
                }
                black_box(world.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    let mut group = c.benchmark_group("battle_second");
    for ai in [AiKind::Simple, AiKind::Elite, AiKind::Nightmare, AiKind::Dogfight] {
        group.bench_function(ai.as_str(), |b| {
            b.iter_batched(
                || battle(40, ai),
                |mut battle| {
                    for _ in 0..60 {
                        battle.tick();
                    }
                    black_box(battle.world().state_hash())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
