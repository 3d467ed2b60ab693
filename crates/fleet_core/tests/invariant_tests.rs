//! Property tests for unit and world invariants.

use fleet_core::commands::Command;
use fleet_core::config::TICK_DELTA;
use fleet_core::math::{Fixed, Vec2Fixed};
use fleet_core::unit::{BuffKind, Unit, UnitId, UnitKind, UnitState, ENEMY_TEAM, PLAYER_TEAM};
use fleet_core::world::World;
use fleet_test_utils::determinism::verify_determinism;
use fleet_test_utils::fixtures::{template_for, vec2, WorldBuilder};
use fleet_test_utils::strategies::{arb_amount, arb_duration, arb_order_script, arb_unit_kind};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Poke {
    Damage(Fixed),
    Heal(Fixed),
    Drain(Fixed),
    Recharge(Fixed),
    Charge(Fixed),
    Shield(Fixed),
    Haste(Fixed),
    Wait(Fixed),
}

fn arb_poke() -> impl Strategy<Value = Poke> {
    prop_oneof![
        arb_amount().prop_map(Poke::Damage),
        arb_amount().prop_map(Poke::Heal),
        arb_amount().prop_map(Poke::Drain),
        arb_amount().prop_map(Poke::Recharge),
        arb_amount().prop_map(Poke::Charge),
        arb_amount().prop_map(Poke::Shield),
        arb_duration().prop_map(Poke::Haste),
        arb_duration().prop_map(Poke::Wait),
    ]
}

fn apply(unit: &mut Unit, poke: &Poke) {
    match *poke {
        Poke::Damage(amount) => {
            unit.take_damage(amount);
        }
        Poke::Heal(amount) => {
            unit.heal(amount);
        }
        Poke::Drain(amount) => unit.spend_energy(amount),
        Poke::Recharge(amount) => unit.restore_energy(amount),
        Poke::Charge(amount) => unit.gain_sp(amount),
        Poke::Shield(amount) => unit.apply_shield(amount, Fixed::from_num(3)),
        Poke::Haste(duration) => unit.apply_buff(BuffKind::Speed, Fixed::from_num(2), duration),
        Poke::Wait(dt) => unit.tick_timers(dt),
    }
}

fn assert_bounded(unit: &Unit) {
    assert!(unit.hp >= Fixed::ZERO && unit.hp <= unit.max_hp, "hp {}", unit.hp);
    assert!(unit.energy >= Fixed::ZERO && unit.energy <= unit.max_energy, "energy {}", unit.energy);
    assert!(unit.sp >= Fixed::ZERO && unit.sp <= unit.max_sp, "sp {}", unit.sp);
    assert!(unit.shield >= Fixed::ZERO);
}

fn skirmish() -> World {
    WorldBuilder::new(99)
        .unit(UnitKind::Mothership, PLAYER_TEAM, vec2(300, 1200))
        .unit(UnitKind::Fighter, PLAYER_TEAM, vec2(500, 1100))
        .unit(UnitKind::Repair, PLAYER_TEAM, vec2(450, 1300))
        .unit(UnitKind::Mothership, ENEMY_TEAM, vec2(2100, 1200))
        .unit(UnitKind::Bomber, ENEMY_TEAM, vec2(900, 1200))
        .unit(UnitKind::Interceptor, ENEMY_TEAM, vec2(800, 1000))
        .build()
}

fn play(world: &mut World, script: &[(u64, UnitId, Command)], ticks: u64) {
    let mut pending = script.iter().peekable();
    for tick in 0..ticks {
        while let Some((_, unit, command)) = pending.next_if(|(at, _, _)| *at == tick) {
            // Ids in the script may have been pruned already.
            let _ = world.issue_command(&[*unit], *command);
        }
        world.tick(TICK_DELTA);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn unit_meters_stay_in_bounds(kind in arb_unit_kind(), pokes in proptest::collection::vec(arb_poke(), 1..40)) {
        let mut unit = Unit::from_template(1, ENEMY_TEAM, Vec2Fixed::ZERO, &template_for(kind));
        let mut died = false;
        for poke in &pokes {
            apply(&mut unit, poke);
            assert_bounded(&unit);
            if died {
                prop_assert_eq!(unit.state, UnitState::Dead);
                prop_assert_eq!(unit.hp, Fixed::ZERO);
            }
            died |= unit.state == UnitState::Dead;
            prop_assert_eq!(died, unit.hp == Fixed::ZERO);
        }
    }

    #[test]
    fn scripted_battles_keep_invariants(script in arb_order_script(6, 240, 30)) {
        let mut world = skirmish();
        let mut pending = script.iter().peekable();
        for tick in 0..300u64 {
            while let Some((_, unit, command)) = pending.next_if(|(at, _, _)| *at == tick) {
                let _ = world.issue_command(&[*unit], *command);
            }
            world.tick(TICK_DELTA);
            for unit in world.units() {
                assert_bounded(unit);
                prop_assert_ne!(unit.state, UnitState::Dead);
            }
        }
    }

    #[test]
    fn scripted_battles_replay_exactly(script in arb_order_script(6, 180, 20)) {
        let result = verify_determinism(
            2,
            1,
            skirmish,
            |world| play(world, &script, 240),
            World::state_hash,
        );
        prop_assert!(result.is_deterministic, "hashes {:?}", result.hashes);
    }
}
