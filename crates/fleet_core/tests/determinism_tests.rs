//! Whole-battle determinism tests.
//!
//! Levels are loaded from RON and replayed with every controller kind.

use fleet_core::ai::AiKind;
use fleet_core::battle::Battle;
use fleet_core::data::LevelData;
use fleet_core::math::Fixed;
use fleet_test_utils::determinism::{find_first_divergence, run_parallel, verify_replay, verify_snapshot_determinism};

const LEVEL: &str = r#"(
    name: "Crossfire",
    ai_kind: "elite",
    units: {
        "carrier": (kind: mothership, max_hp: 1500, speed: 30, attack_damage: 25, attack_range: 300,
                    attack_cooldown: 2.0, radius: 40, max_energy: 500),
        "lancer": (kind: fighter, max_hp: 90, speed: 140, attack_damage: 9, attack_range: 150,
                   skill: Some((kind: buff_speed))),
        "warden": (kind: heavy, max_hp: 320, speed: 50, attack_damage: 22, attack_range: 200,
                   attack_cooldown: 2.0, attack_type: beam, skill: Some((kind: shield))),
        "mender": (kind: repair, max_hp: 120, speed: 90, repair_rate: 12.5,
                   skill: Some((kind: heal_aoe))),
        "mortar": (kind: bomber, max_hp: 160, speed: 70, attack_damage: 30, attack_range: 260,
                   attack_cooldown: 3.0, attack_type: artillery, splash_radius: 60),
    },
    player_units: [
        (unit_id: "carrier", position: (1200, 2100)),
        (unit_id: "lancer", position: (1000, 1900)),
        (unit_id: "lancer", position: (1400, 1900)),
        (unit_id: "warden", position: (1200, 1850)),
        (unit_id: "mender", position: (1250, 2000)),
    ],
    enemy_units: [
        (unit_id: "carrier", position: (1200, 300)),
        (unit_id: "lancer", position: (1000, 500)),
        (unit_id: "mortar", position: (1400, 500)),
        (unit_id: "warden", position: (1200, 550)),
        (unit_id: "mender", position: (1150, 400)),
    ],
    victory_conditions: (eliminate_mothership: true),
    defeat_conditions: (lose_mothership: true, time_limit: Some(90.0)),
    terrain: Generated(seed: 3),
    seed: 17,
)"#;

fn level_with(ai: AiKind) -> LevelData {
    let mut level = LevelData::load_str(LEVEL, "crossfire.ron").expect("level parses");
    level.ai_kind = ai.to_string();
    level
}

fn battle(ai: AiKind) -> Battle {
    Battle::from_level(&level_with(ai)).expect("battle builds")
}

#[test]
fn every_controller_replays_identically() {
    for kind in AiKind::ALL {
        let result = verify_replay(|| battle(kind), 600);
        assert!(result.is_deterministic, "{kind} diverged: {:?}", result.hashes);
    }
}

#[test]
fn ai_mirror_match_never_diverges() {
    let setup = || {
        let mut level = level_with(AiKind::Nightmare);
        level.additional_ais.push(fleet_core::data::AiAssignment {
            kind: "advanced".to_string(),
            team: fleet_core::unit::PLAYER_TEAM,
        });
        Battle::from_level(&level).expect("battle builds")
    };
    assert_eq!(find_first_divergence(setup, 900), None);
}

#[test]
fn threads_agree_on_final_state() {
    run_parallel(|| battle(AiKind::Demon), 4, 600).assert_deterministic();
}

#[test]
fn full_runs_reach_the_same_verdict_and_stats() {
    let mut first = battle(AiKind::Terminator);
    let mut second = battle(AiKind::Terminator);
    let limit = Fixed::from_num(120);

    assert_eq!(first.run(limit), second.run(limit));
    assert!(first.is_over());
    assert_eq!(first.world().tick_count(), second.world().tick_count());
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn seed_override_is_reproducible() {
    let level = level_with(AiKind::Simple);
    let a = Battle::from_level_seeded(&level, 1).unwrap();
    let b = Battle::from_level_seeded(&level, 1).unwrap();
    assert_eq!(a.world().state_hash(), b.world().state_hash());
    assert_eq!(a.world().units(), b.world().units());
}

#[test]
fn mid_battle_snapshot_resumes_in_lockstep() {
    let world = battle(AiKind::Simple).world().clone();
    assert!(verify_snapshot_determinism(world, 300, 300));
}
