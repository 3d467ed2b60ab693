//! Demon tier: predictive hunters.
//!
//! All three kinds run every tick and share a [`PositionMemory`] of enemy
//! movement.
//!
//! - **Demon** scores prey with [`hunter_score`] and closes through the
//!   point the prey is predicted to reach 0.8s ahead.
//! - **Nightmare** additionally splits its fleet into hunting packs. Enemies
//!   are ranked by value and each gets a quota of hunters, topped up with
//!   the nearest free ones as members fall. A pack of two or more spreads
//!   evenly on a 120-unit ring around its prey before committing.
//! - **Apocalypse** sends everything at the single most valuable enemy.

use std::collections::BTreeMap;

use crate::math::{fixed_int, fixed_ratio, tau, Fixed, Vec2Fixed};
use crate::unit::{TeamId, Unit, UnitId, UnitKind, UnitState};
use crate::world::World;

use super::memory::PositionMemory;
use super::scoring::{hunter_score, pick_max};
use super::{on_supply_run, send_home, try_skill, AiController, AiKind, Roster};

/// How far ahead prey movement is extrapolated, in seconds.
pub const PREDICTION_HORIZON: Fixed = fixed_ratio(4, 5);

/// Distance from the prey at which pack members take station.
pub const SURROUND_RADIUS: Fixed = fixed_int(120);

/// How close to its station a pack member must be before attacking.
pub const STATION_TOLERANCE: Fixed = fixed_int(30);

/// Hunters assigned to a prey of `kind`.
#[must_use]
pub const fn pack_quota(kind: UnitKind) -> usize {
    match kind {
        UnitKind::Mothership => 4,
        UnitKind::Heavy => 3,
        _ => 2,
    }
}

/// Value of a prey when forming packs: hull class plus a bonus for damage
/// already taken.
#[must_use]
pub fn hunt_priority(prey: &Unit) -> Fixed {
    let class = match prey.kind {
        UnitKind::Mothership => fixed_int(1000),
        UnitKind::Repair => fixed_int(800),
        UnitKind::Heavy => fixed_int(600),
        _ => fixed_int(400),
    };
    class + (Fixed::ONE - prey.hp_ratio()) * fixed_int(500)
}

/// Station `index` of `size` around `center`.
#[must_use]
pub fn surround_point(center: Vec2Fixed, index: usize, size: usize) -> Vec2Fixed {
    let angle = tau() * Fixed::from_num(index) / Fixed::from_num(size.max(1));
    center + Vec2Fixed::from_angle(angle).scale(SURROUND_RADIUS)
}

/// Demon-tier controller.
#[derive(Debug, Clone)]
pub struct DemonAi {
    kind: AiKind,
    team: TeamId,
    memory: PositionMemory,
    packs: BTreeMap<UnitId, Vec<UnitId>>,
}

impl DemonAi {
    /// Controller of `kind` (demon, nightmare or apocalypse) for `team`.
    #[must_use]
    pub fn new(kind: AiKind, team: TeamId) -> Self {
        Self {
            kind,
            team,
            memory: PositionMemory::new(),
            packs: BTreeMap::new(),
        }
    }

    /// Hunters currently assigned to `prey`, in station order.
    #[must_use]
    pub fn pack(&self, prey: UnitId) -> &[UnitId] {
        self.packs.get(&prey).map_or(&[][..], Vec::as_slice)
    }

    /// Prey `hunter` is assigned to, if any.
    #[must_use]
    pub fn assignment(&self, hunter: UnitId) -> Option<UnitId> {
        self.packs
            .iter()
            .find(|(_, pack)| pack.contains(&hunter))
            .map(|(&prey, _)| prey)
    }

    fn observe(&mut self, world: &World) {
        let now = world.elapsed();
        self.memory
            .observe(now, world.enemy_units(self.team).map(|u| (u.id, u.position)));
    }

    /// Attack `prey`, through its predicted position when that is closer.
    fn strike(&self, world: &mut World, id: UnitId, prey: UnitId) {
        let (Some(from), Some(at)) = (
            world.live_unit(id).map(|u| u.position),
            world.live_unit(prey).map(|u| u.position),
        ) else {
            return;
        };
        let predicted = self.memory.predict(prey, at, PREDICTION_HORIZON);
        if predicted != at && from.distance(predicted) < from.distance(at) {
            world.order_attack_via(id, prey, Some(predicted));
        } else {
            world.order_attack(id, prey);
        }
    }

    fn hunt(&self, world: &mut World, id: UnitId, enemies: &[UnitId]) {
        if let Some(prey) = pick_max(enemies, |e| hunter_score(world, id, e)) {
            self.strike(world, id, prey);
        }
    }

    fn update_demon(&mut self, world: &mut World, roster: &Roster) {
        for &id in &roster.mine {
            let Some((energy, hp_ratio, max_sp)) = world.live_unit(id).map(|u| (u.energy, u.hp_ratio(), u.max_sp))
            else {
                continue;
            };
            if energy <= Fixed::ZERO && hp_ratio <= fixed_ratio(1, 10) {
                send_home(world, id);
                continue;
            }
            if on_supply_run(world, id) {
                continue;
            }
            try_skill(world, id, max_sp * fixed_ratio(3, 20));
            self.hunt(world, id, &roster.enemies);
        }
    }

    /// Reassign every free hunter to packs, most valuable prey first.
    fn rebuild_packs(&mut self, world: &World, roster: &Roster) {
        let mut free: Vec<UnitId> = roster
            .mine
            .iter()
            .copied()
            .filter(|&id| {
                world
                    .live_unit(id)
                    .is_some_and(|u| u.kind != UnitKind::Mothership && u.can_attack())
                    && !on_supply_run(world, id)
            })
            .collect();

        let mut prey: Vec<(Fixed, UnitId, Vec2Fixed, UnitKind)> = roster
            .enemies
            .iter()
            .filter_map(|&e| world.live_unit(e))
            .map(|u| (hunt_priority(u), u.id, u.position, u.kind))
            .collect();
        prey.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut packs = BTreeMap::new();
        for (_, target, position, kind) in prey {
            if free.is_empty() {
                break;
            }
            // Surviving members keep their station index.
            let mut pack: Vec<UnitId> = self
                .pack(target)
                .iter()
                .copied()
                .filter(|h| free.contains(h))
                .take(pack_quota(kind))
                .collect();
            free.retain(|h| !pack.contains(h));
            while pack.len() < pack_quota(kind) {
                let Some(index) = free
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &h)| world.unit(h).map(|u| (i, u.position.distance_squared(position), h)))
                    .min_by_key(|&(_, d, h)| (d, h))
                    .map(|(i, _, _)| i)
                else {
                    break;
                };
                pack.push(free.remove(index));
            }
            packs.insert(target, pack);
        }

        if packs != self.packs {
            tracing::debug!(team = self.team, packs = packs.len(), "hunting packs reassigned");
            self.packs = packs;
        }
    }

    fn update_nightmare(&mut self, world: &mut World, roster: &Roster) {
        self.rebuild_packs(world, roster);
        for &id in &roster.mine {
            let Some((energy, hp_ratio, max_sp)) = world.live_unit(id).map(|u| (u.energy, u.hp_ratio(), u.max_sp))
            else {
                continue;
            };
            if energy <= Fixed::ZERO && hp_ratio <= fixed_ratio(1, 20) {
                send_home(world, id);
                continue;
            }
            if on_supply_run(world, id) {
                continue;
            }
            try_skill(world, id, max_sp * fixed_ratio(1, 10));

            let Some(prey) = self.assignment(id) else {
                self.hunt(world, id, &roster.enemies);
                continue;
            };
            let pack = self.pack(prey);
            if pack.len() <= 1 {
                world.order_attack(id, prey);
                continue;
            }
            let engaged = world.unit(id).is_some_and(|u| {
                matches!(u.state, UnitState::Attacking | UnitState::CircleStrafing) && u.attack_target == Some(prey)
            });
            if engaged {
                continue;
            }
            let (Some(center), Some(index)) = (
                world.live_unit(prey).map(|u| u.position),
                pack.iter().position(|&h| h == id),
            ) else {
                continue;
            };
            let station = surround_point(center, index, pack.len());
            let distance = world.unit(id).map_or(Fixed::MAX, |u| u.position.distance(station));
            if distance > STATION_TOLERANCE {
                world.order_move(id, station);
            } else {
                world.order_attack(id, prey);
            }
        }
    }

    fn update_apocalypse(&mut self, world: &mut World, roster: &Roster) {
        let prey = pick_max(&roster.enemies, |e| {
            world
                .unit(e)
                .map_or(Fixed::ZERO, |u| u.max_hp + u.attack_damage * 10)
        });
        for &id in &roster.mine {
            let Some(hp) = world.live_unit(id).map(|u| u.hp) else {
                continue;
            };
            if hp <= Fixed::ONE {
                send_home(world, id);
                continue;
            }
            if on_supply_run(world, id) {
                continue;
            }
            try_skill(world, id, Fixed::ONE);
            if let Some(prey) = prey {
                world.order_attack(id, prey);
            }
        }
    }
}

impl AiController for DemonAi {
    fn kind(&self) -> AiKind {
        self.kind
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn update(&mut self, world: &mut World, _dt: Fixed) {
        self.observe(world);
        let roster = Roster::of(world, self.team);
        match self.kind {
            AiKind::Nightmare => self.update_nightmare(world, &roster),
            AiKind::Apocalypse => self.update_apocalypse(world, &roster),
            _ => self.update_demon(world, &roster),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TICK_DELTA;
    use crate::data::UnitTemplate;
    use crate::unit::{ENEMY_TEAM, PLAYER_TEAM};

    fn spawn(world: &mut World, kind: UnitKind, team: TeamId, x: i32, y: i32) -> UnitId {
        let template = UnitTemplate::new(kind, 100, 60).with_attack(10, 200, 1);
        world.spawn_unit(&template, team, Vec2Fixed::from_ints(x, y))
    }

    #[test]
    fn test_quotas_and_priorities() {
        assert_eq!(pack_quota(UnitKind::Mothership), 4);
        assert_eq!(pack_quota(UnitKind::Heavy), 3);
        assert_eq!(pack_quota(UnitKind::Repair), 2);
        assert_eq!(pack_quota(UnitKind::Fighter), 2);

        let mut world = World::new(5);
        let medic = spawn(&mut world, UnitKind::Repair, PLAYER_TEAM, 0, 0);
        let heavy = spawn(&mut world, UnitKind::Heavy, PLAYER_TEAM, 100, 0);
        world.unit_mut(heavy).unwrap().hp = Fixed::from_num(10);
        // 600 + 450 beats a healthy repair craft's 800.
        assert!(hunt_priority(world.unit(heavy).unwrap()) > hunt_priority(world.unit(medic).unwrap()));
    }

    #[test]
    fn test_nightmare_assigns_four_to_a_mothership() {
        let mut world = World::new(5);
        let mother = world.spawn_unit(
            &UnitTemplate::new(UnitKind::Mothership, 2000, 10),
            PLAYER_TEAM,
            Vec2Fixed::from_ints(0, 0),
        );
        let hunters: Vec<UnitId> = (0..5)
            .map(|i| spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, i * 60 - 120, 600))
            .collect();

        let mut ai = DemonAi::new(AiKind::Nightmare, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);

        let pack = ai.pack(mother).to_vec();
        assert_eq!(pack.len(), 4);
        let spare: Vec<UnitId> = hunters.iter().copied().filter(|h| !pack.contains(h)).collect();
        assert_eq!(spare.len(), 1);
        assert_eq!(ai.assignment(spare[0]), None);
        assert_eq!(world.unit(spare[0]).unwrap().attack_target, Some(mother));

        let stations: Vec<Vec2Fixed> = pack
            .iter()
            .map(|&h| {
                let unit = world.unit(h).unwrap();
                assert_eq!(unit.state, UnitState::Moving);
                unit.target_pos.unwrap()
            })
            .collect();
        for (i, station) in stations.iter().enumerate() {
            assert!((station.length() - SURROUND_RADIUS).abs() < fixed_ratio(1, 10));
            let next = stations[(i + 1) % stations.len()];
            // Quarter turns on a 120 ring are ~169.7 apart.
            let gap = station.distance(next);
            assert!(gap > fixed_int(168) && gap < fixed_int(171), "gap {gap}");
        }
    }

    #[test]
    fn test_nightmare_packs_keep_members_until_they_fall() {
        let mut world = World::new(5);
        let prey = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 0);
        let first = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 300);
        let second = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, -300);
        let late = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 900, 0);

        let mut ai = DemonAi::new(AiKind::Nightmare, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(ai.pack(prey), &[first, second]);

        world.unit_mut(late).unwrap().position = Vec2Fixed::from_ints(50, 0);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(ai.pack(prey), &[first, second]);

        world.apply_damage(None, first, Fixed::from_num(1000));
        world.prune_dead();
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(ai.pack(prey), &[second, late]);
    }

    #[test]
    fn test_nightmare_packs_only_armed_escorts() {
        let mut world = World::new(5);
        let prey = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 0);
        let home = spawn(&mut world, UnitKind::Mothership, ENEMY_TEAM, 0, 100);
        let medic = spawn(&mut world, UnitKind::Repair, ENEMY_TEAM, 0, 50);
        let hunter = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 600);

        let mut ai = DemonAi::new(AiKind::Nightmare, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(ai.pack(prey), &[hunter]);
        assert_eq!(ai.assignment(home), None);
        assert_eq!(ai.assignment(medic), None);
    }

    #[test]
    fn test_nightmare_lone_hunter_attacks_directly() {
        let mut world = World::new(5);
        let prey = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 0);
        let hunter = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 600);
        let mut ai = DemonAi::new(AiKind::Nightmare, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(ai.pack(prey), &[hunter]);
        assert_eq!(world.unit(hunter).unwrap().state, UnitState::Attacking);
    }

    #[test]
    fn test_demon_leads_approaching_prey() {
        let mut world = World::new(5);
        let hunter = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 0);
        let prey = spawn(&mut world, UnitKind::Heavy, PLAYER_TEAM, 800, 0);
        world.order_move(prey, Vec2Fixed::from_ints(-1000, 0));

        let mut ai = DemonAi::new(AiKind::Demon, ENEMY_TEAM);
        for _ in 0..6 {
            ai.update(&mut world, TICK_DELTA);
            world.tick(TICK_DELTA);
        }
        ai.update(&mut world, TICK_DELTA);

        let chaser = world.unit(hunter).unwrap();
        assert_eq!(chaser.attack_target, Some(prey));
        let intercept = chaser.target_pos.expect("intercept point");
        assert!(intercept.x < world.unit(prey).unwrap().position.x);
    }

    #[test]
    fn test_apocalypse_focuses_the_biggest_hull() {
        let mut world = World::new(5);
        let a = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let b = spawn(&mut world, UnitKind::Bomber, ENEMY_TEAM, 100, 0);
        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 300);
        let capital = world.spawn_unit(
            &UnitTemplate::new(UnitKind::Mothership, 2000, 10),
            PLAYER_TEAM,
            Vec2Fixed::from_ints(0, 1500),
        );
        let mut ai = DemonAi::new(AiKind::Apocalypse, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.unit(a).unwrap().attack_target, Some(capital));
        assert_eq!(world.unit(b).unwrap().attack_target, Some(capital));
    }

    #[test]
    fn test_apocalypse_skill_still_needs_a_full_bar() {
        use crate::skills::{SkillKind, SkillSpec};

        let mut world = World::new(5);
        let template = UnitTemplate::new(UnitKind::Heavy, 100, 60)
            .with_attack(10, 200, 1)
            .with_skill(SkillSpec::new(SkillKind::DamageAoe));
        let caster = world.spawn_unit(&template, ENEMY_TEAM, Vec2Fixed::ZERO);
        let victim = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 150);
        world.unit_mut(caster).unwrap().sp = Fixed::from_num(2);

        let mut ai = DemonAi::new(AiKind::Apocalypse, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.unit(caster).unwrap().sp, Fixed::from_num(2));
        assert_eq!(world.unit(victim).unwrap().hp, Fixed::from_num(100));
        assert!(world.events().skills_fired.is_empty());

        {
            let unit = world.unit_mut(caster).unwrap();
            unit.sp = unit.max_sp;
        }
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.events().skills_fired, vec![(caster, SkillKind::DamageAoe)]);
    }
}
