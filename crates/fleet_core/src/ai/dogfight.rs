//! Dogfight tier: close-range variants that act every tick.

use crate::math::{fixed_int, fixed_ratio, Fixed};
use crate::unit::{TeamId, UnitId};
use crate::world::World;

use super::memory::PositionMemory;
use super::scoring::{nearest, pick_max};
use super::{on_supply_run, send_home, try_skill, AiController, AiKind, Roster};

/// Lead time used when pursuing distant prey, in seconds.
pub const PURSUIT_LEAD: Fixed = fixed_ratio(1, 2);

/// Preference of `unit` for dogfighting `target`: close, weakened, hard
/// hitting and fast prey first.
#[must_use]
pub fn dogfight_score(world: &World, unit: UnitId, target: UnitId) -> Fixed {
    let (Some(me), Some(enemy)) = (world.live_unit(unit), world.live_unit(target)) else {
        return Fixed::ZERO;
    };
    let distance = me.position.distance(enemy.position);
    let mut score = fixed_int(1000) + (fixed_int(500) - distance).max(Fixed::ZERO);
    if enemy.hp_ratio() < fixed_ratio(2, 5) {
        score += fixed_int(300);
    }
    score + enemy.attack_damage * 5 + enemy.speed * 2
}

/// Dogfight-tier controller.
#[derive(Debug, Clone)]
pub struct DogfightAi {
    kind: AiKind,
    team: TeamId,
    memory: PositionMemory,
}

impl DogfightAi {
    /// Controller of `kind` (dogfight, blitzkrieg or kamikaze) for `team`.
    #[must_use]
    pub fn new(kind: AiKind, team: TeamId) -> Self {
        Self {
            kind,
            team,
            memory: PositionMemory::new(),
        }
    }

    fn should_retreat(&self, world: &World, id: UnitId) -> bool {
        let Some(unit) = world.live_unit(id) else {
            return false;
        };
        match self.kind {
            AiKind::Blitzkrieg => unit.energy < fixed_ratio(1, 2),
            AiKind::Kamikaze => unit.energy <= Fixed::ZERO && unit.hp_ratio() < fixed_ratio(1, 10),
            _ => unit.energy < Fixed::ONE,
        }
    }

    /// Fraction of the bar at which this kind fires its skill.
    fn skill_floor(&self) -> Fixed {
        match self.kind {
            AiKind::Blitzkrieg => fixed_ratio(1, 5),
            AiKind::Kamikaze => fixed_ratio(1, 10),
            _ => fixed_ratio(3, 10),
        }
    }

    fn choose(&self, world: &World, id: UnitId, enemies: &[UnitId]) -> Option<UnitId> {
        match self.kind {
            AiKind::Blitzkrieg => nearest(world, id, enemies),
            AiKind::Kamikaze => pick_max(enemies, |e| {
                world
                    .unit(e)
                    .map_or(Fixed::ZERO, |u| u.hp + u.attack_damage)
            }),
            _ => pick_max(enemies, |e| dogfight_score(world, id, e)),
        }
    }

    /// Engage `target`. Dogfighters lead prey well outside gun range;
    /// blitzkrieg flies straight at the prey's current coordinates.
    fn engage(&self, world: &mut World, id: UnitId, target: UnitId) {
        let (Some((from, range)), Some(at)) = (
            world.live_unit(id).map(|u| (u.position, u.attack_range)),
            world.live_unit(target).map(|u| u.position),
        ) else {
            return;
        };
        match self.kind {
            AiKind::Blitzkrieg => {
                world.order_attack_via(id, target, Some(at));
            }
            AiKind::Dogfight if from.distance(at) > range * fixed_ratio(3, 2) => {
                let lead = self.memory.predict(target, at, PURSUIT_LEAD);
                world.order_attack_via(id, target, Some(lead));
            }
            _ => {
                world.order_attack(id, target);
            }
        }
    }
}

impl AiController for DogfightAi {
    fn kind(&self) -> AiKind {
        self.kind
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn update(&mut self, world: &mut World, _dt: Fixed) {
        if self.kind == AiKind::Dogfight {
            let now = world.elapsed();
            self.memory
                .observe(now, world.enemy_units(self.team).map(|u| (u.id, u.position)));
        }
        let roster = Roster::of(world, self.team);
        let floor = self.skill_floor();
        for &id in &roster.mine {
            if self.should_retreat(world, id) {
                send_home(world, id);
                continue;
            }
            if on_supply_run(world, id) {
                continue;
            }
            if let Some(max_sp) = world.unit(id).map(|u| u.max_sp) {
                try_skill(world, id, max_sp * floor);
            }
            if let Some(target) = self.choose(world, id, &roster.enemies) {
                self.engage(world, id, target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TICK_DELTA;
    use crate::data::UnitTemplate;
    use crate::math::Vec2Fixed;
    use crate::skills::{SkillKind, SkillSpec};
    use crate::unit::{UnitKind, UnitState, ENEMY_TEAM, PLAYER_TEAM};

    fn spawn(world: &mut World, kind: UnitKind, team: TeamId, x: i32, y: i32) -> UnitId {
        let template = UnitTemplate::new(kind, 100, 60).with_attack(10, 200, 1);
        world.spawn_unit(&template, team, Vec2Fixed::from_ints(x, y))
    }

    #[test]
    fn test_dogfight_prefers_close_wounded_prey() {
        let mut world = World::new(9);
        let ace = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 450, 0);
        let cripple = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 150, 0);
        world.unit_mut(cripple).unwrap().hp = Fixed::from_num(30);

        let mut ai = DogfightAi::new(AiKind::Dogfight, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        let unit = world.unit(ace).unwrap();
        assert_eq!(unit.attack_target, Some(cripple));
        assert_eq!(unit.target_pos, None);
    }

    #[test]
    fn test_dogfight_leads_distant_prey() {
        let mut world = World::new(9);
        let ace = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let prey = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 900, 0);
        let mut ai = DogfightAi::new(AiKind::Dogfight, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        let unit = world.unit(ace).unwrap();
        assert_eq!(unit.attack_target, Some(prey));
        assert_eq!(unit.target_pos, Some(Vec2Fixed::from_ints(900, 0)));
    }

    #[test]
    fn test_blitzkrieg_charges_the_nearest() {
        let mut world = World::new(9);
        let a = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 0);
        let near = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 300);
        spawn(&mut world, UnitKind::Mothership, PLAYER_TEAM, 0, 900);
        let mut ai = DogfightAi::new(AiKind::Blitzkrieg, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        let unit = world.unit(a).unwrap();
        assert_eq!(unit.attack_target, Some(near));
        assert_eq!(unit.target_pos, Some(Vec2Fixed::from_ints(0, 300)));
    }

    #[test]
    fn test_kamikaze_waits_for_full_bar_and_never_retreats_with_energy() {
        let mut world = World::new(9);
        world.spawn_unit(
            &UnitTemplate::new(UnitKind::Mothership, 2000, 10),
            ENEMY_TEAM,
            Vec2Fixed::from_ints(0, -800),
        );
        let template = UnitTemplate::new(UnitKind::Heavy, 100, 60)
            .with_attack(10, 200, 1)
            .with_skill(SkillSpec::new(SkillKind::BuffAttack));
        let diver = world.spawn_unit(&template, ENEMY_TEAM, Vec2Fixed::ZERO);
        let brute = spawn(&mut world, UnitKind::Heavy, PLAYER_TEAM, 0, 600);
        {
            let unit = world.unit_mut(diver).unwrap();
            unit.hp = Fixed::from_num(5);
            unit.energy = Fixed::from_num(1);
            unit.sp = unit.max_sp * fixed_ratio(1, 5);
        }

        let mut ai = DogfightAi::new(AiKind::Kamikaze, ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        let unit = world.unit(diver).unwrap();
        assert_eq!(unit.state, UnitState::Attacking);
        assert_eq!(unit.attack_target, Some(brute));
        assert_eq!(unit.sp, unit.max_sp * fixed_ratio(1, 5));
        assert!(world.events().skills_fired.is_empty());

        {
            let unit = world.unit_mut(diver).unwrap();
            unit.sp = unit.max_sp;
        }
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.unit(diver).unwrap().sp, Fixed::ZERO);
        assert_eq!(world.events().skills_fired, vec![(diver, SkillKind::BuffAttack)]);
    }
}
