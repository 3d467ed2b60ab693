//! Elite tier: named strategies at a 0.05s cadence, plus the terminator.

use crate::math::{fixed_int, fixed_ratio, Fixed};
use crate::unit::{TeamId, UnitId, UnitKind};
use crate::world::World;

use super::basic::{energy_below, is_mothership, split_roles};
use super::improved::ThreatCache;
use super::scoring::{
    best_target, better_target, detailed_strength, escorts, pick_max, skill_is_useful_strict, strength_ratio,
    target_score, terminator_priority, ThreatMap,
};
use super::{on_supply_run, send_home, try_skill, AiController, AiKind, Cadence, Roster};

/// Seconds between order passes.
pub const COMMAND_INTERVAL: Fixed = fixed_ratio(1, 20);

/// Seconds between strategy reviews.
pub const STRATEGY_INTERVAL: Fixed = fixed_int(1);

/// Seconds between micro-management passes.
pub const MICRO_INTERVAL: Fixed = fixed_ratio(3, 100);

/// Units below this energy are sent home by micro-management.
pub const RETREAT_ENERGY: Fixed = fixed_int(40);

/// Named elite strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EliteStrategy {
    /// Everything charged goes in.
    OverwhelmingAssault,
    /// Combat hulls attack together.
    CoordinatedAttack,
    /// Pick off isolated enemies, retreat early.
    GuerrillaTactics,
    /// Weighted targeting with early retreat.
    AdaptivePressure,
}

impl EliteStrategy {
    /// Strategy for a detailed strength ratio.
    #[must_use]
    pub fn for_ratio(ratio: Fixed) -> Self {
        if ratio > fixed_ratio(6, 5) {
            Self::OverwhelmingAssault
        } else if ratio > Fixed::ONE {
            Self::CoordinatedAttack
        } else if ratio < fixed_ratio(4, 5) {
            Self::GuerrillaTactics
        } else {
            Self::AdaptivePressure
        }
    }
}

/// Elite controller.
#[derive(Debug, Clone)]
pub struct EliteAi {
    team: TeamId,
    strategy: EliteStrategy,
    command: Cadence,
    review: Cadence,
    micro: Cadence,
    threats: ThreatCache,
}

impl EliteAi {
    /// Controller for `team`, starting on adaptive pressure.
    #[must_use]
    pub fn new(team: TeamId) -> Self {
        Self {
            team,
            strategy: EliteStrategy::AdaptivePressure,
            command: Cadence::immediate(COMMAND_INTERVAL),
            review: Cadence::new(STRATEGY_INTERVAL),
            micro: Cadence::new(MICRO_INTERVAL),
            threats: ThreatCache::default(),
        }
    }

    /// Current strategy.
    #[must_use]
    pub fn strategy(&self) -> EliteStrategy {
        self.strategy
    }

    fn review_strategy(&mut self, world: &World) {
        let ratio = strength_ratio(
            detailed_strength(world.team_units(self.team)),
            detailed_strength(world.enemy_units(self.team)),
        );
        let next = EliteStrategy::for_ratio(ratio);
        if next != self.strategy {
            tracing::debug!(team = self.team, from = ?self.strategy, to = ?next, "strategy changed");
            self.strategy = next;
        }
    }

    fn micro_manage(&mut self, world: &mut World, roster: &Roster, threats: &ThreatMap) {
        for &id in &roster.mine {
            let Some(unit) = world.live_unit(id) else {
                continue;
            };
            if unit.kind == UnitKind::Mothership {
                let (position, range) = (unit.position, unit.attack_range);
                let in_range: Vec<UnitId> = roster
                    .enemies
                    .iter()
                    .copied()
                    .filter(|&e| world.live_unit(e).is_some_and(|u| u.position.distance(position) <= range))
                    .collect();
                if let Some(target) = pick_max(&in_range, |e| target_score(world, id, e)) {
                    world.order_attack(id, target);
                }
                continue;
            }

            let current = unit.attack_target;
            if energy_below(world, id, RETREAT_ENERGY) && !on_supply_run(world, id) && send_home(world, id) {
                continue;
            }
            if skill_is_useful_strict(world, id, threats) {
                world.use_skill(id);
            }
            if let Some(current) = current.filter(|&t| world.live_unit(t).is_some()) {
                let switch = better_target(world, id, current, &roster.enemies);
                if switch != current {
                    world.order_attack(id, switch);
                }
            }
        }
    }

    fn engage(world: &mut World, units: &[UnitId], enemies: &[UnitId], threats: &ThreatMap, floor: Fixed) {
        for &id in units {
            if on_supply_run(world, id) || energy_below(world, id, floor) {
                continue;
            }
            if let Some(target) = best_target(world, id, enemies, threats) {
                world.order_attack(id, target);
            }
        }
    }

    fn guerrilla(world: &mut World, units: &[UnitId], enemies: &[UnitId], threats: &ThreatMap) {
        let isolated: Vec<UnitId> = enemies.iter().copied().filter(|&e| escorts(world, e) <= 1).collect();
        for &id in units {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(30)) && send_home(world, id) {
                continue;
            }
            let target = super::scoring::nearest(world, id, &isolated)
                .or_else(|| best_target(world, id, enemies, threats));
            if let Some(target) = target {
                world.order_attack(id, target);
            }
        }
    }

    fn adaptive(world: &mut World, units: &[UnitId], enemies: &[UnitId], threats: &ThreatMap) {
        for &id in units {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(25)) && send_home(world, id) {
                continue;
            }
            if let Some(target) = best_target(world, id, enemies, threats) {
                world.order_attack(id, target);
            }
        }
    }
}

impl AiController for EliteAi {
    fn kind(&self) -> AiKind {
        AiKind::Elite
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn update(&mut self, world: &mut World, dt: Fixed) {
        self.command.advance(dt);
        self.review.advance(dt);
        self.micro.advance(dt);
        self.threats.advance(dt);
        if !self.command.ready() {
            return;
        }
        if self.review.ready() {
            self.review_strategy(world);
        }

        let roster = Roster::of(world, self.team);
        let threats = self.threats.get(world, self.team).clone();
        if self.micro.ready() {
            self.micro_manage(world, &roster, &threats);
        }

        let fleet: Vec<UnitId> = roster.mine.iter().copied().filter(|&id| !is_mothership(world, id)).collect();
        let (combat, _) = split_roles(world, &roster.mine);
        match self.strategy {
            EliteStrategy::OverwhelmingAssault => {
                Self::engage(world, &fleet, &roster.enemies, &threats, fixed_int(20));
            }
            EliteStrategy::CoordinatedAttack => {
                Self::engage(world, &combat, &roster.enemies, &threats, fixed_int(25));
            }
            EliteStrategy::GuerrillaTactics => Self::guerrilla(world, &fleet, &roster.enemies, &threats),
            EliteStrategy::AdaptivePressure => Self::adaptive(world, &combat, &roster.enemies, &threats),
        }
    }
}

/// Fights until its energy is gone, firing skills at half charge.
#[derive(Debug, Clone)]
pub struct TerminatorAi {
    team: TeamId,
    command: Cadence,
}

impl TerminatorAi {
    /// Controller for `team`.
    #[must_use]
    pub fn new(team: TeamId) -> Self {
        Self {
            team,
            command: Cadence::immediate(COMMAND_INTERVAL),
        }
    }
}

impl AiController for TerminatorAi {
    fn kind(&self) -> AiKind {
        AiKind::Terminator
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn update(&mut self, world: &mut World, dt: Fixed) {
        self.command.advance(dt);
        if !self.command.ready() {
            return;
        }
        let roster = Roster::of(world, self.team);
        for &id in &roster.mine {
            let Some(half_bar) = world.live_unit(id).map(|u| u.max_sp * fixed_ratio(1, 2)) else {
                continue;
            };
            if energy_below(world, id, Fixed::ONE) {
                send_home(world, id);
                continue;
            }
            try_skill(world, id, half_bar);
            if let Some(target) = pick_max(&roster.enemies, |e| terminator_priority(world, id, e)) {
                world.order_attack(id, target);
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
    use crate::unit::{UnitState, ENEMY_TEAM, PLAYER_TEAM};

    fn spawn(world: &mut World, kind: UnitKind, team: TeamId, x: i32, y: i32) -> UnitId {
        let template = UnitTemplate::new(kind, 100, 60).with_attack(10, 200, 1);
        world.spawn_unit(&template, team, Vec2Fixed::from_ints(x, y))
    }

    #[test]
    fn test_strategy_ladder() {
        assert_eq!(EliteStrategy::for_ratio(fixed_ratio(3, 2)), EliteStrategy::OverwhelmingAssault);
        assert_eq!(EliteStrategy::for_ratio(fixed_ratio(11, 10)), EliteStrategy::CoordinatedAttack);
        assert_eq!(EliteStrategy::for_ratio(fixed_ratio(9, 10)), EliteStrategy::AdaptivePressure);
        assert_eq!(EliteStrategy::for_ratio(fixed_ratio(1, 2)), EliteStrategy::GuerrillaTactics);
    }

    #[test]
    fn test_outnumbered_elite_turns_guerrilla() {
        let mut world = World::new(3);
        spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        for i in 0..3 {
            spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, i * 100, 1000);
        }
        let mut ai = EliteAi::new(ENEMY_TEAM);
        for _ in 0..70 {
            ai.update(&mut world, TICK_DELTA);
        }
        assert_eq!(ai.strategy(), EliteStrategy::GuerrillaTactics);
    }

    #[test]
    fn test_guerrilla_hunts_isolated_enemies() {
        let mut world = World::new(3);
        let raider = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        for i in 0..3 {
            spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 100 + i * 40, 0);
        }
        let straggler = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, -600, 0);
        let mut ai = EliteAi::new(ENEMY_TEAM);
        ai.strategy = EliteStrategy::GuerrillaTactics;
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.unit(raider).unwrap().attack_target, Some(straggler));
    }

    #[test]
    fn test_guerrilla_recalls_drained_repair_ships() {
        for (strategy, expected) in [
            (EliteStrategy::GuerrillaTactics, UnitState::Returning),
            (EliteStrategy::CoordinatedAttack, UnitState::Idle),
        ] {
            let mut world = World::new(3);
            spawn(&mut world, UnitKind::Mothership, ENEMY_TEAM, 0, -800);
            let medic = spawn(&mut world, UnitKind::Repair, ENEMY_TEAM, 0, 0);
            spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, -600, 0);
            world.unit_mut(medic).unwrap().energy = Fixed::from_num(20);

            let mut ai = EliteAi::new(ENEMY_TEAM);
            ai.strategy = strategy;
            ai.update(&mut world, TICK_DELTA);
            assert_eq!(world.unit(medic).unwrap().state, expected, "{strategy:?}");
        }
    }

    #[test]
    fn test_micro_sends_low_energy_home() {
        let mut world = World::new(3);
        spawn(&mut world, UnitKind::Mothership, ENEMY_TEAM, 0, 0);
        let pilot = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 300, 0);
        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 0, 1500);
        world.unit_mut(pilot).unwrap().energy = Fixed::from_num(35);

        let mut ai = EliteAi::new(ENEMY_TEAM);
        for _ in 0..4 {
            ai.update(&mut world, TICK_DELTA);
        }
        assert_eq!(world.unit(pilot).unwrap().state, UnitState::Returning);
    }

    #[test]
    fn test_micro_switches_to_much_better_target() {
        let mut world = World::new(3);
        let pilot = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let decoy = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 550, 0);
        let medic = spawn(&mut world, UnitKind::Repair, PLAYER_TEAM, 100, 0);
        world.unit_mut(medic).unwrap().hp = Fixed::from_num(20);
        world.order_attack(pilot, decoy);

        let threats = ThreatMap::assess(&world, ENEMY_TEAM);
        let roster = Roster::of(&world, ENEMY_TEAM);
        let mut ai = EliteAi::new(ENEMY_TEAM);
        ai.micro_manage(&mut world, &roster, &threats);
        assert_eq!(world.unit(pilot).unwrap().attack_target, Some(medic));
    }

    #[test]
    fn test_terminator_goes_for_the_mothership() {
        let mut world = World::new(3);
        let hunter = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 0);
        spawn(&mut world, UnitKind::Bomber, PLAYER_TEAM, 100, 0);
        let mother = spawn(&mut world, UnitKind::Mothership, PLAYER_TEAM, 0, 1800);
        let mut ai = TerminatorAi::new(ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.unit(hunter).unwrap().attack_target, Some(mother));
    }

    #[test]
    fn test_terminator_only_retreats_when_empty() {
        let mut world = World::new(3);
        spawn(&mut world, UnitKind::Mothership, ENEMY_TEAM, 0, 0);
        let hunter = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 300, 0);
        let prey = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 300, 600);
        world.unit_mut(hunter).unwrap().energy = Fixed::from_num(2);

        let mut ai = TerminatorAi::new(ENEMY_TEAM);
        ai.update(&mut world, TICK_DELTA);
        assert_eq!(world.unit(hunter).unwrap().attack_target, Some(prey));

        world.unit_mut(hunter).unwrap().energy = Fixed::from_num(0.5);
        for _ in 0..4 {
            ai.update(&mut world, TICK_DELTA);
        }
        assert_eq!(world.unit(hunter).unwrap().state, UnitState::Returning);
    }
}
