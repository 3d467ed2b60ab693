//! Improved tier: advanced, hyper-aggressive and turtle controllers.
//!
//! Adds a threat map cached for one second, weighted target selection,
//! skill micro and repair dispatch on a 0.1s cadence, and a 3s strategy
//! review driven by [`force_strength`].

use crate::math::{fixed_int, fixed_ratio, Fixed, Vec2Fixed};
use crate::unit::{opposing_team, TeamId, UnitId, UnitKind, UnitState};
use crate::world::World;

use super::basic::{energy_below, mothership_fire_support, split_roles, Strategy};
use super::scoring::{best_target, force_strength, skill_is_useful, strength_ratio, ThreatMap};
use super::{on_supply_run, send_home, AiController, AiKind, Cadence, Roster};

/// Seconds between order passes.
pub const COMMAND_INTERVAL: Fixed = fixed_ratio(1, 5);

/// Seconds between strategy reviews.
pub const STRATEGY_INTERVAL: Fixed = fixed_int(3);

/// Seconds between micro-management passes.
pub const MICRO_INTERVAL: Fixed = fixed_ratio(1, 10);

/// Seconds a threat map stays valid.
pub const THREAT_TTL: Fixed = fixed_int(1);

/// Repair craft below this energy are sent home by micro-management.
pub const REPAIR_ENERGY_FLOOR: Fixed = fixed_int(30);

/// Combat craft below this energy are sent home by micro-management.
pub const COMBAT_ENERGY_FLOOR: Fixed = fixed_int(20);

const FORMATION_RADIUS: Fixed = fixed_int(150);
const GUARD_RADIUS: Fixed = fixed_int(200);
const THREAT_RADIUS: Fixed = fixed_int(250);
const PATIENT_RADIUS: Fixed = fixed_int(300);

/// Threat map recomputed at most once per [`THREAT_TTL`].
#[derive(Debug, Clone)]
pub struct ThreatCache {
    map: ThreatMap,
    refresh: Cadence,
}

impl Default for ThreatCache {
    fn default() -> Self {
        Self {
            map: ThreatMap::default(),
            refresh: Cadence::immediate(THREAT_TTL),
        }
    }
}

impl ThreatCache {
    /// Age the cache by `dt`.
    pub fn advance(&mut self, dt: Fixed) {
        self.refresh.advance(dt);
    }

    /// Current map for `team`, reassessed if stale.
    pub fn get(&mut self, world: &World, team: TeamId) -> &ThreatMap {
        if self.refresh.ready() {
            self.map = ThreatMap::assess(world, team);
        }
        &self.map
    }
}

/// Improved-tier controller.
#[derive(Debug, Clone)]
pub struct AdvancedAi {
    kind: AiKind,
    team: TeamId,
    strategy: Strategy,
    command: Cadence,
    review: Cadence,
    micro: Cadence,
    threats: ThreatCache,
}

impl AdvancedAi {
    /// Controller of `kind` (advanced, hyper-aggressive or turtle) for `team`.
    #[must_use]
    pub fn new(kind: AiKind, team: TeamId) -> Self {
        let strategy = match kind {
            AiKind::HyperAggressive => Strategy::Aggressive,
            AiKind::Turtle => Strategy::Defensive,
            _ => Strategy::Balanced,
        };
        Self {
            kind,
            team,
            strategy,
            command: Cadence::immediate(COMMAND_INTERVAL),
            review: Cadence::new(STRATEGY_INTERVAL),
            micro: Cadence::new(MICRO_INTERVAL),
            threats: ThreatCache::default(),
        }
    }

    /// Current posture.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Posture for the current battlefield.
    fn choose_strategy(&self, world: &World) -> Option<Strategy> {
        let mine = world.team_units(self.team).count();
        if mine == 0 || world.enemy_units(self.team).next().is_none() {
            return None;
        }
        let ratio = strength_ratio(
            force_strength(world.team_units(self.team)),
            force_strength(world.enemy_units(self.team)),
        );
        let next = match self.kind {
            AiKind::HyperAggressive if ratio > fixed_ratio(4, 5) => Strategy::Aggressive,
            AiKind::HyperAggressive => Strategy::Balanced,
            AiKind::Turtle if ratio > fixed_ratio(3, 2) => Strategy::Balanced,
            AiKind::Turtle => Strategy::Defensive,
            _ => {
                let spread = world
                    .mothership(opposing_team(self.team))
                    .map_or(fixed_int(500), |target| {
                        let total = world
                            .team_units(self.team)
                            .fold(Fixed::ZERO, |sum, u| sum + u.position.distance(target.position));
                        total / Fixed::from_num(mine)
                    });
                if ratio > fixed_ratio(7, 5) || (ratio > fixed_ratio(11, 10) && spread < fixed_int(200)) {
                    Strategy::Aggressive
                } else if ratio < fixed_ratio(3, 5) || spread > fixed_int(400) {
                    Strategy::Defensive
                } else {
                    Strategy::Balanced
                }
            }
        };
        Some(next)
    }

    fn micro_manage(&mut self, world: &mut World, roster: &Roster) {
        let threats = self.threats.get(world, self.team).clone();
        for &id in &roster.mine {
            let Some((kind, energy)) = world.live_unit(id).map(|u| (u.kind, u.energy)) else {
                continue;
            };
            if kind == UnitKind::Mothership {
                continue;
            }
            let floor = if kind == UnitKind::Repair {
                REPAIR_ENERGY_FLOOR
            } else {
                COMBAT_ENERGY_FLOOR
            };
            if energy < floor && !on_supply_run(world, id) && send_home(world, id) {
                continue;
            }
            if skill_is_useful(world, id, &threats) {
                world.use_skill(id);
            }
            if kind == UnitKind::Repair {
                dispatch_repair(world, id, &roster.mine);
            }
        }
    }

    fn aggressive(&mut self, world: &mut World, roster: &Roster) {
        let threats = self.threats.get(world, self.team).clone();
        let (combat, _) = split_roles(world, &roster.mine);
        for &id in &combat {
            if energy_below(world, id, fixed_int(30)) || on_supply_run(world, id) {
                continue;
            }
            if let Some(target) = best_target(world, id, &roster.enemies, &threats) {
                world.order_attack(id, target);
            }
        }
        mothership_fire_support(world, self.team, &roster.enemies, |world, mother, in_range| {
            best_target(world, mother, in_range, &threats)
        });
    }

    fn defensive(&mut self, world: &mut World, roster: &Roster) {
        let Some(home) = world.mothership(self.team).map(|m| m.position) else {
            return;
        };
        let threats = self.threats.get(world, self.team).clone();
        let intruders = world.enemies_within(self.team, home, GUARD_RADIUS);
        let (combat, _) = split_roles(world, &roster.mine);
        for &id in &combat {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(20)) && send_home(world, id) {
                continue;
            }
            if !intruders.is_empty() {
                if let Some(target) = best_target(world, id, &intruders, &threats) {
                    world.order_attack(id, target);
                }
            } else if world.unit(id).is_some_and(|u| u.position.distance(home) > FORMATION_RADIUS) {
                let angle = world.rng_mut().angle();
                let slot = home + Vec2Fixed::from_angle(angle).scale(FORMATION_RADIUS * fixed_ratio(4, 5));
                world.order_move(id, slot);
            }
        }
    }

    fn balanced(&mut self, world: &mut World, roster: &Roster) {
        let threats = self.threats.get(world, self.team).clone();
        let (combat, _) = split_roles(world, &roster.mine);
        let attack_count = combat.len() * 3 / 5;
        let (attackers, defenders) = combat.split_at(attack_count);

        for &id in attackers {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(25)) && send_home(world, id) {
                continue;
            }
            if let Some(target) = best_target(world, id, &roster.enemies, &threats) {
                world.order_attack(id, target);
            }
        }

        let Some((home_id, home)) = world.mothership(self.team).map(|m| (m.id, m.position)) else {
            return;
        };
        let near_home = world.enemies_within(self.team, home, THREAT_RADIUS);
        for &id in defenders {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(30)) && send_home(world, id) {
                continue;
            }
            if !near_home.is_empty() {
                if let Some(target) = best_target(world, id, &near_home, &threats) {
                    world.order_attack(id, target);
                }
            } else if world.unit(id).is_some_and(|u| u.position.distance(home) > fixed_int(200)) {
                world.order_follow(id, home_id);
            }
        }
    }
}

/// Send repair craft `id` to the most deserving wounded ally within 300.
///
/// Healthier allies and the mothership rank higher, as do closer ones.
pub(crate) fn dispatch_repair(world: &mut World, id: UnitId, allies: &[UnitId]) {
    let Some(me) = world.live_unit(id).filter(|u| u.state != UnitState::Returning) else {
        return;
    };
    let position = me.position;
    let mut best: Option<(UnitId, Fixed)> = None;
    for &ally in allies {
        let Some(unit) = world.live_unit(ally) else {
            continue;
        };
        let distance = unit.position.distance(position);
        if ally == id || unit.hp_ratio() >= fixed_ratio(4, 5) || distance >= PATIENT_RADIUS {
            continue;
        }
        let importance = if unit.kind == UnitKind::Mothership { 3 } else { 1 };
        let priority = unit.hp_ratio() * fixed_int(100) + fixed_int(importance * 100) - distance * fixed_ratio(1, 10);
        if best.map_or(true, |(_, b)| priority > b) {
            best = Some((ally, priority));
        }
    }
    if let Some((patient, _)) = best {
        world.order_repair(id, patient);
    }
}

impl AiController for AdvancedAi {
    fn kind(&self) -> AiKind {
        self.kind
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
            if let Some(next) = self.choose_strategy(world) {
                if next != self.strategy {
                    tracing::debug!(team = self.team, from = ?self.strategy, to = ?next, "strategy changed");
                    self.strategy = next;
                }
            }
        }

        let roster = Roster::of(world, self.team);
        if self.micro.ready() {
            self.micro_manage(world, &roster);
        }
        match self.strategy {
            Strategy::Aggressive => self.aggressive(world, &roster),
            Strategy::Defensive => self.defensive(world, &roster),
            Strategy::Balanced => self.balanced(world, &roster),
        }
    }
}
