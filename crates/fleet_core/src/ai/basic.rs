//! Basic tier: simple, aggressive and defensive controllers.
//!
//! Every 0.3s the controller issues orders according to its current
//! strategy. The simple controller re-picks that strategy every 5s from the
//! raw strength ratio; the other two never change theirs.

use crate::math::{fixed_int, fixed_ratio, Fixed, Vec2Fixed};
use crate::unit::{opposing_team, TeamId, UnitId, UnitKind};
use crate::world::World;

use super::scoring::{nearest, raw_strength, strength_ratio};
use super::{on_supply_run, send_home, AiController, AiKind, Cadence, Roster};

/// Seconds between order passes.
pub const COMMAND_INTERVAL: Fixed = fixed_ratio(3, 10);

/// Seconds between strategy reviews.
pub const STRATEGY_INTERVAL: Fixed = fixed_int(5);

const PATROL_RADIUS: Fixed = fixed_int(150);
const GUARD_RADIUS: Fixed = fixed_int(300);
const THREAT_RADIUS: Fixed = fixed_int(250);

/// Team-wide posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Everything on the enemy mothership.
    Aggressive,
    /// Guard and patrol around the home mothership.
    Defensive,
    /// Half attack, half guard, repair craft tend the wounded.
    Balanced,
}

impl Strategy {
    /// Posture for a strength ratio: above 1.3 attack, below 0.7 defend.
    #[must_use]
    pub fn for_ratio(ratio: Fixed) -> Self {
        if ratio > fixed_ratio(13, 10) {
            Self::Aggressive
        } else if ratio < fixed_ratio(7, 10) {
            Self::Defensive
        } else {
            Self::Balanced
        }
    }
}

/// Basic-tier controller.
#[derive(Debug, Clone)]
pub struct BasicAi {
    kind: AiKind,
    team: TeamId,
    strategy: Strategy,
    command: Cadence,
    review: Cadence,
}

impl BasicAi {
    /// Controller of `kind` (simple, aggressive or defensive) for `team`.
    #[must_use]
    pub fn new(kind: AiKind, team: TeamId) -> Self {
        let strategy = if kind == AiKind::Defensive {
            Strategy::Defensive
        } else {
            Strategy::Aggressive
        };
        Self {
            kind,
            team,
            strategy,
            command: Cadence::immediate(COMMAND_INTERVAL),
            review: Cadence::new(STRATEGY_INTERVAL),
        }
    }

    /// Current posture.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn review_strategy(&mut self, world: &World) {
        let next = match self.kind {
            AiKind::Aggressive => Strategy::Aggressive,
            AiKind::Defensive => Strategy::Defensive,
            _ => {
                let mine = raw_strength(world.team_units(self.team));
                let theirs = raw_strength(world.enemy_units(self.team));
                Strategy::for_ratio(strength_ratio(mine, theirs))
            }
        };
        if next != self.strategy {
            tracing::debug!(team = self.team, from = ?self.strategy, to = ?next, "strategy changed");
            self.strategy = next;
        }
    }

    fn aggressive(&self, world: &mut World, roster: &Roster) {
        if let Some(target) = world.mothership(opposing_team(self.team)).map(|m| m.id) {
            for &id in &roster.mine {
                if is_mothership(world, id) || on_supply_run(world, id) {
                    continue;
                }
                world.order_attack(id, target);
            }
        }
        mothership_fire_support(world, self.team, &roster.enemies, |world, mother, in_range| {
            nearest(world, mother, in_range)
        });
    }

    fn defensive(&self, world: &mut World, roster: &Roster) {
        let Some((home_id, home)) = world.mothership(self.team).map(|m| (m.id, m.position)) else {
            return;
        };
        let intruders: Vec<UnitId> = world.enemies_within(self.team, home, GUARD_RADIUS);
        for &id in &roster.mine {
            if id == home_id || on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(30)) && send_home(world, id) {
                continue;
            }
            if let Some(target) = nearest(world, id, &intruders) {
                world.order_attack(id, target);
            } else {
                let angle = world.rng_mut().angle();
                world.order_move(id, home + Vec2Fixed::from_angle(angle).scale(PATROL_RADIUS));
            }
        }
    }

    fn balanced(&self, world: &mut World, roster: &Roster) {
        let home = world.mothership(self.team).map(|m| (m.id, m.position));
        let (combat, repair) = split_roles(world, &roster.mine);
        let (attackers, defenders) = combat.split_at(combat.len() / 2);

        let wounded: Vec<UnitId> = roster
            .enemies
            .iter()
            .copied()
            .filter(|&e| world.unit(e).is_some_and(|u| u.hp_ratio() < fixed_ratio(1, 2)))
            .collect();
        for &id in attackers {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(20)) && send_home(world, id) {
                continue;
            }
            let target = nearest(world, id, &wounded).or_else(|| nearest(world, id, &roster.enemies));
            if let Some(target) = target {
                world.order_attack(id, target);
            }
        }

        let threats: Vec<UnitId> = home
            .map(|(_, pos)| world.enemies_within(self.team, pos, THREAT_RADIUS))
            .unwrap_or_default();
        for &id in defenders {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(30)) && send_home(world, id) {
                continue;
            }
            if let Some(target) = nearest(world, id, &threats) {
                world.order_attack(id, target);
            } else if let Some((home_id, _)) = home {
                world.order_follow(id, home_id);
            }
        }

        for &id in &repair {
            if on_supply_run(world, id) {
                continue;
            }
            if energy_below(world, id, fixed_int(20)) && send_home(world, id) {
                continue;
            }
            let patient = roster
                .mine
                .iter()
                .copied()
                .filter(|&a| a != id)
                .filter_map(|a| world.unit(a))
                .filter(|a| a.hp_ratio() < fixed_ratio(7, 10))
                .min_by_key(|a| (a.hp_ratio(), a.id))
                .map(|a| a.id);
            if let Some(patient) = patient {
                world.order_repair(id, patient);
            } else if let Some((home_id, _)) = home {
                world.order_follow(id, home_id);
            }
        }

        mothership_fire_support(world, self.team, &roster.enemies, |world, _, in_range| {
            in_range
                .iter()
                .filter_map(|&e| world.unit(e))
                .min_by_key(|e| (e.hp, e.id))
                .map(|e| e.id)
        });

        for &id in &roster.mine {
            if world.unit(id).is_some_and(|u| u.skill_ready()) {
                world.use_skill(id);
            }
        }
    }
}

impl AiController for BasicAi {
    fn kind(&self) -> AiKind {
        self.kind
    }

    fn team(&self) -> TeamId {
        self.team
    }

    fn update(&mut self, world: &mut World, dt: Fixed) {
        self.command.advance(dt);
        self.review.advance(dt);
        if !self.command.ready() {
            return;
        }

        if self.review.ready() {
            self.review_strategy(world);
        }

        let roster = Roster::of(world, self.team);
        match self.strategy {
            Strategy::Aggressive => self.aggressive(world, &roster),
            Strategy::Defensive => self.defensive(world, &roster),
            Strategy::Balanced => self.balanced(world, &roster),
        }
    }
}

pub(crate) fn is_mothership(world: &World, id: UnitId) -> bool {
    world.unit(id).is_some_and(|u| u.kind == UnitKind::Mothership)
}

pub(crate) fn energy_below(world: &World, id: UnitId, floor: Fixed) -> bool {
    world.unit(id).is_some_and(|u| u.energy < floor)
}

/// Combat hulls and repair craft; motherships are in neither.
pub(crate) fn split_roles(world: &World, units: &[UnitId]) -> (Vec<UnitId>, Vec<UnitId>) {
    let mut combat = Vec::new();
    let mut repair = Vec::new();
    for &id in units {
        match world.unit(id).map(|u| u.kind) {
            Some(UnitKind::Repair) => repair.push(id),
            Some(UnitKind::Mothership) | None => {}
            Some(_) => combat.push(id),
        }
    }
    (combat, repair)
}

/// Have the home mothership fire on an enemy within its own range, chosen
/// by `choose` from those in range.
pub(crate) fn mothership_fire_support(
    world: &mut World,
    team: TeamId,
    enemies: &[UnitId],
    choose: impl FnOnce(&World, UnitId, &[UnitId]) -> Option<UnitId>,
) {
    let Some((mother, position, range)) = world
        .mothership(team)
        .filter(|m| m.can_attack())
        .map(|m| (m.id, m.position, m.attack_range))
    else {
        return;
    };
    let in_range: Vec<UnitId> = enemies
        .iter()
        .copied()
        .filter(|&e| world.live_unit(e).is_some_and(|u| u.position.distance(position) <= range))
        .collect();
    if let Some(target) = choose(world, mother, &in_range) {
        world.order_attack(mother, target);
    }
}
