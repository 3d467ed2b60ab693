//! Shared evaluation toolkit for AI controllers.
//!
//! Strength estimates, threat maps, target scores and skill predicates.
//! Everything here is a pure read of the world; controllers decide what to
//! do with the numbers.

use std::collections::BTreeMap;

use crate::config::TICK_RATE;
use crate::math::{fixed_int, fixed_ratio, Fixed};
use crate::skills::SkillKind;
use crate::unit::{TeamId, Unit, UnitId, UnitKind};
use crate::world::World;

// ============================================================================
// Force strength
// ============================================================================

/// Raw strength: total hull plus damage.
pub fn raw_strength<'a>(units: impl Iterator<Item = &'a Unit>) -> Fixed {
    units.fold(Fixed::ZERO, |sum, u| sum + u.hp + u.attack_damage)
}

/// Strength weighted by damage, remaining energy and hull class.
///
/// Motherships count triple, heavies 1.5x and bombers 1.3x.
pub fn force_strength<'a>(units: impl Iterator<Item = &'a Unit>) -> Fixed {
    units.fold(Fixed::ZERO, |sum, u| {
        let base = u.hp + u.attack_damage * 2;
        let energy = fixed_ratio(1, 2) + energy_ratio_or_full(u) * fixed_ratio(1, 2);
        let class = match u.kind {
            UnitKind::Mothership => fixed_int(3),
            UnitKind::Heavy => fixed_ratio(3, 2),
            UnitKind::Bomber => fixed_ratio(13, 10),
            _ => Fixed::ONE,
        };
        sum + base * energy * class
    })
}

/// Finer strength estimate that also credits nearly charged skills.
pub fn detailed_strength<'a>(units: impl Iterator<Item = &'a Unit>) -> Fixed {
    units.fold(Fixed::ZERO, |sum, u| {
        let mut strength = u.hp + u.attack_damage * 3;
        strength *= fixed_ratio(3, 5) + energy_ratio_or_full(u) * fixed_ratio(2, 5);
        if u.max_sp > Fixed::ZERO && u.sp >= u.max_sp * fixed_ratio(4, 5) {
            strength *= fixed_ratio(3, 2);
        }
        let class = match u.kind {
            UnitKind::Mothership => fixed_int(4),
            UnitKind::Heavy => fixed_int(2),
            UnitKind::Bomber => fixed_ratio(9, 5),
            _ => Fixed::ONE,
        };
        sum + strength * class
    })
}

/// `mine / theirs`, with the denominator floored at one.
#[must_use]
pub fn strength_ratio(mine: Fixed, theirs: Fixed) -> Fixed {
    mine / theirs.max(Fixed::ONE)
}

fn energy_ratio_or_full(unit: &Unit) -> Fixed {
    if unit.max_energy > Fixed::ZERO {
        unit.energy_ratio()
    } else {
        Fixed::ONE
    }
}

// ============================================================================
// Threat map
// ============================================================================

/// Per-enemy threat scores from one side's point of view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreatMap {
    scores: BTreeMap<UnitId, Fixed>,
}

impl ThreatMap {
    /// Score every enemy of `team`.
    ///
    /// Damage counts double and hull half. Enemies within 200 of any of
    /// `team`'s units double again (1.5x within 400), then capital ships
    /// triple, bombers double and heavies get 1.5x.
    #[must_use]
    pub fn assess(world: &World, team: TeamId) -> Self {
        let mine: Vec<_> = world.team_units(team).map(|u| u.position).collect();
        let scores = world
            .enemy_units(team)
            .map(|enemy| {
                let mut threat = enemy.attack_damage * 2 + enemy.hp * fixed_ratio(1, 2);
                let closest = mine
                    .iter()
                    .map(|p| p.distance(enemy.position))
                    .min()
                    .unwrap_or(Fixed::MAX);
                if closest < fixed_int(200) {
                    threat *= fixed_int(2);
                } else if closest < fixed_int(400) {
                    threat *= fixed_ratio(3, 2);
                }
                threat *= match enemy.kind {
                    UnitKind::Mothership => fixed_int(3),
                    UnitKind::Bomber => fixed_int(2),
                    UnitKind::Heavy => fixed_ratio(3, 2),
                    _ => Fixed::ONE,
                };
                (enemy.id, threat)
            })
            .collect();
        Self { scores }
    }

    /// Threat of `id`, zero if unknown.
    #[must_use]
    pub fn score(&self, id: UnitId) -> Fixed {
        self.scores.get(&id).copied().unwrap_or(Fixed::ZERO)
    }

    /// Highest threat on the map.
    #[must_use]
    pub fn max_threat(&self) -> Fixed {
        self.scores.values().copied().max().unwrap_or(Fixed::ZERO)
    }

    /// Number of scored enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing was scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

// ============================================================================
// Target selection
// ============================================================================

/// First candidate with the highest score. Ties go to the earlier entry.
pub fn pick_max(candidates: &[UnitId], mut score: impl FnMut(UnitId) -> Fixed) -> Option<UnitId> {
    let mut best: Option<(UnitId, Fixed)> = None;
    for &id in candidates {
        let s = score(id);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((id, s));
        }
    }
    best.map(|(id, _)| id)
}

/// Candidate closest to `unit`.
#[must_use]
pub fn nearest(world: &World, unit: UnitId, candidates: &[UnitId]) -> Option<UnitId> {
    let from = world.unit(unit)?.position;
    candidates
        .iter()
        .filter_map(|&id| world.live_unit(id).map(|u| (id, u.position.distance_squared(from))))
        .min_by_key(|&(id, d)| (d, id))
        .map(|(id, _)| id)
}

/// Weighted pick for `unit` among `candidates`: 40% threat, 30% proximity,
/// plus flat bonuses for weakened targets, priority hulls and targets
/// already in range. Candidates beyond twice the attack range are skipped.
#[must_use]
pub fn best_target(world: &World, unit: UnitId, candidates: &[UnitId], threats: &ThreatMap) -> Option<UnitId> {
    let me = world.live_unit(unit)?;
    let mut best: Option<(UnitId, Fixed)> = None;
    for &id in candidates {
        let Some(enemy) = world.live_unit(id) else {
            continue;
        };
        let distance = me.position.distance(enemy.position);
        if distance > me.attack_range * 2 {
            continue;
        }

        let mut score = threats.score(id) * fixed_ratio(2, 5);
        let proximity = (fixed_int(500) - distance).max(Fixed::ZERO) / fixed_int(500) * fixed_int(100);
        score += proximity * fixed_ratio(3, 10);
        score += weakness_bonus(enemy, fixed_int(100), fixed_int(50));
        score += match enemy.kind {
            UnitKind::Mothership => fixed_int(200),
            UnitKind::Repair => fixed_int(150),
            UnitKind::Bomber => fixed_int(120),
            _ => Fixed::ZERO,
        };
        if distance <= me.attack_range {
            score += fixed_int(100);
        }

        if best.map_or(true, |(_, b)| score > b) {
            best = Some((id, score));
        }
    }
    best.map(|(id, _)| id)
}

/// Score used when reconsidering a target mid-fight. Zero beyond three
/// times the attack range.
#[must_use]
pub fn target_score(world: &World, unit: UnitId, target: UnitId) -> Fixed {
    let (Some(me), Some(enemy)) = (world.live_unit(unit), world.live_unit(target)) else {
        return Fixed::ZERO;
    };
    let distance = me.position.distance(enemy.position);
    if distance > me.attack_range * 3 {
        return Fixed::ZERO;
    }
    let mut score = weakness_bonus(enemy, fixed_int(100), fixed_int(50));
    score += (fixed_int(200) - distance).max(Fixed::ZERO) / fixed_int(200) * fixed_int(50);
    score += enemy.attack_damage * 2;
    score += match enemy.kind {
        UnitKind::Mothership => fixed_int(200),
        UnitKind::Repair => fixed_int(150),
        UnitKind::Bomber => fixed_int(100),
        _ => Fixed::ZERO,
    };
    score
}

/// A candidate that beats `current` by at least 20%, or `current`.
#[must_use]
pub fn better_target(world: &World, unit: UnitId, current: UnitId, candidates: &[UnitId]) -> UnitId {
    let mut best = current;
    let mut best_score = target_score(world, unit, current);
    for &id in candidates {
        if id == current {
            continue;
        }
        let score = target_score(world, unit, id);
        if score > best_score * fixed_ratio(6, 5) {
            best = id;
            best_score = score;
        }
    }
    best
}

/// Flat bonus for a target below 30% (`critical`) or 60% (`hurt`) hull.
fn weakness_bonus(target: &Unit, critical: Fixed, hurt: Fixed) -> Fixed {
    let ratio = target.hp_ratio();
    if ratio < fixed_ratio(3, 10) {
        critical
    } else if ratio < fixed_ratio(3, 5) {
        hurt
    } else {
        Fixed::ZERO
    }
}

/// Relentless target priority: capital ships, then repair craft, then
/// damage output, with bonuses for wounded and nearby targets.
#[must_use]
pub fn terminator_priority(world: &World, unit: UnitId, target: UnitId) -> Fixed {
    let (Some(me), Some(enemy)) = (world.live_unit(unit), world.live_unit(target)) else {
        return Fixed::ZERO;
    };
    let mut score = match enemy.kind {
        UnitKind::Mothership => fixed_int(10_000),
        UnitKind::Repair => fixed_int(5_000),
        _ => enemy.attack_damage * 10,
    };
    if enemy.hp_ratio() < fixed_ratio(1, 2) {
        score += fixed_int(1_000);
    }
    score + (fixed_int(2_000) - me.position.distance(enemy.position)).max(Fixed::ZERO)
}

/// Predatory score: favours weak, drained, isolated and stationary prey.
#[must_use]
pub fn hunter_score(world: &World, unit: UnitId, target: UnitId) -> Fixed {
    let (Some(me), Some(enemy)) = (world.live_unit(unit), world.live_unit(target)) else {
        return Fixed::ZERO;
    };
    let mut score = enemy.attack_damage * 20 + enemy.hp * 5;

    let distance = me.position.distance(enemy.position);
    score += if distance < fixed_int(200) {
        fixed_int(500)
    } else if distance < fixed_int(400) {
        fixed_int(300)
    } else {
        (fixed_int(1_000) - distance).max(Fixed::ZERO)
    };

    score += weakness_bonus(enemy, fixed_int(800), fixed_int(400));
    if enemy.max_energy > Fixed::ZERO && enemy.energy_ratio() < fixed_ratio(3, 10) {
        score += fixed_int(300);
    }
    score += match enemy.kind {
        UnitKind::Mothership => fixed_int(1_000),
        UnitKind::Repair => fixed_int(600),
        UnitKind::Heavy => fixed_int(400),
        _ => Fixed::ZERO,
    };

    score += match escorts(world, target) {
        0 => fixed_int(500),
        1 => fixed_int(200),
        _ => Fixed::ZERO,
    };

    let speed = enemy.velocity.length() * Fixed::from_num(TICK_RATE);
    if speed < fixed_int(10) {
        score += fixed_int(200);
    }
    score
}

/// Live teammates of `unit` within 150 of it.
#[must_use]
pub fn escorts(world: &World, unit: UnitId) -> usize {
    let Some(me) = world.live_unit(unit) else {
        return 0;
    };
    world
        .allies_within(me.team, me.position, fixed_int(150))
        .into_iter()
        .filter(|&id| id != unit)
        .count()
}

/// Damage per volley from enemies that are targeting `unit` and within
/// 1.5x their own range of it.
#[must_use]
pub fn incoming_damage(world: &World, unit: UnitId) -> Fixed {
    let Some(me) = world.live_unit(unit) else {
        return Fixed::ZERO;
    };
    world
        .enemy_units(me.team)
        .filter(|e| e.attack_target == Some(unit))
        .filter(|e| e.position.distance(me.position) <= e.attack_range * fixed_ratio(3, 2))
        .fold(Fixed::ZERO, |sum, e| sum + e.attack_damage)
}

// ============================================================================
// Skills
// ============================================================================

/// Whether firing `unit`'s charged skill now would accomplish something.
#[must_use]
pub fn skill_is_useful(world: &World, unit: UnitId, threats: &ThreatMap) -> bool {
    let Some(me) = world.live_unit(unit) else {
        return false;
    };
    let Some(skill) = me.skill.as_ref().filter(|_| me.skill_ready()) else {
        return false;
    };
    let radius = skill.radius();
    match skill.kind {
        SkillKind::DamageAoe => world.enemies_within(me.team, me.position, radius).len() >= 2,
        SkillKind::HealAoe => wounded_allies_within(world, me, radius) >= 2,
        SkillKind::BuffSpeed | SkillKind::BuffAttack => {
            !world.enemies_within(me.team, me.position, fixed_int(300)).is_empty()
        }
        SkillKind::Shield => me.hp_ratio() < fixed_ratio(1, 2),
        SkillKind::Disable => threats.max_threat() > fixed_int(100),
        SkillKind::RepairAll => wounded_allies_within(world, me, Fixed::MAX) >= 2,
        SkillKind::Teleport => {
            me.hp_ratio() < fixed_ratio(3, 10)
                && !world.enemies_within(me.team, me.position, fixed_int(200)).is_empty()
        }
    }
}

/// Stricter predicate: buffs need company and shields need incoming fire.
/// Other kinds defer to [`skill_is_useful`].
#[must_use]
pub fn skill_is_useful_strict(world: &World, unit: UnitId, threats: &ThreatMap) -> bool {
    let Some(me) = world.live_unit(unit) else {
        return false;
    };
    let Some(skill) = me.skill.as_ref().filter(|_| me.skill_ready()) else {
        return false;
    };
    let radius = skill.radius();
    match skill.kind {
        SkillKind::BuffSpeed | SkillKind::BuffAttack => {
            let enemies = world.enemies_within(me.team, me.position, fixed_int(200));
            let company = world
                .allies_within(me.team, me.position, radius)
                .into_iter()
                .filter(|&id| id != unit)
                .count();
            !enemies.is_empty() && company >= 2
        }
        SkillKind::Shield => incoming_damage(world, unit) > me.hp * fixed_ratio(3, 10),
        _ => skill_is_useful(world, unit, threats),
    }
}

fn wounded_allies_within(world: &World, me: &Unit, radius: Fixed) -> usize {
    world
        .allies_within(me.team, me.position, radius)
        .into_iter()
        .filter_map(|id| world.unit(id))
        .filter(|a| a.hp_ratio() < fixed_ratio(7, 10))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitTemplate;
    use crate::math::Vec2Fixed;
    use crate::skills::SkillSpec;
    use crate::unit::{ENEMY_TEAM, PLAYER_TEAM};

    fn spawn(world: &mut World, kind: UnitKind, team: TeamId, x: i32, y: i32) -> UnitId {
        let template = UnitTemplate::new(kind, 100, 50).with_attack(10, 150, 1);
        world.spawn_unit(&template, team, Vec2Fixed::from_ints(x, y))
    }

    #[test]
    fn test_strength_ratio_floors_denominator() {
        assert_eq!(strength_ratio(fixed_int(50), Fixed::ZERO), fixed_int(50));
        assert_eq!(strength_ratio(fixed_int(50), fixed_int(100)), fixed_ratio(1, 2));
    }

    #[test]
    fn test_force_strength_weights_hulls() {
        let mut world = World::new(1);
        let heavy = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 0);
        let fighter = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 100, 0);
        let strength = |id| force_strength(world.unit(id).into_iter());
        // (100 + 20) at full energy.
        assert_eq!(strength(fighter), fixed_int(120));
        assert_eq!(strength(heavy), fixed_int(180));

        world.unit_mut(fighter).unwrap().energy = Fixed::ZERO;
        assert_eq!(force_strength(world.unit(fighter).into_iter()), fixed_int(60));
    }

    #[test]
    fn test_threat_map_scales_with_proximity_and_class() {
        let mut world = World::new(1);
        spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let close = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 100, 0);
        let far = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 1000, 0);
        let mother = spawn(&mut world, UnitKind::Mothership, PLAYER_TEAM, 300, 0);

        let map = ThreatMap::assess(&world, ENEMY_TEAM);
        // Base 10 * 2 + 100 / 2 = 70.
        assert_eq!(map.score(far), fixed_int(70));
        assert_eq!(map.score(close), fixed_int(140));
        assert_eq!(map.score(mother), fixed_int(315));
        assert_eq!(map.max_threat(), fixed_int(315));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_best_target_prefers_priority_hulls_in_reach() {
        let mut world = World::new(1);
        let me = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let fighter = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 100, 0);
        let medic = spawn(&mut world, UnitKind::Repair, PLAYER_TEAM, 200, 0);
        let out_of_reach = spawn(&mut world, UnitKind::Mothership, PLAYER_TEAM, 900, 0);

        let map = ThreatMap::assess(&world, ENEMY_TEAM);
        let candidates = [fighter, medic, out_of_reach];
        assert_eq!(best_target(&world, me, &candidates, &map), Some(medic));
        assert_eq!(best_target(&world, me, &[out_of_reach], &map), None);
    }

    #[test]
    fn test_better_target_needs_clear_margin() {
        let mut world = World::new(1);
        let me = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let current = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 100, 0);
        let similar = spawn(&mut world, UnitKind::Scout, PLAYER_TEAM, 90, 0);
        assert_eq!(better_target(&world, me, current, &[current, similar]), current);

        let medic = spawn(&mut world, UnitKind::Repair, PLAYER_TEAM, 150, 0);
        assert_eq!(better_target(&world, me, current, &[current, similar, medic]), medic);
    }

    #[test]
    fn test_terminator_priority_ranks_mothership_first() {
        let mut world = World::new(1);
        let me = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let near = spawn(&mut world, UnitKind::Heavy, PLAYER_TEAM, 50, 0);
        let medic = spawn(&mut world, UnitKind::Repair, PLAYER_TEAM, 1500, 0);
        let mother = spawn(&mut world, UnitKind::Mothership, PLAYER_TEAM, 1900, 0);
        let candidates = [near, medic, mother];
        assert_eq!(pick_max(&candidates, |t| terminator_priority(&world, me, t)), Some(mother));
    }

    #[test]
    fn test_hunter_score_rewards_isolation() {
        let mut world = World::new(1);
        let me = spawn(&mut world, UnitKind::Fighter, ENEMY_TEAM, 0, 0);
        let loner = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 500, 0);
        let grouped = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, -500, 0);
        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, -520, 50);
        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, -520, -50);
        assert_eq!(
            hunter_score(&world, me, loner) - hunter_score(&world, me, grouped),
            fixed_int(500)
        );
    }

    #[test]
    fn test_incoming_damage_counts_attackers_in_reach() {
        let mut world = World::new(1);
        let me = spawn(&mut world, UnitKind::Heavy, ENEMY_TEAM, 0, 0);
        let a = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 200, 0);
        let b = spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 400, 0);
        world.unit_mut(a).unwrap().attack_target = Some(me);
        world.unit_mut(b).unwrap().attack_target = Some(me);
        assert_eq!(incoming_damage(&world, me), fixed_int(10));
    }

    #[test]
    fn test_aoe_skill_needs_two_enemies() {
        let mut world = World::new(1);
        let template = UnitTemplate::new(UnitKind::Bomber, 100, 50)
            .with_attack(10, 150, 1)
            .with_skill(SkillSpec::new(SkillKind::DamageAoe));
        let me = world.spawn_unit(&template, ENEMY_TEAM, Vec2Fixed::ZERO);
        world.unit_mut(me).unwrap().sp = fixed_int(100);
        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, 50, 0);
        let map = ThreatMap::assess(&world, ENEMY_TEAM);
        assert!(!skill_is_useful(&world, me, &map));

        spawn(&mut world, UnitKind::Fighter, PLAYER_TEAM, -50, 0);
        assert!(skill_is_useful(&world, me, &map));

        world.unit_mut(me).unwrap().sp = fixed_int(50);
        assert!(!skill_is_useful(&world, me, &map));
    }
}
