//! The battlefield: unit roster, projectiles, effects and terrain.
//!
//! [`World`] owns every unit and advances them in fixed phases. A tick runs
//! unit updates (in roster order), separates overlapping hulls, prunes the
//! dead, then advances projectiles and effects. AI controllers run between
//! pruning and projectiles; see [`Battle`](crate::battle::Battle).
//!
//! # Determinism
//!
//! - Fixed-point math only (see [`Fixed`])
//! - Randomness comes from the world's own [`SimRng`]
//! - The roster is kept sorted by [`UnitId`]
//!
//! # Example
//!
//! ```
//! use fleet_core::config::TICK_DELTA;
//! use fleet_core::data::UnitTemplate;
//! use fleet_core::math::Vec2Fixed;
//! use fleet_core::unit::{UnitKind, ENEMY_TEAM, PLAYER_TEAM};
//! use fleet_core::world::World;
//!
//! let mut world = World::new(7);
//! let fighter = UnitTemplate::new(UnitKind::Fighter, 100, 120).with_attack(10, 150, 1);
//! let a = world.spawn_unit(&fighter, PLAYER_TEAM, Vec2Fixed::from_ints(0, 0));
//! let b = world.spawn_unit(&fighter, ENEMY_TEAM, Vec2Fixed::from_ints(400, 0));
//!
//! world.issue_command(&[a], fleet_core::commands::Command::Attack(b)).unwrap();
//! world.tick(TICK_DELTA);
//! assert_eq!(world.tick_count(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::{CLEAR_POSITION_ATTEMPTS, CLEAR_POSITION_STEP, MAP_HEIGHT, MAP_WIDTH};
use crate::data::UnitTemplate;
use crate::effects::{EffectKind, EffectRegistry};
use crate::math::{fixed_ratio, Fixed, Vec2Fixed};
use crate::projectile::Projectile;
use crate::rng::SimRng;
use crate::skills::SkillKind;
use crate::terrain::Terrain;
use crate::unit::{opposing_team, TeamId, Unit, UnitId, UnitKind, ENEMY_TEAM, PLAYER_TEAM};

/// Damage dealt to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacking unit, if known.
    pub source: Option<UnitId>,
    /// Attacking side, if known.
    pub source_team: Option<TeamId>,
    /// Unit hit.
    pub target: UnitId,
    /// Side hit.
    pub target_team: TeamId,
    /// Hull and shield points removed.
    #[serde(with = "crate::math::fixed_serde")]
    pub amount: Fixed,
}

/// A unit destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathEvent {
    /// Destroyed unit.
    pub unit: UnitId,
    /// Its side.
    pub team: TeamId,
    /// Its hull kind.
    pub kind: UnitKind,
    /// Side that landed the final blow, if known.
    pub killer_team: Option<TeamId>,
}

/// Everything notable that happened during one tick.
///
/// These events can be used by a presentation layer or a report writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Damage dealt.
    pub damage: Vec<DamageEvent>,
    /// Units destroyed.
    pub deaths: Vec<DeathEvent>,
    /// Skills fired, by caster.
    pub skills_fired: Vec<(UnitId, SkillKind)>,
    /// Projectiles launched.
    pub projectiles_spawned: u32,
    /// Projectiles that reached their aim point.
    pub projectiles_impacted: u32,
    /// Units that finished resupplying.
    pub supply_completed: Vec<UnitId>,
}

/// The battlefield and everything on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Sorted by id; ids only grow, so pushes keep the order.
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    effects: EffectRegistry,
    terrain: Terrain,
    rng: SimRng,
    next_id: UnitId,
    tick: u64,
    #[serde(with = "crate::math::fixed_serde")]
    elapsed: Fixed,
    map_size: (i32, i32),
    mothership_teams: BTreeSet<TeamId>,
    events: TickEvents,
}

impl Default for World {
    fn default() -> Self {
        Self::new(0)
    }
}

impl World {
    /// An empty, open battlefield of the default size.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            units: Vec::new(),
            projectiles: Vec::new(),
            effects: EffectRegistry::default(),
            terrain: Terrain::default(),
            rng: SimRng::new(seed),
            next_id: 1,
            tick: 0,
            elapsed: Fixed::ZERO,
            map_size: (MAP_WIDTH, MAP_HEIGHT),
            mothership_teams: BTreeSet::new(),
            events: TickEvents::default(),
        }
    }

    /// Replace the terrain.
    #[must_use]
    pub fn with_terrain(mut self, terrain: Terrain) -> Self {
        self.terrain = terrain;
        self
    }

    /// Set the battlefield size.
    #[must_use]
    pub fn with_map_size(mut self, width: i32, height: i32) -> Self {
        self.map_size = (width, height);
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Ticks advanced so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since the battle started.
    #[must_use]
    pub const fn elapsed(&self) -> Fixed {
        self.elapsed
    }

    /// Battlefield width and height.
    #[must_use]
    pub const fn map_size(&self) -> (i32, i32) {
        self.map_size
    }

    /// Battlefield centre.
    #[must_use]
    pub fn map_center(&self) -> Vec2Fixed {
        Vec2Fixed::from_ints(self.map_size.0 / 2, self.map_size.1 / 2)
    }

    /// Terrain.
    #[must_use]
    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Terrain, mutable.
    pub fn terrain_mut(&mut self) -> &mut Terrain {
        &mut self.terrain
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Active effects.
    #[must_use]
    pub fn effects(&self) -> &EffectRegistry {
        &self.effects
    }

    /// Events of the current (or last completed) tick.
    #[must_use]
    pub fn events(&self) -> &TickEvents {
        &self.events
    }

    /// Events of the current tick, mutable.
    pub fn events_mut(&mut self) -> &mut TickEvents {
        &mut self.events
    }

    /// The world's random stream.
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// Every unit on the roster, dead ones included until pruned.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Unit ids in roster order.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    fn index_of(&self, id: UnitId) -> Option<usize> {
        self.units.binary_search_by_key(&id, |u| u.id).ok()
    }

    /// Look up a unit, dead or alive.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.index_of(id).map(|i| &self.units[i])
    }

    /// Look up a unit mutably, dead or alive.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.index_of(id).map(|i| &mut self.units[i])
    }

    /// Look up a unit that is still alive. Stale references resolve to `None`.
    #[must_use]
    pub fn live_unit(&self, id: UnitId) -> Option<&Unit> {
        self.unit(id).filter(|u| u.is_alive())
    }

    /// Resolve an optional reference to a live unit.
    #[must_use]
    pub fn resolve(&self, id: Option<UnitId>) -> Option<&Unit> {
        id.and_then(|id| self.live_unit(id))
    }

    // ------------------------------------------------------------------------
    // Roster queries
    // ------------------------------------------------------------------------

    /// Live units.
    pub fn live_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    /// Live units of `team`.
    pub fn team_units(&self, team: TeamId) -> impl Iterator<Item = &Unit> {
        self.live_units().filter(move |u| u.team == team)
    }

    /// Live units not on `team`.
    pub fn enemy_units(&self, team: TeamId) -> impl Iterator<Item = &Unit> {
        self.live_units().filter(move |u| u.team != team)
    }

    /// Live mothership of `team`.
    #[must_use]
    pub fn mothership(&self, team: TeamId) -> Option<&Unit> {
        self.team_units(team).find(|u| u.kind == UnitKind::Mothership)
    }

    /// Live units within `radius` of `center`, optionally filtered by team and kind.
    #[must_use]
    pub fn units_in_range(
        &self,
        center: Vec2Fixed,
        radius: Fixed,
        team: Option<TeamId>,
        kind: Option<UnitKind>,
    ) -> Vec<UnitId> {
        let reach = radius.saturating_mul(radius);
        self.live_units()
            .filter(|u| team.map_or(true, |t| u.team == t))
            .filter(|u| kind.map_or(true, |k| u.kind == k))
            .filter(|u| u.position.distance_squared(center) <= reach)
            .map(|u| u.id)
            .collect()
    }

    /// Live enemies of `team` within `radius` of `center`.
    #[must_use]
    pub fn enemies_within(&self, team: TeamId, center: Vec2Fixed, radius: Fixed) -> Vec<UnitId> {
        let reach = radius.saturating_mul(radius);
        self.enemy_units(team)
            .filter(|u| u.position.distance_squared(center) <= reach)
            .map(|u| u.id)
            .collect()
    }

    /// Live members of `team` within `radius` of `center`.
    #[must_use]
    pub fn allies_within(&self, team: TeamId, center: Vec2Fixed, radius: Fixed) -> Vec<UnitId> {
        self.units_in_range(center, radius, Some(team), None)
    }

    /// Nearest live enemy of `unit`, optionally limited to `max_range`.
    #[must_use]
    pub fn nearest_enemy(&self, unit: UnitId, max_range: Option<Fixed>) -> Option<UnitId> {
        let me = self.unit(unit)?;
        let limit = max_range.map(|r| r.saturating_mul(r));
        self.enemy_units(me.team)
            .map(|e| (e.id, e.position.distance_squared(me.position)))
            .filter(|(_, d)| limit.map_or(true, |l| *d <= l))
            .min_by_key(|(_, d)| *d)
            .map(|(id, _)| id)
    }

    /// Damaged live allies of `unit` (itself excluded), most damaged first.
    #[must_use]
    pub fn damaged_allies(&self, unit: UnitId, max_range: Option<Fixed>) -> Vec<UnitId> {
        let Some(me) = self.unit(unit) else {
            return Vec::new();
        };
        let limit = max_range.map(|r| r.saturating_mul(r));
        let mut damaged: Vec<&Unit> = self
            .team_units(me.team)
            .filter(|u| u.id != unit && u.hp < u.max_hp)
            .filter(|u| limit.map_or(true, |l| u.position.distance_squared(me.position) <= l))
            .collect();
        damaged.sort_by_key(|u| (u.hp_ratio(), u.id));
        damaged.into_iter().map(|u| u.id).collect()
    }

    /// Live units on `team`.
    #[must_use]
    pub fn count_units(&self, team: TeamId) -> usize {
        self.team_units(team).count()
    }

    /// Live units of `kind` on `team`.
    #[must_use]
    pub fn count_kind(&self, team: TeamId, kind: UnitKind) -> usize {
        self.team_units(team).filter(|u| u.kind == kind).count()
    }

    /// Average position of `team`'s live units; the origin when none remain.
    #[must_use]
    pub fn center_of_units(&self, team: TeamId) -> Vec2Fixed {
        center_of(self.team_units(team).map(|u| u.position))
    }

    /// Whether a hull of `radius` may sit at `point`.
    #[must_use]
    pub fn is_position_valid(&self, point: Vec2Fixed, radius: Fixed) -> bool {
        !self.terrain.is_blocked(point, radius)
    }

    /// An unblocked point near `point`, or `point` itself if none is found.
    ///
    /// Tries random bearings at growing distances.
    pub fn find_clear_position_near(&mut self, point: Vec2Fixed, radius: Fixed) -> Vec2Fixed {
        if self.is_position_valid(point, radius) {
            return point;
        }
        for attempt in 0..CLEAR_POSITION_ATTEMPTS {
            let angle = self.rng.angle();
            let distance = CLEAR_POSITION_STEP * Fixed::from_num(attempt + 1);
            let probe = point + Vec2Fixed::from_angle(angle).scale(distance);
            if self.is_position_valid(probe, radius) {
                return probe;
            }
        }
        point
    }

    // ------------------------------------------------------------------------
    // Roster changes
    // ------------------------------------------------------------------------

    /// Build a unit from `template` for `team` near `position`.
    pub fn spawn_unit(&mut self, template: &UnitTemplate, team: TeamId, position: Vec2Fixed) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;

        let position = self.find_clear_position_near(position, template.radius);
        let mut unit = Unit::from_template(id, team, position, template);
        unit.circle_angle = self.rng.angle();
        unit.circle_direction = self.rng.sign();

        if unit.kind == UnitKind::Mothership {
            self.mothership_teams.insert(team);
        }
        tracing::trace!(unit = id, team, kind = %unit.kind, "unit spawned");
        self.units.push(unit);
        id
    }

    /// Take a unit off the roster.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        self.index_of(id).map(|i| self.units.remove(i))
    }

    /// Register a projectile for world-driven advancement.
    pub fn add_projectile(&mut self, projectile: Projectile) {
        self.events.projectiles_spawned += 1;
        self.projectiles.push(projectile);
    }

    /// Register an effect at a point.
    pub fn add_area_effect(&mut self, kind: EffectKind, center: Vec2Fixed, radius: Fixed) {
        self.effects.add_area(kind, center, radius);
    }

    /// Register an effect between two points.
    pub fn add_line_effect(&mut self, kind: EffectKind, from: Vec2Fixed, to: Vec2Fixed) {
        self.effects.add_line(kind, from, to);
    }

    /// Damage `target` on behalf of `source`; returns the points removed.
    pub fn apply_damage(&mut self, source: Option<UnitId>, target: UnitId, amount: Fixed) -> Fixed {
        let source_team = source.and_then(|id| self.unit(id)).map(|u| u.team);
        self.apply_damage_from(source, source_team, target, amount)
    }

    /// Damage `target`, attributing it to an explicit side.
    ///
    /// Used by projectiles whose launcher may already be gone.
    pub fn apply_damage_from(
        &mut self,
        source: Option<UnitId>,
        source_team: Option<TeamId>,
        target: UnitId,
        amount: Fixed,
    ) -> Fixed {
        let Some(unit) = self.unit_mut(target) else {
            return Fixed::ZERO;
        };
        if !unit.is_alive() {
            return Fixed::ZERO;
        }
        let shield_before = unit.shield;
        let hull_lost = unit.take_damage(amount);
        let dealt = hull_lost + (shield_before - unit.shield);
        let (team, kind, died) = (unit.team, unit.kind, !unit.is_alive());

        if dealt > Fixed::ZERO {
            self.events.damage.push(DamageEvent {
                source,
                source_team,
                target,
                target_team: team,
                amount: dealt,
            });
        }
        if died {
            self.events.deaths.push(DeathEvent {
                unit: target,
                team,
                kind,
                killer_team: source_team,
            });
        }
        dealt
    }

    // ------------------------------------------------------------------------
    // Tick phases
    // ------------------------------------------------------------------------

    /// Advance one tick without any AI controller.
    pub fn tick(&mut self, dt: Fixed) {
        self.begin_tick(dt);
        self.update_units(dt);
        self.resolve_collisions();
        self.prune_dead();
        self.update_projectiles(dt);
        self.update_effects(dt);
        self.finish_tick();
    }

    /// Start a tick: clear last tick's events and advance the clock.
    pub fn begin_tick(&mut self, dt: Fixed) {
        self.events = TickEvents::default();
        self.elapsed += dt;
    }

    /// Run every unit's state machine in roster order.
    pub fn update_units(&mut self, dt: Fixed) {
        for id in self.unit_ids() {
            self.update_unit(id, dt);
        }
    }

    /// Push overlapping live hulls apart, half the overlap each.
    pub fn resolve_collisions(&mut self) {
        let count = self.units.len();
        for i in 0..count {
            for j in (i + 1)..count {
                let (left, right) = self.units.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];
                if !a.is_alive() || !b.is_alive() {
                    continue;
                }
                let min_distance = a.radius + b.radius;
                let distance = a.position.distance(b.position);
                if distance >= min_distance || distance == Fixed::ZERO {
                    continue;
                }
                let axis = (b.position - a.position).normalize();
                let push = axis.scale((min_distance - distance) * fixed_ratio(1, 2));
                a.position = a.position - push;
                b.position += push;
            }
        }
    }

    /// Remove units that reached the dead state.
    pub fn prune_dead(&mut self) {
        let before = self.units.len();
        self.units.retain(Unit::is_alive);
        let removed = before - self.units.len();
        if removed > 0 {
            tracing::trace!(tick = self.tick, removed, "pruned dead units");
        }
    }

    /// Move projectiles and resolve the ones that arrive.
    pub fn update_projectiles(&mut self, dt: Fixed) {
        let mut projectiles = std::mem::take(&mut self.projectiles);
        for projectile in &mut projectiles {
            self.advance_projectile(projectile, dt);
        }
        projectiles.retain(|p| p.alive);
        // Launches made during impact resolution land in self.projectiles.
        projectiles.append(&mut self.projectiles);
        self.projectiles = projectiles;
    }

    /// Count effects down.
    pub fn update_effects(&mut self, dt: Fixed) {
        self.effects.update(dt);
    }

    /// Close a tick: drop anything killed late and bump the counter.
    pub fn finish_tick(&mut self) {
        self.prune_dead();
        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "world state hash");
        }
    }

    // ------------------------------------------------------------------------
    // Outcome
    // ------------------------------------------------------------------------

    /// Whether one side is wiped out or has lost the mothership it started with.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
            || (self.count_units(PLAYER_TEAM) == 0 && self.count_units(ENEMY_TEAM) == 0)
    }

    /// The surviving side, if the battle is decided.
    #[must_use]
    pub fn winner(&self) -> Option<TeamId> {
        let player_alive = self.count_units(PLAYER_TEAM) > 0;
        let enemy_alive = self.count_units(ENEMY_TEAM) > 0;
        match (player_alive, enemy_alive) {
            (true, false) => return Some(PLAYER_TEAM),
            (false, true) => return Some(ENEMY_TEAM),
            (false, false) => return None,
            (true, true) => {}
        }
        for team in [PLAYER_TEAM, ENEMY_TEAM] {
            let other = opposing_team(team);
            let lost_own = self.mothership_teams.contains(&other) && self.mothership(other).is_none();
            if lost_own && self.mothership(team).is_some() {
                return Some(team);
            }
        }
        None
    }

    /// Hash of the simulation state, for determinism checks.
    ///
    /// Two worlds with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.elapsed.to_bits().hash(&mut hasher);

        self.units.len().hash(&mut hasher);
        for unit in &self.units {
            unit.id.hash(&mut hasher);
            unit.team.hash(&mut hasher);
            unit.state.hash(&mut hasher);
            unit.position.x.to_bits().hash(&mut hasher);
            unit.position.y.to_bits().hash(&mut hasher);
            unit.hp.to_bits().hash(&mut hasher);
            unit.energy.to_bits().hash(&mut hasher);
            unit.sp.to_bits().hash(&mut hasher);
            unit.shield.to_bits().hash(&mut hasher);
            unit.attack_target.hash(&mut hasher);
            unit.repair_target.hash(&mut hasher);
            unit.follow_target.hash(&mut hasher);
        }

        self.projectiles.len().hash(&mut hasher);
        for projectile in &self.projectiles {
            projectile.position.x.to_bits().hash(&mut hasher);
            projectile.position.y.to_bits().hash(&mut hasher);
            projectile.damage.to_bits().hash(&mut hasher);
            projectile.target.hash(&mut hasher);
        }

        self.terrain.objects().len().hash(&mut hasher);
        hasher.finish()
    }
}

/// Average of a set of points; the origin for an empty set.
#[must_use]
pub fn center_of(points: impl Iterator<Item = Vec2Fixed>) -> Vec2Fixed {
    let (sum, count) = points.fold((Vec2Fixed::ZERO, 0_i32), |(sum, n), p| (sum + p, n + 1));
    if count == 0 {
        return Vec2Fixed::ZERO;
    }
    let n = Fixed::from_num(count);
    Vec2Fixed::new(sum.x / n, sum.y / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TICK_DELTA;
    use crate::terrain::{TerrainKind, TerrainObject};
    use crate::unit::UnitState;

    fn template(kind: UnitKind) -> UnitTemplate {
        UnitTemplate::new(kind, 100, 100).with_attack(10, 150, 1)
    }

    #[test]
    fn test_ids_start_at_one_and_are_never_reused() {
        let mut world = World::new(1);
        let a = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::ZERO);
        let b = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::from_ints(100, 0));
        assert_eq!((a, b), (1, 2));
        world.remove_unit(b);
        let c = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::ZERO);
        assert_eq!(c, 3);
    }

    #[test]
    fn test_queries_skip_dead_units() {
        let mut world = World::new(1);
        let me = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::ZERO);
        let near = world.spawn_unit(&template(UnitKind::Fighter), ENEMY_TEAM, Vec2Fixed::from_ints(100, 0));
        let far = world.spawn_unit(&template(UnitKind::Heavy), ENEMY_TEAM, Vec2Fixed::from_ints(500, 0));

        assert_eq!(world.nearest_enemy(me, None), Some(near));
        assert_eq!(world.nearest_enemy(me, Some(Fixed::from_num(50))), None);

        world.apply_damage(Some(me), near, Fixed::from_num(1000));
        assert!(world.live_unit(near).is_none());
        assert_eq!(world.nearest_enemy(me, None), Some(far));
        assert_eq!(
            world.units_in_range(Vec2Fixed::ZERO, Fixed::from_num(600), Some(ENEMY_TEAM), None),
            vec![far]
        );
        assert_eq!(world.events().deaths.len(), 1);
        assert_eq!(world.events().deaths[0].killer_team, Some(PLAYER_TEAM));
    }

    #[test]
    fn test_damaged_allies_sorted_most_damaged_first() {
        let mut world = World::new(1);
        let me = world.spawn_unit(&template(UnitKind::Repair), PLAYER_TEAM, Vec2Fixed::ZERO);
        let light = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::from_ints(100, 0));
        let heavy = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::from_ints(200, 0));
        world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::from_ints(300, 0));
        world.unit_mut(me).unwrap().hp = Fixed::from_num(10);
        world.unit_mut(light).unwrap().hp = Fixed::from_num(80);
        world.unit_mut(heavy).unwrap().hp = Fixed::from_num(20);

        assert_eq!(world.damaged_allies(me, None), vec![heavy, light]);
        assert_eq!(world.damaged_allies(me, Some(Fixed::from_num(150))), vec![light]);
    }

    #[test]
    fn test_collision_pushes_half_overlap_each() {
        let mut world = World::new(1);
        let a = world.spawn_unit(&template(UnitKind::Heavy), PLAYER_TEAM, Vec2Fixed::ZERO);
        let b = world.spawn_unit(&template(UnitKind::Heavy), PLAYER_TEAM, Vec2Fixed::from_ints(30, 0));
        world.resolve_collisions();
        assert_eq!(world.unit(a).unwrap().position, Vec2Fixed::from_ints(-5, 0));
        assert_eq!(world.unit(b).unwrap().position, Vec2Fixed::from_ints(35, 0));
    }

    #[test]
    fn test_dead_units_pruned_within_one_tick() {
        let mut world = World::new(1);
        let a = world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::ZERO);
        world.apply_damage(None, a, Fixed::from_num(500));
        assert_eq!(world.unit(a).unwrap().state, UnitState::Dead);
        world.tick(TICK_DELTA);
        assert!(world.unit(a).is_none());
    }

    #[test]
    fn test_clear_position_avoids_terrain() {
        let rock = TerrainObject::new(Vec2Fixed::ZERO, TerrainKind::Asteroid, Fixed::from_num(40));
        let mut world = World::new(3).with_terrain(Terrain::new(vec![rock]));
        let point = world.find_clear_position_near(Vec2Fixed::ZERO, Fixed::from_num(10));
        assert!(world.is_position_valid(point, Fixed::from_num(10)) || point == Vec2Fixed::ZERO);
        let open = Vec2Fixed::from_ints(500, 500);
        assert_eq!(world.find_clear_position_near(open, Fixed::from_num(10)), open);
    }

    #[test]
    fn test_winner_by_mothership_loss() {
        let mut world = World::new(1);
        let mother = UnitTemplate::new(UnitKind::Mothership, 1000, 40);
        world.spawn_unit(&mother, PLAYER_TEAM, Vec2Fixed::ZERO);
        let enemy_mother = world.spawn_unit(&mother, ENEMY_TEAM, Vec2Fixed::from_ints(1000, 0));
        world.spawn_unit(&template(UnitKind::Fighter), ENEMY_TEAM, Vec2Fixed::from_ints(1000, 200));
        assert!(!world.is_game_over());

        world.apply_damage(None, enemy_mother, Fixed::from_num(5000));
        world.prune_dead();
        assert_eq!(world.winner(), Some(PLAYER_TEAM));
        assert!(world.is_game_over());
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut a = World::new(9);
        let mut b = World::new(9);
        for world in [&mut a, &mut b] {
            world.spawn_unit(&template(UnitKind::Fighter), PLAYER_TEAM, Vec2Fixed::ZERO);
        }
        assert_eq!(a.state_hash(), b.state_hash());
        a.tick(TICK_DELTA);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_center_of_units() {
        let mut world = World::new(1);
        assert_eq!(world.center_of_units(PLAYER_TEAM), Vec2Fixed::ZERO);
        world.spawn_unit(&template(UnitKind::Heavy), PLAYER_TEAM, Vec2Fixed::from_ints(0, 0));
        world.spawn_unit(&template(UnitKind::Heavy), PLAYER_TEAM, Vec2Fixed::from_ints(200, 100));
        assert_eq!(world.center_of_units(PLAYER_TEAM), Vec2Fixed::from_ints(100, 50));
    }
}
