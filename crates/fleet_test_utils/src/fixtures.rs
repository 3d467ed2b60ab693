//! Test fixtures and helpers.
//!
//! Stock unit templates and a small builder for hand-placed battles,
//! so scenario tests read as positions and kinds rather than stat blocks.

use fixed::types::I32F32;
use fleet_core::data::UnitTemplate;
use fleet_core::math::Vec2Fixed;
use fleet_core::skills::{SkillKind, SkillSpec};
use fleet_core::terrain::Terrain;
use fleet_core::unit::{AttackType, TeamId, UnitId, UnitKind};
use fleet_core::world::World;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a world position from integer coordinates.
#[must_use]
pub fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Strafing fighter: range 150, speed 100.
#[must_use]
pub fn fighter() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Fighter, 100, 100)
        .with_attack(10, 150, 1)
        .with_skill(SkillSpec::new(SkillKind::BuffSpeed))
}

/// Slow gunship with a heavy hull.
#[must_use]
pub fn heavy() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Heavy, 300, 50)
        .with_attack(20, 200, 2)
        .with_skill(SkillSpec::new(SkillKind::Shield))
}

/// Artillery bomber with splash.
#[must_use]
pub fn bomber() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Bomber, 150, 70)
        .with_attack(30, 250, 3)
        .with_attack_type(AttackType::Artillery)
        .with_splash_radius(60)
}

/// Support craft that heals allies.
#[must_use]
pub fn repair_ship() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Repair, 120, 80)
        .with_repair(100, 10)
        .with_skill(SkillSpec::new(SkillKind::HealAoe))
}

/// Fast, fragile scout.
#[must_use]
pub fn scout() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Scout, 60, 160).with_attack(5, 120, 1)
}

/// Anti-fighter interceptor with a missile salvo.
#[must_use]
pub fn interceptor() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Interceptor, 90, 140)
        .with_attack(8, 160, 1)
        .with_attack_type(AttackType::Missile)
        .with_projectile_count(2)
}

/// Capital ship with a long-range battery.
#[must_use]
pub fn mothership() -> UnitTemplate {
    UnitTemplate::new(UnitKind::Mothership, 2000, 20)
        .with_attack(25, 300, 2)
        .with_max_energy(500)
}

/// The stock template for `kind`.
#[must_use]
pub fn template_for(kind: UnitKind) -> UnitTemplate {
    match kind {
        UnitKind::Mothership => mothership(),
        UnitKind::Fighter => fighter(),
        UnitKind::Repair => repair_ship(),
        UnitKind::Heavy => heavy(),
        UnitKind::Scout => scout(),
        UnitKind::Bomber => bomber(),
        UnitKind::Interceptor => interceptor(),
    }
}

/// Hand-placed world setup.
///
/// ```
/// use fleet_core::unit::{UnitKind, ENEMY_TEAM, PLAYER_TEAM};
/// use fleet_test_utils::fixtures::{vec2, WorldBuilder};
///
/// let (world, ids) = WorldBuilder::new(7)
///     .unit(UnitKind::Mothership, PLAYER_TEAM, vec2(0, 0))
///     .unit(UnitKind::Fighter, ENEMY_TEAM, vec2(400, 0))
///     .build_with_ids();
/// assert_eq!(ids.len(), 2);
/// assert_eq!(world.count_units(ENEMY_TEAM), 1);
/// ```
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    seed: u64,
    terrain: Option<Terrain>,
    spawns: Vec<(UnitTemplate, TeamId, Vec2Fixed)>,
}

impl WorldBuilder {
    /// Empty builder for a world seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            terrain: None,
            spawns: Vec::new(),
        }
    }

    /// Place a stock unit of `kind`.
    #[must_use]
    pub fn unit(self, kind: UnitKind, team: TeamId, position: Vec2Fixed) -> Self {
        self.template(template_for(kind), team, position)
    }

    /// Place a unit from a custom template.
    #[must_use]
    pub fn template(mut self, template: UnitTemplate, team: TeamId, position: Vec2Fixed) -> Self {
        self.spawns.push((template, team, position));
        self
    }

    /// Use `terrain` instead of an open field.
    #[must_use]
    pub fn terrain(mut self, terrain: Terrain) -> Self {
        self.terrain = Some(terrain);
        self
    }

    /// Build the world, returning spawned ids in placement order.
    #[must_use]
    pub fn build_with_ids(self) -> (World, Vec<UnitId>) {
        let mut world = World::new(self.seed);
        if let Some(terrain) = self.terrain {
            world = world.with_terrain(terrain);
        }
        let ids = self
            .spawns
            .iter()
            .map(|(template, team, position)| world.spawn_unit(template, *team, *position))
            .collect();
        (world, ids)
    }

    /// Build the world.
    #[must_use]
    pub fn build(self) -> World {
        self.build_with_ids().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::unit::{ENEMY_TEAM, PLAYER_TEAM};

    #[test]
    fn test_stock_templates_validate() {
        for kind in UnitKind::ALL {
            let template = template_for(kind);
            assert_eq!(template.kind, kind);
            template.validate(kind.as_str()).unwrap();
        }
    }

    #[test]
    fn test_builder_spawns_in_order() {
        let (world, ids) = WorldBuilder::new(1)
            .unit(UnitKind::Fighter, PLAYER_TEAM, vec2(10, 0))
            .unit(UnitKind::Heavy, ENEMY_TEAM, vec2(500, 0))
            .build_with_ids();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(world.unit(ids[1]).unwrap().kind, UnitKind::Heavy);
        assert_eq!(world.unit(ids[0]).unwrap().position, vec2(10, 0));
    }
}
