//! Attack, repair and projectile resolution.
//!
//! This module implements the damage pipeline:
//! - Cooldown and energy gating (motherships fire for free)
//! - Dispatch by attack type: instant melee/beam, spread ranged volleys,
//!   splash artillery shells, homing missiles
//! - Impact resolution, including distance-scaled splash that hits every
//!   live unit in the blast, friend or foe

use crate::config::{
    ARTILLERY_SPEED, ENERGY_ATTACK_COST, ENERGY_REPAIR_COST, MISSILE_SPEED, SPREAD_ANGLE_STEP,
    SPREAD_OFFSET, SP_GAIN_PER_ATTACK, TERRAIN_DAMAGE_RADIUS,
};
use crate::effects::EffectKind;
use crate::math::{fixed_ratio, Fixed, Vec2Fixed};
use crate::projectile::{Projectile, ProjectileKind};
use crate::unit::{AttackType, UnitId, UnitKind};
use crate::world::World;

/// Damage scale at distance `distance` from a blast of `radius`:
/// 1.0 at the centre falling linearly to 0.5 at the edge.
#[must_use]
pub fn splash_falloff(distance: Fixed, radius: Fixed) -> Fixed {
    if radius <= Fixed::ZERO {
        return Fixed::ONE;
    }
    let edge = (distance / radius).min(Fixed::ONE);
    Fixed::ONE - edge * fixed_ratio(1, 2)
}

/// Per-projectile damage for a volley of `count`, rounded down.
#[must_use]
pub fn volley_damage(total: Fixed, count: u32) -> Fixed {
    (total / Fixed::from_num(count.max(1))).floor()
}

impl World {
    /// Attack `target` if the cooldown has elapsed and energy allows.
    ///
    /// Returns whether an attack was made.
    pub fn perform_attack(&mut self, attacker: UnitId, target: UnitId) -> bool {
        let Some(unit) = self.live_unit(attacker) else {
            return false;
        };
        let Some(victim) = self.live_unit(target) else {
            return false;
        };
        if unit.cooldown_remaining > Fixed::ZERO {
            return false;
        }
        let is_mothership = unit.kind == UnitKind::Mothership;
        let cost = if is_mothership { Fixed::ZERO } else { ENERGY_ATTACK_COST };
        if unit.energy < cost {
            return false;
        }

        let from = unit.position;
        let to = victim.position;
        let team = unit.team;
        let damage = unit.attack_damage;

        match unit.attack_type {
            AttackType::Melee | AttackType::Beam => {
                let effect = if unit.attack_type == AttackType::Melee {
                    EffectKind::Melee
                } else {
                    EffectKind::Beam
                };
                self.apply_damage(Some(attacker), target, damage);
                self.add_line_effect(effect, from, to);
            }
            AttackType::Ranged => {
                let count = unit.projectile_count.max(1);
                let speed = unit.projectile_speed;
                let per_shot = volley_damage(damage, count);
                let middle = (count / 2) as i32;
                for i in 0..count {
                    let aim = if count > 1 {
                        let offset = Fixed::from_num(i as i32 - middle) * SPREAD_ANGLE_STEP;
                        to + Vec2Fixed::from_angle(offset).scale(SPREAD_OFFSET)
                    } else {
                        to
                    };
                    self.add_projectile(Projectile::new(
                        ProjectileKind::Straight,
                        Some(attacker),
                        team,
                        from,
                        aim,
                        Some(target),
                        per_shot,
                        speed,
                    ));
                    self.add_line_effect(EffectKind::ProjectileTrail, from, aim);
                }
            }
            AttackType::Artillery => {
                let splash_radius = unit.splash_radius;
                self.add_projectile(Projectile::new(
                    ProjectileKind::Ballistic { splash_radius },
                    Some(attacker),
                    team,
                    from,
                    to,
                    None,
                    damage,
                    ARTILLERY_SPEED,
                ));
            }
            AttackType::Missile => {
                self.add_projectile(Projectile::new(
                    ProjectileKind::Homing,
                    Some(attacker),
                    team,
                    from,
                    to,
                    Some(target),
                    damage,
                    MISSILE_SPEED,
                ));
                self.add_area_effect(EffectKind::Missile, from, Fixed::ZERO);
            }
        }

        if let Some(unit) = self.unit_mut(attacker) {
            unit.spend_energy(cost);
            if !is_mothership {
                unit.gain_sp(SP_GAIN_PER_ATTACK);
            }
            unit.cooldown_remaining = unit.attack_cooldown;
            unit.target = Some(target);
        }
        true
    }

    /// Heal `patient` for one tick of repair work if energy allows.
    pub fn perform_repair(&mut self, repairer: UnitId, patient: UnitId, dt: Fixed) -> bool {
        let Some(unit) = self.live_unit(repairer) else {
            return false;
        };
        if unit.energy < ENERGY_REPAIR_COST {
            return false;
        }
        let amount = unit.repair_rate * dt;
        match self.unit_mut(patient) {
            Some(target) if target.is_alive() => {
                target.heal(amount);
            }
            _ => return false,
        }
        if let Some(unit) = self.unit_mut(repairer) {
            unit.spend_energy(ENERGY_REPAIR_COST * dt);
            unit.target = Some(patient);
        }
        true
    }

    /// Move one projectile and resolve its impact.
    pub(crate) fn advance_projectile(&mut self, projectile: &mut Projectile, dt: Fixed) {
        if projectile.kind == ProjectileKind::Homing {
            if let Some(target) = self.resolve(projectile.target) {
                projectile.aim = target.position;
            }
        }
        if !projectile.advance(dt) {
            return;
        }

        projectile.alive = false;
        self.events_mut().projectiles_impacted += 1;
        let source_team = Some(projectile.team);

        match projectile.kind {
            ProjectileKind::Straight | ProjectileKind::Homing => {
                if let Some(target) = self.resolve(projectile.target).map(|t| t.id) {
                    self.apply_damage_from(projectile.source, source_team, target, projectile.damage);
                }
            }
            ProjectileKind::Ballistic { splash_radius } => {
                let center = projectile.position;
                for id in self.units_in_range(center, splash_radius, None, None) {
                    let Some(distance) = self.unit(id).map(|u| u.position.distance(center)) else {
                        continue;
                    };
                    let damage = (projectile.damage * splash_falloff(distance, splash_radius)).floor();
                    self.apply_damage_from(projectile.source, source_team, id, damage);
                }
                let destroyed = self
                    .terrain_mut()
                    .damage_at(center, projectile.damage, TERRAIN_DAMAGE_RADIUS);
                if !destroyed.is_empty() {
                    tracing::trace!(count = destroyed.len(), "terrain destroyed by shell");
                }
                self.add_area_effect(EffectKind::ArtilleryBlast, center, splash_radius);
            }
        }
    }
}
