//! Ultimate abilities and their effects.
//!
//! Every non-mothership unit may carry one [`SkillSpec`]. Firing requires a
//! full skill-point bar and resets it; see [`World::use_skill`].

use serde::{Deserialize, Serialize};

use crate::config::TELEPORT_MIN_DISTANCE;
use crate::effects::EffectKind;
use crate::error::GameError;
use crate::math::{fixed_int, fixed_ratio, option_decimal_serde, Fixed, Vec2Fixed};
use crate::unit::{BuffKind, UnitId};
use crate::world::World;

/// Ultimate ability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    /// Damage every enemy around the caster.
    DamageAoe,
    /// Heal every ally around the caster.
    HealAoe,
    /// Speed up allies around the caster.
    BuffSpeed,
    /// Raise attack damage of allies around the caster.
    BuffAttack,
    /// Shield allies around the caster.
    Shield,
    /// Jump the caster to a random nearby clear point.
    Teleport,
    /// Disable every enemy around the caster.
    Disable,
    /// Heal every ally on the map.
    RepairAll,
}

impl SkillKind {
    /// All skill kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::DamageAoe,
        Self::HealAoe,
        Self::BuffSpeed,
        Self::BuffAttack,
        Self::Shield,
        Self::Teleport,
        Self::Disable,
        Self::RepairAll,
    ];

    /// Name used in data files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DamageAoe => "damage_aoe",
            Self::HealAoe => "heal_aoe",
            Self::BuffSpeed => "buff_speed",
            Self::BuffAttack => "buff_attack",
            Self::Shield => "shield",
            Self::Teleport => "teleport",
            Self::Disable => "disable",
            Self::RepairAll => "repair_all",
        }
    }
}

impl std::str::FromStr for SkillKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GameError::UnknownSkillKind(s.to_string()))
    }
}

/// A skill and its tuning. Unset parameters fall back to per-kind defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSpec {
    /// What the skill does.
    pub kind: SkillKind,
    /// Area of effect.
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub radius: Option<Fixed>,
    /// Damage for [`SkillKind::DamageAoe`].
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub damage: Option<Fixed>,
    /// Hull restored by heals.
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub heal: Option<Fixed>,
    /// Speed multiplier for [`SkillKind::BuffSpeed`].
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<Fixed>,
    /// Damage multiplier for [`SkillKind::BuffAttack`].
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub attack_multiplier: Option<Fixed>,
    /// Seconds a buff, shield or disable lasts.
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Fixed>,
    /// Shield points granted by [`SkillKind::Shield`].
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub shield_amount: Option<Fixed>,
}

impl SkillSpec {
    /// A skill of `kind` with default tuning.
    #[must_use]
    pub fn new(kind: SkillKind) -> Self {
        Self {
            kind,
            radius: None,
            damage: None,
            heal: None,
            speed_multiplier: None,
            attack_multiplier: None,
            duration: None,
            shield_amount: None,
        }
    }

    /// Override the radius.
    #[must_use]
    pub fn with_radius(mut self, radius: Fixed) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Effective radius.
    #[must_use]
    pub fn radius(&self) -> Fixed {
        self.radius.unwrap_or(match self.kind {
            SkillKind::Teleport => fixed_int(300),
            _ => fixed_int(200),
        })
    }

    /// Effective damage.
    #[must_use]
    pub fn damage(&self) -> Fixed {
        self.damage.unwrap_or(fixed_int(100))
    }

    /// Effective heal amount.
    #[must_use]
    pub fn heal(&self) -> Fixed {
        self.heal.unwrap_or(match self.kind {
            SkillKind::RepairAll => fixed_int(30),
            _ => fixed_int(50),
        })
    }

    /// Effective multiplier for buff skills.
    #[must_use]
    pub fn multiplier(&self) -> Fixed {
        let explicit = match self.kind {
            SkillKind::BuffSpeed => self.speed_multiplier,
            SkillKind::BuffAttack => self.attack_multiplier,
            _ => None,
        };
        explicit.unwrap_or(fixed_ratio(3, 2))
    }

    /// Effective duration.
    #[must_use]
    pub fn duration(&self) -> Fixed {
        self.duration.unwrap_or(match self.kind {
            SkillKind::Shield => fixed_int(15),
            SkillKind::Disable => fixed_int(5),
            _ => fixed_int(10),
        })
    }

    /// Effective shield amount.
    #[must_use]
    pub fn shield_amount(&self) -> Fixed {
        self.shield_amount.unwrap_or(fixed_int(50))
    }
}

impl World {
    /// Fire `unit`'s skill if fully charged; returns whether it fired.
    ///
    /// This is the only way a skill fires. Controllers that gate on a partial
    /// bar still end up here, so the full-bar requirement always holds.
    pub fn use_skill(&mut self, unit: UnitId) -> bool {
        let Some(caster) = self.live_unit(unit) else {
            return false;
        };
        if !caster.skill_ready() {
            return false;
        }
        let Some(spec) = caster.skill.clone() else {
            return false;
        };

        execute_skill(self, unit, &spec);
        if let Some(caster) = self.unit_mut(unit) {
            caster.sp = Fixed::ZERO;
        }
        self.events_mut().skills_fired.push((unit, spec.kind));
        tracing::debug!(unit, skill = ?spec.kind, "skill fired");
        true
    }
}

/// Apply a skill's effect around `caster`, regardless of charge.
pub fn execute_skill(world: &mut World, caster: UnitId, spec: &SkillSpec) {
    let Some(origin) = world.live_unit(caster) else {
        return;
    };
    let team = origin.team;
    let center = origin.position;
    let unit_radius = origin.radius;
    let radius = spec.radius();

    match spec.kind {
        SkillKind::DamageAoe => {
            let damage = spec.damage();
            for target in world.enemies_within(team, center, radius) {
                world.apply_damage(Some(caster), target, damage);
            }
            world.add_area_effect(EffectKind::Explosion, center, radius);
        }
        SkillKind::HealAoe => {
            let heal = spec.heal();
            for ally in world.allies_within(team, center, radius) {
                if let Some(unit) = world.unit_mut(ally) {
                    unit.heal(heal);
                }
            }
            world.add_area_effect(EffectKind::Heal, center, radius);
        }
        SkillKind::BuffSpeed | SkillKind::BuffAttack => {
            let kind = if spec.kind == SkillKind::BuffSpeed {
                BuffKind::Speed
            } else {
                BuffKind::Attack
            };
            let (multiplier, duration) = (spec.multiplier(), spec.duration());
            for ally in world.allies_within(team, center, radius) {
                if let Some(unit) = world.unit_mut(ally) {
                    unit.apply_buff(kind, multiplier, duration);
                }
            }
            world.add_area_effect(EffectKind::Buff, center, radius);
        }
        SkillKind::Shield => {
            let (amount, duration) = (spec.shield_amount(), spec.duration());
            for ally in world.allies_within(team, center, radius) {
                if let Some(unit) = world.unit_mut(ally) {
                    unit.apply_shield(amount, duration);
                }
            }
            world.add_area_effect(EffectKind::Shield, center, radius);
        }
        SkillKind::Teleport => {
            let angle = world.rng_mut().angle();
            let distance = world.rng_mut().range(TELEPORT_MIN_DISTANCE.min(radius), radius);
            let aim = center + Vec2Fixed::from_angle(angle).scale(distance);
            let destination = world.find_clear_position_near(aim, unit_radius);
            if let Some(unit) = world.unit_mut(caster) {
                unit.position = destination;
            }
            world.add_line_effect(EffectKind::Teleport, center, destination);
        }
        SkillKind::Disable => {
            let duration = spec.duration();
            for target in world.enemies_within(team, center, radius) {
                if let Some(unit) = world.unit_mut(target) {
                    unit.apply_disable(duration);
                }
            }
            world.add_area_effect(EffectKind::Disable, center, radius);
        }
        SkillKind::RepairAll => {
            let heal = spec.heal();
            let allies: Vec<UnitId> = world.team_units(team).map(|u| u.id).collect();
            for ally in allies {
                if let Some(unit) = world.unit_mut(ally) {
                    unit.heal(heal);
                }
            }
            world.add_area_effect(EffectKind::GlobalHeal, center, Fixed::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitTemplate;
    use crate::unit::{UnitKind, UnitState, ENEMY_TEAM, PLAYER_TEAM};

    fn skilled(kind: SkillKind) -> UnitTemplate {
        UnitTemplate::new(UnitKind::Fighter, 100, 100)
            .with_attack(10, 150, 1)
            .with_skill(SkillSpec::new(kind))
    }

    fn charged(world: &mut World, id: UnitId) {
        let unit = world.unit_mut(id).unwrap();
        unit.sp = unit.max_sp;
    }

    #[test]
    fn test_skill_defaults() {
        let teleport = SkillSpec::new(SkillKind::Teleport);
        assert_eq!(teleport.radius(), Fixed::from_num(300));
        assert_eq!(SkillSpec::new(SkillKind::RepairAll).heal(), Fixed::from_num(30));
        assert_eq!(SkillSpec::new(SkillKind::HealAoe).heal(), Fixed::from_num(50));
        assert_eq!(SkillSpec::new(SkillKind::Shield).duration(), Fixed::from_num(15));
        assert_eq!(SkillSpec::new(SkillKind::Disable).duration(), Fixed::from_num(5));
        assert_eq!(SkillSpec::new(SkillKind::BuffSpeed).multiplier(), Fixed::from_num(1.5));
    }

    #[test]
    fn test_skill_kind_names_match_data_files() {
        for kind in SkillKind::ALL {
            assert_eq!(kind.as_str().parse::<SkillKind>().unwrap(), kind);
            let ron_name = ron::to_string(&kind).unwrap();
            assert_eq!(ron_name, kind.as_str());
        }
        assert!(matches!("nuke".parse::<SkillKind>(), Err(GameError::UnknownSkillKind(_))));
    }

    #[test]
    fn test_skill_requires_full_bar_and_resets() {
        let mut world = World::new(1);
        let caster = world.spawn_unit(&skilled(SkillKind::DamageAoe), ENEMY_TEAM, Vec2Fixed::ZERO);
        let victim = world.spawn_unit(
            &UnitTemplate::new(UnitKind::Heavy, 300, 40),
            PLAYER_TEAM,
            Vec2Fixed::from_ints(100, 0),
        );

        world.unit_mut(caster).unwrap().sp = Fixed::from_num(99);
        assert!(!world.use_skill(caster));

        charged(&mut world, caster);
        assert!(world.use_skill(caster));
        assert_eq!(world.unit(caster).unwrap().sp, Fixed::ZERO);
        assert_eq!(world.unit(victim).unwrap().hp, Fixed::from_num(200));
        assert_eq!(world.events().skills_fired, vec![(caster, SkillKind::DamageAoe)]);
    }

    #[test]
    fn test_partial_bar_never_fires() {
        let mut world = World::new(1);
        let caster = world.spawn_unit(&skilled(SkillKind::Shield), ENEMY_TEAM, Vec2Fixed::ZERO);
        for sp in [1, 10, 50, 99] {
            world.unit_mut(caster).unwrap().sp = Fixed::from_num(sp);
            assert!(!world.use_skill(caster));
        }
        assert_eq!(world.unit(caster).unwrap().shield, Fixed::ZERO);
        assert!(world.events().skills_fired.is_empty());
    }

    #[test]
    fn test_disable_hits_only_enemies_in_radius() {
        let mut world = World::new(1);
        let caster = world.spawn_unit(&skilled(SkillKind::Disable), ENEMY_TEAM, Vec2Fixed::ZERO);
        let ally = world.spawn_unit(&skilled(SkillKind::Shield), ENEMY_TEAM, Vec2Fixed::from_ints(50, 0));
        let near = world.spawn_unit(&skilled(SkillKind::Shield), PLAYER_TEAM, Vec2Fixed::from_ints(150, 0));
        let far = world.spawn_unit(&skilled(SkillKind::Shield), PLAYER_TEAM, Vec2Fixed::from_ints(500, 0));
        charged(&mut world, caster);

        assert!(world.use_skill(caster));
        assert_eq!(world.unit(near).unwrap().state, UnitState::Disabled);
        assert_eq!(world.unit(far).unwrap().state, UnitState::Idle);
        assert_eq!(world.unit(ally).unwrap().state, UnitState::Idle);
    }

    #[test]
    fn test_buff_attack_applies_to_allies() {
        let mut world = World::new(1);
        let caster = world.spawn_unit(&skilled(SkillKind::BuffAttack), ENEMY_TEAM, Vec2Fixed::ZERO);
        let ally = world.spawn_unit(&skilled(SkillKind::Shield), ENEMY_TEAM, Vec2Fixed::from_ints(100, 0));
        charged(&mut world, caster);
        world.use_skill(caster);
        assert_eq!(world.unit(ally).unwrap().attack_damage, Fixed::from_num(15));
        assert_eq!(world.unit(caster).unwrap().attack_damage, Fixed::from_num(15));
    }

    #[test]
    fn test_repair_all_reaches_whole_team() {
        let mut world = World::new(1);
        let caster = world.spawn_unit(&skilled(SkillKind::RepairAll), ENEMY_TEAM, Vec2Fixed::ZERO);
        let far_ally = world.spawn_unit(&skilled(SkillKind::Shield), ENEMY_TEAM, Vec2Fixed::from_ints(2000, 0));
        world.unit_mut(far_ally).unwrap().hp = Fixed::from_num(40);
        charged(&mut world, caster);
        world.use_skill(caster);
        assert_eq!(world.unit(far_ally).unwrap().hp, Fixed::from_num(70));
    }

    #[test]
    fn test_teleport_moves_caster_within_radius() {
        let mut world = World::new(5);
        let start = Vec2Fixed::from_ints(1200, 1200);
        let caster = world.spawn_unit(&skilled(SkillKind::Teleport), ENEMY_TEAM, start);
        charged(&mut world, caster);
        world.use_skill(caster);
        let moved = world.unit(caster).unwrap().position.distance(start);
        assert!(moved > Fixed::ZERO);
        assert!(moved <= Fixed::from_num(400));
    }
}
