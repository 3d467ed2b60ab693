//! Unit templates for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::{decimal_serde, fixed_int, Fixed};
use crate::skills::SkillSpec;
use crate::unit::{AttackType, UnitKind};

/// Static stats a unit is built from.
///
/// Only `kind`, `max_hp` and `speed` are required; every other field has a
/// sensible default so a catalog entry can stay short.
///
/// # Example RON
///
/// ```ron
/// UnitTemplate(
///     kind: fighter,
///     name: "Viper",
///     max_hp: 100,
///     speed: 120,
///     attack_damage: 12,
///     attack_range: 150,
///     attack_cooldown: 0.8,
///     projectile_count: 2,
///     skill: Some(SkillSpec(kind: buff_speed)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Hull classification.
    pub kind: UnitKind,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Flavour text.
    #[serde(default)]
    pub description: String,

    /// Hull capacity.
    #[serde(with = "decimal_serde")]
    pub max_hp: Fixed,

    /// Energy capacity.
    #[serde(default = "default_max_energy", with = "decimal_serde")]
    pub max_energy: Fixed,

    /// Movement speed per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,

    /// Damage per attack.
    #[serde(default, with = "decimal_serde")]
    pub attack_damage: Fixed,

    /// Firing range.
    #[serde(default, with = "decimal_serde")]
    pub attack_range: Fixed,

    /// Seconds between attacks.
    #[serde(default = "default_attack_cooldown", with = "decimal_serde")]
    pub attack_cooldown: Fixed,

    /// Collision radius.
    #[serde(default = "default_radius", with = "decimal_serde")]
    pub radius: Fixed,

    /// Damage delivery.
    #[serde(default)]
    pub attack_type: AttackType,

    /// Projectiles per ranged volley.
    #[serde(default = "default_projectile_count")]
    pub projectile_count: u32,

    /// Artillery splash radius.
    #[serde(default, with = "decimal_serde")]
    pub splash_radius: Fixed,

    /// Ranged projectile speed.
    #[serde(default = "default_projectile_speed", with = "decimal_serde")]
    pub projectile_speed: Fixed,

    /// Ultimate ability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<SkillSpec>,

    /// Repair reach.
    #[serde(default = "default_repair_range", with = "decimal_serde")]
    pub repair_range: Fixed,

    /// Hull restored per second while repairing.
    #[serde(default = "default_repair_rate", with = "decimal_serde")]
    pub repair_rate: Fixed,
}

const fn default_max_energy() -> Fixed {
    fixed_int(100)
}

const fn default_attack_cooldown() -> Fixed {
    fixed_int(1)
}

const fn default_radius() -> Fixed {
    fixed_int(20)
}

const fn default_projectile_count() -> u32 {
    1
}

const fn default_projectile_speed() -> Fixed {
    fixed_int(400)
}

const fn default_repair_range() -> Fixed {
    fixed_int(100)
}

const fn default_repair_rate() -> Fixed {
    fixed_int(10)
}

impl UnitTemplate {
    /// A template with the required stats and defaults for everything else.
    #[must_use]
    pub fn new(kind: UnitKind, max_hp: i32, speed: i32) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
            description: String::new(),
            max_hp: Fixed::from_num(max_hp),
            max_energy: default_max_energy(),
            speed: Fixed::from_num(speed),
            attack_damage: Fixed::ZERO,
            attack_range: Fixed::ZERO,
            attack_cooldown: default_attack_cooldown(),
            radius: default_radius(),
            attack_type: AttackType::default(),
            projectile_count: default_projectile_count(),
            splash_radius: Fixed::ZERO,
            projectile_speed: default_projectile_speed(),
            skill: None,
            repair_range: default_repair_range(),
            repair_rate: default_repair_rate(),
        }
    }

    /// Set damage, range and whole-second cooldown.
    #[must_use]
    pub fn with_attack(mut self, damage: i32, range: i32, cooldown_secs: i32) -> Self {
        self.attack_damage = Fixed::from_num(damage);
        self.attack_range = Fixed::from_num(range);
        self.attack_cooldown = Fixed::from_num(cooldown_secs);
        self
    }

    /// Set a fractional cooldown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Fixed) -> Self {
        self.attack_cooldown = cooldown;
        self
    }

    /// Set the attack type.
    #[must_use]
    pub fn with_attack_type(mut self, attack_type: AttackType) -> Self {
        self.attack_type = attack_type;
        self
    }

    /// Set projectiles per volley.
    #[must_use]
    pub fn with_projectile_count(mut self, count: u32) -> Self {
        self.projectile_count = count;
        self
    }

    /// Set the artillery splash radius.
    #[must_use]
    pub fn with_splash_radius(mut self, radius: i32) -> Self {
        self.splash_radius = Fixed::from_num(radius);
        self
    }

    /// Set the ranged projectile speed.
    #[must_use]
    pub fn with_projectile_speed(mut self, speed: i32) -> Self {
        self.projectile_speed = Fixed::from_num(speed);
        self
    }

    /// Set energy capacity.
    #[must_use]
    pub fn with_max_energy(mut self, energy: i32) -> Self {
        self.max_energy = Fixed::from_num(energy);
        self
    }

    /// Set the ultimate ability.
    #[must_use]
    pub fn with_skill(mut self, skill: SkillSpec) -> Self {
        self.skill = Some(skill);
        self
    }

    /// Set repair reach and rate.
    #[must_use]
    pub fn with_repair(mut self, range: i32, rate: i32) -> Self {
        self.repair_range = Fixed::from_num(range);
        self.repair_rate = Fixed::from_num(rate);
        self
    }

    /// Check every stat is usable. `id` names the template in errors.
    pub fn validate(&self, id: &str) -> Result<()> {
        let invalid = |stat: &str, message: &str| GameError::InvalidTemplate {
            template: id.to_string(),
            stat: stat.to_string(),
            message: message.to_string(),
        };

        if self.max_hp <= Fixed::ZERO {
            return Err(invalid("max_hp", "must be positive"));
        }
        if self.radius <= Fixed::ZERO {
            return Err(invalid("radius", "must be positive"));
        }
        if self.attack_cooldown <= Fixed::ZERO {
            return Err(invalid("attack_cooldown", "must be positive"));
        }
        if self.projectile_count == 0 {
            return Err(invalid("projectile_count", "must be at least 1"));
        }
        let non_negative = [
            ("max_energy", self.max_energy),
            ("speed", self.speed),
            ("attack_damage", self.attack_damage),
            ("attack_range", self.attack_range),
            ("splash_radius", self.splash_radius),
            ("projectile_speed", self.projectile_speed),
            ("repair_range", self.repair_range),
            ("repair_rate", self.repair_rate),
        ];
        for (stat, value) in non_negative {
            if value < Fixed::ZERO {
                return Err(invalid(stat, "must not be negative"));
            }
        }
        if self.attack_type == AttackType::Ranged
            && self.attack_damage > Fixed::ZERO
            && self.projectile_speed <= Fixed::ZERO
        {
            return Err(invalid("projectile_speed", "ranged attackers need a positive speed"));
        }
        Ok(())
    }
}
