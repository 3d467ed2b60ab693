//! Unit model: identity, vitals, combat stats, orders and buffs.
//!
//! A [`Unit`] carries every field for every kind; capabilities a kind does
//! not have are disabled through zero values (a mothership has `max_sp == 0`
//! and no skill, a repair unit has `attack_damage == 0`). Behaviour that needs
//! the rest of the battlefield lives on [`World`](crate::world::World); this
//! module only holds the bookkeeping a unit can do on its own.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_SP;
use crate::data::UnitTemplate;
use crate::error::GameError;
use crate::math::{Fixed, Vec2Fixed};
use crate::skills::SkillSpec;

/// Unique identifier for units. Assigned at spawn, never reused.
pub type UnitId = u64;

/// Side a unit fights for.
pub type TeamId = u8;

/// The human-commanded side.
pub const PLAYER_TEAM: TeamId = 0;

/// The side driven by the level's AI controller.
pub const ENEMY_TEAM: TeamId = 1;

/// The opposing team in a two-sided battle.
#[must_use]
pub const fn opposing_team(team: TeamId) -> TeamId {
    if team == PLAYER_TEAM {
        ENEMY_TEAM
    } else {
        PLAYER_TEAM
    }
}

// ============================================================================
// Kinds
// ============================================================================

/// Hull classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Capital ship: supply hub, no skill, primary objective.
    Mothership,
    /// Fast strike craft that circle-strafes.
    Fighter,
    /// Support craft that restores allied hull.
    Repair,
    /// Slow, durable gunship.
    Heavy,
    /// Fast, fragile reconnaissance craft that circle-strafes.
    Scout,
    /// Heavy-payload attacker.
    Bomber,
    /// Fast anti-fighter craft that circle-strafes.
    Interceptor,
}

impl UnitKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Mothership,
        Self::Fighter,
        Self::Repair,
        Self::Heavy,
        Self::Scout,
        Self::Bomber,
        Self::Interceptor,
    ];

    /// Name used in data files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mothership => "mothership",
            Self::Fighter => "fighter",
            Self::Repair => "repair",
            Self::Heavy => "heavy",
            Self::Scout => "scout",
            Self::Bomber => "bomber",
            Self::Interceptor => "interceptor",
        }
    }

    /// Whether this kind orbits its target instead of holding position.
    #[must_use]
    pub const fn is_strafer(self) -> bool {
        matches!(self, Self::Fighter | Self::Scout | Self::Interceptor)
    }

    /// Whether idle player units of this kind engage nearby enemies on their own.
    #[must_use]
    pub const fn auto_engages(self) -> bool {
        matches!(
            self,
            Self::Fighter | Self::Scout | Self::Heavy | Self::Bomber | Self::Interceptor
        )
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GameError::UnknownUnitKind(s.to_string()))
    }
}

/// How a unit delivers its damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Instant hit at contact range.
    Melee,
    /// Straight-line projectiles, optionally several per volley.
    #[default]
    Ranged,
    /// Slow shell that splashes on arrival.
    Artillery,
    /// Instant hit at any range.
    Beam,
    /// Homing projectile.
    Missile,
}

impl AttackType {
    /// All attack types, in declaration order.
    pub const ALL: [Self; 5] = [Self::Melee, Self::Ranged, Self::Artillery, Self::Beam, Self::Missile];

    /// Name used in data files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Artillery => "artillery",
            Self::Beam => "beam",
            Self::Missile => "missile",
        }
    }

    /// Whether damage lands the moment the attack resolves.
    #[must_use]
    pub const fn is_instant(self) -> bool {
        matches!(self, Self::Melee | Self::Beam)
    }
}

impl FromStr for AttackType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GameError::UnknownAttackType(s.to_string()))
    }
}

/// Behavioural state. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// No order.
    #[default]
    Idle,
    /// Travelling to `target_pos`.
    Moving,
    /// Closing on and firing at `attack_target`.
    Attacking,
    /// Healing `repair_target`.
    Repairing,
    /// Heading back to the team mothership.
    Returning,
    /// Receiving energy and hull from the mothership.
    Supplying,
    /// Tracking `follow_target`.
    Following,
    /// Locked out by a disable debuff.
    Disabled,
    /// Orbiting and firing at `attack_target`.
    CircleStrafing,
    /// Destroyed.
    Dead,
}

// ============================================================================
// Buffs
// ============================================================================

/// Timed modifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    /// Multiplies speed.
    Speed,
    /// Multiplies attack damage.
    Attack,
    /// Locks the unit in [`UnitState::Disabled`].
    Disable,
}

/// A timed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    /// Multiplier applied to the base stat.
    #[serde(with = "crate::math::fixed_serde")]
    pub multiplier: Fixed,
    /// Seconds left.
    #[serde(with = "crate::math::fixed_serde")]
    pub remaining: Fixed,
}

// ============================================================================
// Unit
// ============================================================================

/// A ship on the battlefield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Owning side.
    pub team: TeamId,
    /// Hull classification.
    pub kind: UnitKind,
    /// Display name from the template.
    pub name: String,

    /// World position.
    pub position: Vec2Fixed,
    /// Displacement applied on the last movement step.
    pub velocity: Vec2Fixed,
    /// Collision radius.
    #[serde(with = "crate::math::fixed_serde")]
    pub radius: Fixed,

    /// Current hull points.
    #[serde(with = "crate::math::fixed_serde")]
    pub hp: Fixed,
    /// Hull capacity.
    #[serde(with = "crate::math::fixed_serde")]
    pub max_hp: Fixed,
    /// Current energy.
    #[serde(with = "crate::math::fixed_serde")]
    pub energy: Fixed,
    /// Energy capacity.
    #[serde(with = "crate::math::fixed_serde")]
    pub max_energy: Fixed,
    /// Remaining shield points.
    #[serde(with = "crate::math::fixed_serde")]
    pub shield: Fixed,
    /// Seconds until the shield collapses.
    #[serde(with = "crate::math::fixed_serde")]
    pub shield_time: Fixed,
    /// Skill points.
    #[serde(with = "crate::math::fixed_serde")]
    pub sp: Fixed,
    /// Skill point capacity; zero for motherships.
    #[serde(with = "crate::math::fixed_serde")]
    pub max_sp: Fixed,

    /// Unmodified speed.
    #[serde(with = "crate::math::fixed_serde")]
    pub base_speed: Fixed,
    /// Buff-adjusted speed, per second.
    #[serde(with = "crate::math::fixed_serde")]
    pub speed: Fixed,
    /// Unmodified damage per attack.
    #[serde(with = "crate::math::fixed_serde")]
    pub base_attack_damage: Fixed,
    /// Buff-adjusted damage per attack.
    #[serde(with = "crate::math::fixed_serde")]
    pub attack_damage: Fixed,
    /// Firing range.
    #[serde(with = "crate::math::fixed_serde")]
    pub attack_range: Fixed,
    /// Seconds between attacks.
    #[serde(with = "crate::math::fixed_serde")]
    pub attack_cooldown: Fixed,
    /// Seconds until the next attack is allowed.
    #[serde(with = "crate::math::fixed_serde")]
    pub cooldown_remaining: Fixed,
    /// Damage delivery.
    pub attack_type: AttackType,
    /// Projectiles per ranged volley.
    pub projectile_count: u32,
    /// Artillery splash radius.
    #[serde(with = "crate::math::fixed_serde")]
    pub splash_radius: Fixed,
    /// Ranged projectile speed.
    #[serde(with = "crate::math::fixed_serde")]
    pub projectile_speed: Fixed,
    /// Repair reach.
    #[serde(with = "crate::math::fixed_serde")]
    pub repair_range: Fixed,
    /// Hull restored per second while repairing.
    #[serde(with = "crate::math::fixed_serde")]
    pub repair_rate: Fixed,
    /// Ultimate ability, if any.
    pub skill: Option<SkillSpec>,

    /// Behavioural state.
    pub state: UnitState,
    /// Last unit this one acted on.
    pub target: Option<UnitId>,
    /// Unit being attacked.
    pub attack_target: Option<UnitId>,
    /// Unit being repaired.
    pub repair_target: Option<UnitId>,
    /// Unit being followed.
    pub follow_target: Option<UnitId>,
    /// Unit currently supplied by this mothership.
    pub supply_target: Option<UnitId>,
    /// Destination for movement-only orders, or an intercept point while attacking.
    pub target_pos: Option<Vec2Fixed>,

    /// Active timed modifiers.
    pub buffs: BTreeMap<BuffKind, Buff>,

    /// Orbit phase for circle-strafing.
    #[serde(with = "crate::math::fixed_serde")]
    pub circle_angle: Fixed,
    /// Orbit direction, `1` or `-1`.
    #[serde(with = "crate::math::fixed_serde")]
    pub circle_direction: Fixed,
}

impl Unit {
    /// Build a unit at full hull and energy from a template.
    #[must_use]
    pub fn from_template(id: UnitId, team: TeamId, position: Vec2Fixed, template: &UnitTemplate) -> Self {
        let is_mothership = template.kind == UnitKind::Mothership;
        Self {
            id,
            team,
            kind: template.kind,
            name: template.name.clone(),
            position,
            velocity: Vec2Fixed::ZERO,
            radius: template.radius,
            hp: template.max_hp,
            max_hp: template.max_hp,
            energy: template.max_energy,
            max_energy: template.max_energy,
            shield: Fixed::ZERO,
            shield_time: Fixed::ZERO,
            sp: Fixed::ZERO,
            max_sp: if is_mothership { Fixed::ZERO } else { DEFAULT_MAX_SP },
            base_speed: template.speed,
            speed: template.speed,
            base_attack_damage: template.attack_damage,
            attack_damage: template.attack_damage,
            attack_range: template.attack_range,
            attack_cooldown: template.attack_cooldown,
            cooldown_remaining: Fixed::ZERO,
            attack_type: template.attack_type,
            projectile_count: template.projectile_count.max(1),
            splash_radius: template.splash_radius,
            projectile_speed: template.projectile_speed,
            repair_range: template.repair_range,
            repair_rate: template.repair_rate,
            skill: if is_mothership { None } else { template.skill.clone() },
            state: UnitState::Idle,
            target: None,
            attack_target: None,
            repair_target: None,
            follow_target: None,
            supply_target: None,
            target_pos: None,
            buffs: BTreeMap::new(),
            circle_angle: Fixed::ZERO,
            circle_direction: Fixed::ONE,
        }
    }

    /// Whether the unit still counts as present on the battlefield.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state != UnitState::Dead
    }

    /// Hull fraction in `[0, 1]`; a zero-capacity hull reads as full.
    #[must_use]
    pub fn hp_ratio(&self) -> Fixed {
        if self.max_hp <= Fixed::ZERO {
            return Fixed::ONE;
        }
        self.hp / self.max_hp
    }

    /// Energy fraction in `[0, 1]`; a zero-capacity battery reads as full.
    #[must_use]
    pub fn energy_ratio(&self) -> Fixed {
        if self.max_energy <= Fixed::ZERO {
            return Fixed::ONE;
        }
        self.energy / self.max_energy
    }

    /// Whether this unit can be ordered to attack.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.base_attack_damage > Fixed::ZERO && self.kind != UnitKind::Repair
    }

    /// Whether this unit can be ordered to repair.
    #[must_use]
    pub fn can_repair(&self) -> bool {
        matches!(self.kind, UnitKind::Repair | UnitKind::Mothership)
    }

    /// Whether the ultimate is charged to at least `min_sp`.
    #[must_use]
    pub fn skill_charged(&self, min_sp: Fixed) -> bool {
        self.kind != UnitKind::Mothership
            && self.skill.is_some()
            && self.max_sp > Fixed::ZERO
            && self.sp >= min_sp
    }

    /// Whether the ultimate is fully charged.
    #[must_use]
    pub fn skill_ready(&self) -> bool {
        self.skill_charged(self.max_sp)
    }

    /// Change state unless the unit is dead.
    pub fn set_state(&mut self, state: UnitState) {
        if self.is_alive() {
            self.state = state;
        }
    }

    /// Drop every order reference.
    pub fn clear_orders(&mut self) {
        self.target = None;
        self.attack_target = None;
        self.repair_target = None;
        self.follow_target = None;
        self.target_pos = None;
    }

    /// Apply incoming damage: shield absorbs first, overflow hits the hull.
    ///
    /// Returns the hull points actually lost. Dead units take no damage.
    pub fn take_damage(&mut self, amount: Fixed) -> Fixed {
        if !self.is_alive() || amount <= Fixed::ZERO {
            return Fixed::ZERO;
        }

        let mut remaining = amount;
        if self.shield > Fixed::ZERO {
            let absorbed = remaining.min(self.shield);
            self.shield -= absorbed;
            remaining -= absorbed;
        }

        let before = self.hp;
        self.hp = (self.hp - remaining).max(Fixed::ZERO);
        if self.hp <= Fixed::ZERO {
            self.state = UnitState::Dead;
            tracing::debug!(unit = self.id, team = self.team, kind = %self.kind, "unit destroyed");
        }
        before - self.hp
    }

    /// Restore hull, capped at capacity. Returns the amount restored.
    pub fn heal(&mut self, amount: Fixed) -> Fixed {
        if !self.is_alive() || amount <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Restore energy, capped at capacity.
    pub fn restore_energy(&mut self, amount: Fixed) {
        self.energy = (self.energy + amount).clamp(Fixed::ZERO, self.max_energy);
    }

    /// Spend energy, floored at zero.
    pub fn spend_energy(&mut self, amount: Fixed) {
        self.energy = (self.energy - amount).clamp(Fixed::ZERO, self.max_energy);
    }

    /// Gain skill points, capped at capacity.
    pub fn gain_sp(&mut self, amount: Fixed) {
        self.sp = (self.sp + amount).clamp(Fixed::ZERO, self.max_sp);
    }

    /// Install or replace a timed multiplier and refresh derived stats.
    pub fn apply_buff(&mut self, kind: BuffKind, multiplier: Fixed, duration: Fixed) {
        if !self.is_alive() {
            return;
        }
        self.buffs.insert(
            kind,
            Buff {
                multiplier,
                remaining: duration,
            },
        );
        self.recompute_stats();
    }

    /// Lock the unit out for `duration` seconds.
    pub fn apply_disable(&mut self, duration: Fixed) {
        if !self.is_alive() {
            return;
        }
        self.state = UnitState::Disabled;
        self.velocity = Vec2Fixed::ZERO;
        self.buffs.insert(
            BuffKind::Disable,
            Buff {
                multiplier: Fixed::ONE,
                remaining: duration,
            },
        );
    }

    /// Replace the shield.
    pub fn apply_shield(&mut self, amount: Fixed, duration: Fixed) {
        if !self.is_alive() {
            return;
        }
        self.shield = amount.max(Fixed::ZERO);
        self.shield_time = duration;
    }

    /// Count buffs and the shield down by `dt`, then refresh derived stats.
    ///
    /// An expired disable returns the unit to [`UnitState::Idle`].
    pub fn tick_timers(&mut self, dt: Fixed) {
        let mut expired = Vec::new();
        for (kind, buff) in &mut self.buffs {
            buff.remaining -= dt;
            if buff.remaining <= Fixed::ZERO {
                expired.push(*kind);
            }
        }
        for kind in expired {
            self.buffs.remove(&kind);
            if kind == BuffKind::Disable && self.state == UnitState::Disabled {
                self.state = UnitState::Idle;
            }
        }

        self.recompute_stats();

        if self.shield_time > Fixed::ZERO {
            self.shield_time -= dt;
            if self.shield_time <= Fixed::ZERO {
                self.shield_time = Fixed::ZERO;
                self.shield = Fixed::ZERO;
            }
        }

        self.cooldown_remaining = (self.cooldown_remaining - dt).max(Fixed::ZERO);
    }

    /// Re-derive speed and attack damage from base values and active buffs.
    pub fn recompute_stats(&mut self) {
        self.speed = self.base_speed;
        self.attack_damage = self.base_attack_damage;
        for (kind, buff) in &self.buffs {
            match kind {
                BuffKind::Speed => self.speed *= buff.multiplier,
                BuffKind::Attack => {
                    self.attack_damage = (self.attack_damage * buff.multiplier).floor();
                }
                BuffKind::Disable => {}
            }
        }
    }
}
